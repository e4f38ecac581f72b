use glb_viewer::frame::FrameLimiter;

#[test]
fn should_render_every_callback_without_throttling() {
    let mut limiter = FrameLimiter::new(60, false);
    for now in [0.0, 1.0, 2.0, 3.0] {
        assert!(limiter.should_render(now));
    }
}

#[test]
fn should_compute_interval_from_target_fps() {
    assert!((FrameLimiter::new(30, true).interval_ms() - 33.333).abs() < 1e-2);
    assert!((FrameLimiter::new(60, false).interval_ms() - 16.666).abs() < 1e-2);
}

#[test]
fn should_skip_callbacks_within_one_interval() {
    let mut limiter = FrameLimiter::new(30, true);

    assert!(limiter.should_render(100.0));
    assert!(!limiter.should_render(116.0));
    assert!(!limiter.should_render(133.0));
    assert!(limiter.should_render(134.0));
    // the interval is measured from the last rendered frame, not the last callback
    assert!(!limiter.should_render(150.0));
    assert!(limiter.should_render(168.0));
}

#[test]
fn should_always_render_the_first_callback() {
    let mut limiter = FrameLimiter::new(30, true);
    assert!(limiter.should_render(10.0));
    assert!(!limiter.should_render(40.0));
    assert!(limiter.should_render(44.0));
}
