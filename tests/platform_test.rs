use glb_viewer::platform::{Platform, RenderProfile, ShadowSettings};

const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15";
const ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 Chrome/120.0 Mobile";
const OPERA_MINI: &str = "Opera/9.80 (J2ME/MIDP; Opera Mini/9.80 (S60; SymbOS; Opera Mobi/23.348; U; en)";
const DESKTOP_CHROME: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0";
const MAC_SAFARI: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/605.1.15 Safari/605.1.15";

#[test]
fn should_detect_mobile_user_agents() {
    for agent in [IPHONE, ANDROID, OPERA_MINI, "BlackBerry9700", "IEMobile/10.0", "webOS/2.2"] {
        assert_eq!(Platform::from_user_agent(agent), Platform::Mobile, "{agent}");
    }
}

#[test]
fn should_treat_everything_else_as_desktop() {
    for agent in [DESKTOP_CHROME, MAC_SAFARI, ""] {
        assert_eq!(Platform::from_user_agent(agent), Platform::Desktop, "{agent}");
    }
}

#[test]
fn should_match_user_agents_case_insensitively() {
    assert!(Platform::from_user_agent("SOMETHING IPAD SOMETHING").is_mobile());
}

#[test]
fn desktop_profile_has_shadows_msaa_and_auto_rotation() {
    let profile = RenderProfile::for_platform(Platform::Desktop);

    assert_eq!(profile.msaa_samples, 4);
    assert_eq!(profile.shadows, Some(ShadowSettings::default()));
    assert!(profile.casts_shadows());
    assert_eq!(profile.max_pixel_ratio, None);
    assert_eq!(profile.damping_factor, 0.02);
    assert_eq!(profile.ambient_intensity, 0.3);
    assert_eq!(profile.key_light_intensity, 0.8);
    assert_eq!(profile.fill_light_intensity, None);
    assert_eq!(profile.target_fps, 60);
    assert!(!profile.throttle);
    assert!(profile.auto_rotate);
    assert_eq!(profile.material_tuning, None);
}

#[test]
fn mobile_profile_is_lighter_and_brighter() {
    let profile: RenderProfile = Platform::Mobile.into();

    assert_eq!(profile.msaa_samples, 1);
    assert!(!profile.casts_shadows());
    assert_eq!(profile.max_pixel_ratio, Some(2.0));
    assert_eq!(profile.damping_factor, 0.1);
    assert_eq!(profile.ambient_intensity, 0.8);
    assert_eq!(profile.key_light_intensity, 1.2);
    assert_eq!(profile.fill_light_intensity, Some(0.5));
    assert_eq!(profile.target_fps, 30);
    assert!(profile.throttle);
    assert!(!profile.auto_rotate);

    let tuning = profile.material_tuning.unwrap();
    assert_eq!(tuning.env_intensity, 0.3);
    assert_eq!(tuning.max_metalness, 0.8);
    assert_eq!(tuning.min_roughness, 0.2);
}

#[test]
fn shadow_camera_matches_the_key_light_setup() {
    let shadows = ShadowSettings::default();
    assert_eq!(shadows.map_size, 1024);
    assert_eq!(shadows.extent, 5.0);
    assert_eq!(shadows.near, 0.5);
    assert_eq!(shadows.far, 50.0);
}

#[test]
fn should_cap_pixel_ratio_on_mobile() {
    let profile = RenderProfile::for_platform(Platform::Mobile);

    // 390x844 CSS pixels at a device pixel ratio of 3
    assert_eq!(profile.surface_size((1170, 2532), 3.0), (780, 1688));
    // ratios below the cap are left alone
    assert_eq!(profile.surface_size((800, 600), 1.5), (800, 600));
}

#[test]
fn should_not_cap_pixel_ratio_on_desktop() {
    let profile = RenderProfile::for_platform(Platform::Desktop);
    assert_eq!(profile.surface_size((3840, 2160), 3.0), (3840, 2160));
}
