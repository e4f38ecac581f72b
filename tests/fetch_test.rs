use futures::executor::block_on;
use glb_viewer::resources::fetch::{Progress, load_binary, load_binary_with_progress, resolve_relative};

fn temp_asset(name: &str, len: usize) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("glb-viewer-{}-{name}", std::process::id()));
    let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, data).unwrap();
    path
}

#[test]
fn should_report_progress_up_to_the_full_size() {
    let len = 600 * 1024;
    let path = temp_asset("progress.bin", len);

    let mut reports = Vec::new();
    let data = block_on(load_binary_with_progress(path.to_str().unwrap(), |p| reports.push(p))).unwrap();

    assert_eq!(data.len(), len);
    assert!(reports.len() >= 2, "{reports:?}");
    assert!(reports.windows(2).all(|w| w[0].loaded < w[1].loaded));
    let last = reports.last().unwrap();
    assert_eq!(last.loaded, len as u64);
    assert_eq!(last.percent(), Some(100.0));

    std::fs::remove_file(path).unwrap();
}

#[test]
fn should_ignore_cache_busting_query_on_native() {
    let path = temp_asset("query.bin", 16);
    let versioned = format!("{}?v=1700000000", path.display());

    let data = block_on(load_binary(&versioned)).unwrap();
    assert_eq!(data.len(), 16);

    std::fs::remove_file(path).unwrap();
}

#[test]
fn should_fail_for_missing_files() {
    let err = block_on(load_binary("definitely/not/here.glb")).unwrap_err();
    assert!(err.to_string().contains("cannot open"), "{err}");
}

#[test]
fn progress_percent_handles_unknown_and_empty_sizes() {
    assert_eq!(Progress { loaded: 5, total: None }.percent(), None);
    assert_eq!(Progress { loaded: 0, total: Some(0) }.percent(), Some(100.0));
    assert_eq!(Progress { loaded: 25, total: Some(100) }.percent(), Some(25.0));
}

#[test]
fn should_resolve_uris_next_to_the_gltf_file() {
    assert_eq!(resolve_relative("assets/models/scene.gltf?v=3", "scene.bin"), "assets/models/scene.bin");
    assert_eq!(resolve_relative("scene.gltf", "textures/a.png"), "textures/a.png");
}
