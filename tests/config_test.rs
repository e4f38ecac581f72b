use glb_viewer::{
    ViewerConfig,
    cache::{CacheBuster, strip_query},
    config::{clear_colour, hex_rgb, srgb_to_linear},
    platform::Platform,
};

#[test]
fn should_append_version_to_asset_paths() {
    let buster = CacheBuster::new(1_700_000_000);
    assert_eq!(buster.versioned("models/helmet.glb"), "models/helmet.glb?v=1700000000");
    assert_eq!(buster.versioned("env/studio.hdr?raw=1"), "env/studio.hdr?raw=1&v=1700000000");
}

#[test]
fn should_version_by_wall_clock_seconds() {
    let buster = CacheBuster::now();
    // any time after 2020
    assert!(buster.version() > 1_577_836_800);
}

#[test]
fn should_strip_query_from_paths() {
    assert_eq!(strip_query("models/helmet.glb?v=42"), "models/helmet.glb");
    assert_eq!(strip_query("models/helmet.glb"), "models/helmet.glb");
}

#[test]
fn should_join_asset_paths_onto_the_root() {
    let mut config = ViewerConfig::default();
    assert_eq!(config.asset(&config.model_path), "assets/models/DamagedHelmet.glb");

    config.asset_root = "https://cdn.example.com/viewer/".to_string();
    assert_eq!(config.asset("/env/studio.hdr"), "https://cdn.example.com/viewer/env/studio.hdr");

    config.asset_root = String::new();
    assert_eq!(config.asset("env/studio.hdr"), "env/studio.hdr");
}

#[test]
fn should_override_platform_from_query() {
    assert_eq!(ViewerConfig::default().with_query("?mobile").platform, Some(Platform::Mobile));
    assert_eq!(
        ViewerConfig::default().with_query("?foo=1&desktop=true").platform,
        Some(Platform::Desktop)
    );
    assert_eq!(ViewerConfig::default().with_query("").platform, None);
    assert_eq!(ViewerConfig::default().with_query("?mobility").platform, None);
}

#[test]
fn forced_platform_skips_detection() {
    let config = ViewerConfig {
        platform: Some(Platform::Mobile),
        ..Default::default()
    };
    assert_eq!(config.platform(), Platform::Mobile);
}

#[test]
fn should_split_hex_colours() {
    assert_eq!(hex_rgb(0xff8000), [1.0, 128.0 / 255.0, 0.0]);
    assert_eq!(hex_rgb(0x000000), [0.0; 3]);
}

#[test]
fn should_linearise_clear_colour_for_srgb_surfaces() {
    let plain = clear_colour(0x808080, false);
    assert!((plain.r - 128.0 / 255.0).abs() < 1e-6);
    assert_eq!(plain.a, 1.0);

    let linear = clear_colour(0x808080, true);
    assert!((linear.g - 0.2158).abs() < 1e-3, "{linear:?}");
}

#[test]
fn srgb_decode_has_a_linear_toe() {
    assert_eq!(srgb_to_linear(0.0), 0.0);
    assert!((srgb_to_linear(0.04) - 0.04 / 12.92).abs() < 1e-12);
    assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-12);
}
