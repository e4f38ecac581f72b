#![cfg(feature = "integration-tests")]

use futures::executor::block_on;
use glb_viewer::{
    ViewerConfig,
    context::Context,
    platform::{Platform, RenderProfile},
    render::{Scene, render_offscreen},
    resources::{environment::load_environment, fallback_cube, load_model_gltf},
    viewer::AppState,
};

mod common;

const SIZE: u32 = 64;

fn headless_state(platform: Platform) -> AppState {
    let config = ViewerConfig::default();
    let profile = RenderProfile::for_platform(platform);
    AppState::new(block_on(Context::headless(SIZE, SIZE, &config, profile)).unwrap())
}

fn load_model(state: &AppState, file_name: &str) -> anyhow::Result<glb_viewer::data_structures::model::Model> {
    let ctx = state.context();
    block_on(load_model_gltf(file_name, &ctx.device, &ctx.queue, &ctx.layouts.material, |_| ()))
}

fn assert_green(pixel: &image::Rgba<u8>) {
    let [r, g, b, _] = pixel.0;
    assert!(g > 60, "{pixel:?}");
    assert!(g > r.saturating_add(40) && g > b.saturating_add(40), "{pixel:?}");
}

fn assert_grey(pixel: &image::Rgba<u8>) {
    for c in &pixel.0[..3] {
        assert!((*c as i32 - 128).abs() <= 2, "{pixel:?}");
    }
    assert_eq!(pixel.0[3], 255);
}

#[test]
fn fallback_cube_renders_green_on_grey() {
    let config = ViewerConfig::default();
    let profile = RenderProfile::for_platform(Platform::Mobile);
    let ctx = block_on(Context::headless(SIZE, SIZE, &config, profile)).unwrap();

    let model = fallback_cube(&ctx.device, &ctx.queue, &ctx.layouts.material);
    let scene = Scene::new(&ctx.device, model);
    let img = block_on(render_offscreen(&ctx, Some(&scene))).unwrap();

    assert_eq!(img.dimensions(), (SIZE, SIZE));
    assert_green(img.get_pixel(SIZE / 2, SIZE / 2));

    for (x, y) in [(0, 0), (SIZE - 1, 0), (0, SIZE - 1), (SIZE - 1, SIZE - 1)] {
        assert_grey(img.get_pixel(x, y));
    }
}

#[test]
fn empty_scene_clears_to_the_background() {
    let config = ViewerConfig::default();
    let profile = RenderProfile::for_platform(Platform::Desktop);
    let ctx = block_on(Context::headless(SIZE, SIZE, &config, profile)).unwrap();

    let img = block_on(render_offscreen(&ctx, None)).unwrap();

    img.pixels().for_each(assert_grey);
}

#[test]
fn missing_model_shows_the_fallback_cube() {
    let mut state = headless_state(Platform::Mobile);

    let result = load_model(&state, "missing.glb?v=1");
    assert!(result.is_err());
    state.on_model_result(result);

    let scene = state.scene().expect("the fallback cube is shown");
    assert!(!scene.model.casts_shadow);
    let img = block_on(render_offscreen(state.context(), state.scene())).unwrap();
    assert_green(img.get_pixel(SIZE / 2, SIZE / 2));
    assert_grey(img.get_pixel(0, 0));
}

#[test]
fn fallback_cube_casts_on_desktop_and_is_left_untuned() {
    let mut state = headless_state(Platform::Desktop);
    state.on_model_result(Err(anyhow::anyhow!("404 Not Found")));

    let model = &state.scene().unwrap().model;
    assert!(model.casts_shadow);
    let params = model.materials[0].params;
    assert!(params.lambert);
    assert!(!params.receive_shadows);
    assert_eq!(params.env_intensity, 0.0);

    let mut state = headless_state(Platform::Mobile);
    state.on_model_result(Err(anyhow::anyhow!("404 Not Found")));
    let params = state.scene().unwrap().model.materials[0].params;
    assert_eq!(params.env_intensity, 0.0);
}

#[test]
fn loaded_model_is_tuned_for_mobile() {
    let path = std::env::temp_dir().join(format!("glb_viewer_tuned_{}.glb", std::process::id()));
    std::fs::write(&path, common::triangle_glb()).unwrap();
    let mut state = headless_state(Platform::Mobile);

    let result = load_model(&state, path.to_str().unwrap());
    std::fs::remove_file(&path).unwrap();
    state.on_model_result(result);

    let model = &state.scene().unwrap().model;
    assert!(!model.casts_shadow);
    let params = model.materials[0].params;
    assert_eq!(params.env_intensity, 0.3);
    assert_eq!(params.roughness, 0.75);
    assert!(!params.receive_shadows);
}

#[test]
fn missing_environment_leaves_reflections_off() {
    let mut state = headless_state(Platform::Desktop);
    let ctx = state.context();

    let result = block_on(load_environment("missing.hdr?v=1", &ctx.device, &ctx.queue, |_| ()));
    assert!(result.is_err());
    state.on_environment_result(result);

    assert!(!state.context().light.shading.environment);
    let img = block_on(render_offscreen(state.context(), None)).unwrap();
    img.pixels().for_each(assert_grey);
}
