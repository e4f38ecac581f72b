use cgmath::{InnerSpace, Point3, Vector4};
use glb_viewer::{
    pipelines::light::{DebugView, KEY_LIGHT_POSITION, LightSetup},
    platform::{Platform, RenderProfile},
    viewer::Action,
};
use winit::keyboard::{Key, NamedKey, SmolStr};

#[test]
fn desktop_lights_have_a_shadowing_key_light_only() {
    let lights = LightSetup::for_profile(&RenderProfile::for_platform(Platform::Desktop));

    assert_eq!(lights.ambient_intensity, 0.3);
    assert_eq!(lights.key.intensity, 0.8);
    assert_eq!(lights.key.position, Point3::from(KEY_LIGHT_POSITION));
    assert!(lights.fill.is_none());
    assert!(lights.shadows.is_some());
}

#[test]
fn mobile_lights_add_a_fill_light_and_drop_shadows() {
    let lights = LightSetup::for_profile(&RenderProfile::for_platform(Platform::Mobile));

    assert_eq!(lights.ambient_intensity, 0.8);
    assert_eq!(lights.key.intensity, 1.2);
    let fill = lights.fill.unwrap();
    assert_eq!(fill.intensity, 0.5);
    assert!(fill.direction().x < 0.0 && fill.direction().z < 0.0);
    assert!(lights.shadows.is_none());
}

#[test]
fn ambient_colour_is_linear_grey() {
    let lights = LightSetup::for_profile(&RenderProfile::for_platform(Platform::Desktop));
    let [r, g, b] = lights.ambient_colour;
    assert_eq!(r, g);
    assert_eq!(g, b);
    // 0x40 decoded from sRGB
    assert!((r - 0.0513).abs() < 1e-3, "{r}");
}

#[test]
fn key_light_points_from_the_origin_to_the_light() {
    let lights = LightSetup::for_profile(&RenderProfile::for_platform(Platform::Desktop));
    let direction = lights.key.direction();

    assert!((direction.magnitude() - 1.0).abs() < 1e-6);
    assert!(direction.y > direction.x && direction.x > 0.0);
}

#[test]
fn shadow_camera_sees_the_model_around_the_origin() {
    let lights = LightSetup::for_profile(&RenderProfile::for_platform(Platform::Desktop));
    let view_proj = lights.shadow_view_proj();

    for point in [
        Vector4::new(0.0, 0.0, 0.0, 1.0),
        Vector4::new(1.0, 1.0, 1.0, 1.0),
        Vector4::new(-1.0, -0.5, 1.0, 1.0),
    ] {
        let clip = view_proj * point;
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1.0 && ndc.y.abs() < 1.0, "{ndc:?}");
        assert!(ndc.z > 0.0 && ndc.z < 1.0, "{ndc:?}");
    }
}

#[test]
fn debug_views_cycle_back_to_shaded() {
    let mut view = DebugView::default();
    assert_eq!(view, DebugView::Shaded);

    let mut seen = Vec::new();
    for _ in 0..4 {
        view = view.next();
        seen.push(view);
    }
    assert_eq!(
        seen,
        vec![DebugView::BaseColour, DebugView::Normals, DebugView::MetallicRoughness, DebugView::Shaded]
    );
}

#[test]
fn keys_map_to_viewer_actions() {
    let char_key = |c: &str| Key::Character(SmolStr::new(c));

    assert_eq!(Action::from_key(&Key::Named(NamedKey::Home)), Some(Action::Home));
    assert_eq!(Action::from_key(&char_key("h")), Some(Action::Home));
    assert_eq!(Action::from_key(&char_key("M")), Some(Action::CycleDebugView));
    assert_eq!(Action::from_key(&char_key("+")), Some(Action::ExposureUp));
    assert_eq!(Action::from_key(&char_key("=")), Some(Action::ExposureUp));
    assert_eq!(Action::from_key(&char_key("-")), Some(Action::ExposureDown));
    assert_eq!(Action::from_key(&char_key("x")), None);
    assert_eq!(Action::from_key(&Key::Named(NamedKey::Escape)), None);
}
