//! Viewer configuration.
//!
//! [`ViewerConfig`] bundles the asset locations, camera defaults and render
//! settings. The defaults reproduce the stock viewer (damaged helmet in a
//! small studio); the native binary overrides them from the command line and
//! the web build from the page URL.

use cgmath::Point3;

use crate::platform::Platform;

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    /// Directory (native) or URL prefix (web) all asset paths are relative to.
    pub asset_root: String,
    pub model_path: String,
    pub environment_path: String,
    pub camera_home: Point3<f32>,
    pub camera_target: Point3<f32>,
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Background colour as `0xRRGGBB`.
    pub background: u32,
    pub exposure: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub max_polar_angle: f32,
    /// Radians added to the model's Y rotation every rendered frame.
    pub auto_rotate_speed: f32,
    /// Overrides the detected platform.
    pub platform: Option<Platform>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset_root: "assets".to_string(),
            model_path: "models/DamagedHelmet.glb".to_string(),
            environment_path: "env/studio_small_09_1k.hdr".to_string(),
            camera_home: Point3::new(0.0, 1.5, 3.0),
            camera_target: Point3::new(0.0, 0.0, 0.0),
            fovy_degrees: 70.0,
            znear: 0.1,
            zfar: 100.0,
            background: 0x808080,
            exposure: 1.0,
            min_distance: 1.0,
            max_distance: 10.0,
            max_polar_angle: std::f32::consts::PI,
            auto_rotate_speed: 0.005,
            platform: None,
        }
    }
}

impl ViewerConfig {
    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or_else(Platform::detect)
    }

    /// Joins `path` onto the asset root.
    pub fn asset(&self, path: &str) -> String {
        let root = self.asset_root.trim_end_matches('/');
        if root.is_empty() {
            path.to_string()
        } else {
            format!("{root}/{}", path.trim_start_matches('/'))
        }
    }

    /// Applies `?mobile` / `?desktop` flags from a URL query string.
    pub fn with_query(mut self, query: &str) -> Self {
        let query = query.trim_start_matches('?');
        for pair in query.split('&') {
            let key = pair.split('=').next().unwrap_or_default();
            match key {
                "mobile" => self.platform = Some(Platform::Mobile),
                "desktop" => self.platform = Some(Platform::Desktop),
                _ => (),
            }
        }
        self
    }
}

/// Converts a `0xRRGGBB` colour into a wgpu clear colour.
///
/// On an sRGB surface the clear value is encoded by the GPU, so the components
/// are decoded to linear first to end up with the same pixel a browser shows
/// for that hex value.
pub fn clear_colour(hex: u32, srgb_surface: bool) -> wgpu::Color {
    let [r, g, b] = hex_rgb(hex).map(|c| {
        let c = c as f64;
        if srgb_surface { srgb_to_linear(c) } else { c }
    });
    wgpu::Color { r, g, b, a: 1.0 }
}

/// Splits `0xRRGGBB` into its channels in `0.0..=1.0`.
pub fn hex_rgb(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
    [channel(16), channel(8), channel(0)]
}

pub fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
