//! Platform detection and the per-platform render profile.
//!
//! The viewer runs on desktop browsers, phones and natively. Mobile devices get
//! a lighter profile: no shadows or MSAA, a capped pixel ratio, brighter
//! lights to make up for the missing environment detail, and a throttled
//! frame rate.

/// Substrings of a user agent that mark a mobile browser (matched case-insensitively).
const MOBILE_AGENTS: [&str; 8] = [
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Mobile,
    Desktop,
}

impl Platform {
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if MOBILE_AGENTS.iter().any(|agent| ua.contains(agent)) {
            Platform::Mobile
        } else {
            Platform::Desktop
        }
    }

    /// Best guess for the platform the viewer currently runs on.
    ///
    /// On the web this reads `navigator.userAgent`; natively Android and iOS
    /// builds count as mobile.
    pub fn detect() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            let agent = web_sys::window().and_then(|w| w.navigator().user_agent().ok());
            match agent {
                Some(agent) => Self::from_user_agent(&agent),
                None => {
                    log::warn!("No user agent available, assuming desktop");
                    Platform::Desktop
                }
            }
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            if cfg!(any(target_os = "android", target_os = "ios")) {
                Platform::Mobile
            } else {
                Platform::Desktop
            }
        }
    }

    pub fn is_mobile(&self) -> bool {
        matches!(self, Platform::Mobile)
    }
}

/// Shadow settings of the key light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowSettings {
    pub map_size: u32,
    /// Half extent of the orthographic shadow camera.
    pub extent: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            map_size: 1024,
            extent: 5.0,
            near: 0.5,
            far: 50.0,
        }
    }
}

/// Material overrides applied to every loaded mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialTuning {
    pub env_intensity: f32,
    pub max_metalness: f32,
    pub min_roughness: f32,
}

/// Everything that differs between the mobile and the desktop experience.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderProfile {
    pub platform: Platform,
    pub msaa_samples: u32,
    pub shadows: Option<ShadowSettings>,
    pub max_pixel_ratio: Option<f64>,
    pub damping_factor: f32,
    pub ambient_intensity: f32,
    pub key_light_intensity: f32,
    /// Intensity of the extra fill light, if there is one.
    pub fill_light_intensity: Option<f32>,
    pub target_fps: u32,
    pub throttle: bool,
    pub auto_rotate: bool,
    pub material_tuning: Option<MaterialTuning>,
}

impl RenderProfile {
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Desktop => Self {
                platform,
                msaa_samples: 4,
                shadows: Some(ShadowSettings::default()),
                max_pixel_ratio: None,
                damping_factor: 0.02,
                ambient_intensity: 0.3,
                key_light_intensity: 0.8,
                fill_light_intensity: None,
                target_fps: 60,
                throttle: false,
                auto_rotate: true,
                material_tuning: None,
            },
            Platform::Mobile => Self {
                platform,
                msaa_samples: 1,
                shadows: None,
                max_pixel_ratio: Some(2.0),
                damping_factor: 0.1,
                ambient_intensity: 0.8,
                key_light_intensity: 1.2,
                fill_light_intensity: Some(0.5),
                target_fps: 30,
                throttle: true,
                auto_rotate: false,
                material_tuning: Some(MaterialTuning {
                    env_intensity: 0.3,
                    max_metalness: 0.8,
                    min_roughness: 0.2,
                }),
            },
        }
    }

    pub fn casts_shadows(&self) -> bool {
        self.shadows.is_some()
    }

    /// Size of the render surface for a window of `physical` pixels at the given
    /// scale factor, honouring the pixel ratio cap.
    pub fn surface_size(&self, physical: (u32, u32), scale_factor: f64) -> (u32, u32) {
        match self.max_pixel_ratio {
            Some(max) if scale_factor > max => {
                let ratio = max / scale_factor;
                let scale = |v: u32| ((v as f64 * ratio).round() as u32).max(1);
                (scale(physical.0), scale(physical.1))
            }
            _ => physical,
        }
    }
}

impl From<Platform> for RenderProfile {
    fn from(platform: Platform) -> Self {
        Self::for_platform(platform)
    }
}
