//! The GPU context shared by every part of the viewer.
//!
//! [`Context`] owns the device, the queue, the surface (when there is a
//! window), the render targets and the per-frame GPU state: camera, lights,
//! shadow map and environment. It is created once the window exists, or
//! headless for offscreen rendering.

use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraResources, OrbitControls, Projection},
    config::{ViewerConfig, clear_colour},
    data_structures::texture::Texture,
    pipelines::{
        Layouts, Pipelines,
        environment::EnvironmentResources,
        light::{DebugView, LightResources, LightSetup, ShadingSettings},
        shadow::ShadowResources,
    },
    platform::RenderProfile,
    resources::environment::Environment,
};

/// Lower bound for the exposure control.
const MIN_EXPOSURE: f32 = 0.05;

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Option<Arc<Window>>,
    pub(crate) surface: Option<wgpu::Surface<'static>>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub profile: RenderProfile,
    pub layouts: Layouts,
    pub pipelines: Pipelines,
    pub camera: CameraResources,
    pub light: LightResources,
    pub shadow: ShadowResources,
    pub environment: EnvironmentResources,
    pub depth_texture: Texture,
    /// Multisampled colour target, `None` when MSAA is off.
    pub msaa_target: Option<Texture>,
    pub clear_colour: wgpu::Color,
}

impl Context {
    /// Creates the context for a window. `size` is the surface size in physical
    /// pixels, already capped to the profile's pixel ratio.
    pub async fn new(
        window: Arc<Window>,
        size: (u32, u32),
        viewer: &ViewerConfig,
        profile: RenderProfile,
    ) -> anyhow::Result<Self> {
        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("could not create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable graphics adapter")?;
        let (device, queue) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface supports no texture format")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.0.max(1),
            height: size.1.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        let profile = clamp_msaa(&adapter, surface_format, profile);
        log::info!(
            "Surface {:?} {}x{}, {} sample(s)",
            surface_format,
            config.width,
            config.height,
            profile.msaa_samples
        );

        Ok(Self::from_parts(
            Some(window),
            Some(surface),
            device,
            queue,
            config,
            viewer,
            profile,
        ))
    }

    /// Creates a context without a window that renders into offscreen textures.
    pub async fn headless(
        width: u32,
        height: u32,
        viewer: &ViewerConfig,
        profile: RenderProfile,
    ) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable graphics adapter")?;
        let (device, queue) = request_device(&adapter).await?;
        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Opaque,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        let profile = clamp_msaa(&adapter, format, profile);
        Ok(Self::from_parts(None, None, device, queue, config, viewer, profile))
    }

    fn from_parts(
        window: Option<Arc<Window>>,
        surface: Option<wgpu::Surface<'static>>,
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: wgpu::SurfaceConfiguration,
        viewer: &ViewerConfig,
        profile: RenderProfile,
    ) -> Self {
        if let Some(surface) = &surface {
            surface.configure(&device, &config);
        }
        let layouts = Layouts::new(&device);
        let pipelines = Pipelines::new(&device, &layouts, config.format, profile.msaa_samples);

        let camera = Camera::new(viewer.camera_home, viewer.camera_target);
        let projection = Projection::new(
            config.width,
            config.height,
            cgmath::Deg(viewer.fovy_degrees),
            viewer.znear,
            viewer.zfar,
        );
        let mut controls = OrbitControls::new(&camera, (config.width, config.height));
        controls.enable_damping = true;
        controls.damping_factor = profile.damping_factor;
        controls.screen_space_panning = true;
        controls.min_distance = viewer.min_distance;
        controls.max_distance = viewer.max_distance;
        controls.max_polar_angle = viewer.max_polar_angle;
        let camera = CameraResources::new(&device, &layouts.camera, camera, controls, projection);
        log::info!(
            "Orbit controls around {:?}, distance {}..{}",
            viewer.camera_target,
            viewer.min_distance,
            viewer.max_distance
        );

        let setup = LightSetup::for_profile(&profile);
        let shading = ShadingSettings {
            exposure: viewer.exposure,
            environment: false,
            environment_mips: 1,
            encode_srgb: !config.format.is_srgb(),
            debug_view: DebugView::default(),
        };
        let shadow = ShadowResources::new(&device, &layouts.light_space, setup.shadow_view_proj());
        log::info!(
            "Lights: ambient {}, key {}, fill {:?}, shadows {}",
            setup.ambient_intensity,
            setup.key.intensity,
            setup.fill.map(|fill| fill.intensity),
            setup.shadows.is_some()
        );
        let light = LightResources::new(&device, &layouts.light, setup, shading);
        let environment = EnvironmentResources::empty(&device, &queue, &layouts.environment);

        let depth_texture = Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            profile.msaa_samples,
            "depth_texture",
        );
        let msaa_target = mk_msaa_target(&device, &config, profile.msaa_samples);
        let clear_colour = clear_colour(viewer.background, config.format.is_srgb());

        Self {
            window,
            surface,
            device,
            queue,
            config,
            profile,
            layouts,
            pipelines,
            camera,
            light,
            shadow,
            environment,
            depth_texture,
            msaa_target,
            clear_colour,
        }
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        self.window.as_ref()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigures the surface and recreates every size-dependent target.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        if let Some(surface) = &self.surface {
            surface.configure(&self.device, &self.config);
        }
        self.camera.resize(width, height);
        self.camera.write_to_buffer(&self.queue);
        self.depth_texture = Texture::create_depth_texture(
            &self.device,
            [width, height],
            self.profile.msaa_samples,
            "depth_texture",
        );
        self.msaa_target = mk_msaa_target(&self.device, &self.config, self.profile.msaa_samples);
    }

    pub fn set_environment(&mut self, environment: Environment) {
        self.light.shading.environment = true;
        self.light.shading.environment_mips = environment.mip_levels;
        self.environment
            .set(&self.device, &self.layouts.environment, environment);
        self.light.write_to_buffer(&self.queue);
    }

    pub fn exposure(&self) -> f32 {
        self.light.shading.exposure
    }

    pub fn set_exposure(&mut self, exposure: f32) {
        self.light.shading.exposure = exposure.max(MIN_EXPOSURE);
        self.light.write_to_buffer(&self.queue);
    }

    pub fn cycle_debug_view(&mut self) -> DebugView {
        self.light.shading.debug_view = self.light.shading.debug_view.next();
        self.light.write_to_buffer(&self.queue);
        self.light.shading.debug_view
    }
}

async fn request_device(adapter: &wgpu::Adapter) -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            // WebGL doesn't support all of wgpu's features, so if
            // we're building for the web we'll have to disable some.
            required_limits: if cfg!(target_arch = "wasm32") {
                wgpu::Limits::downlevel_webgl2_defaults()
            } else {
                wgpu::Limits::default()
            },
            memory_hints: Default::default(),
            experimental_features: Default::default(),
            trace: wgpu::Trace::Off,
        })
        .await
        .context("could not open the graphics device")
}

/// Falls back to the closest sample count the adapter supports for `format`.
fn clamp_msaa(adapter: &wgpu::Adapter, format: wgpu::TextureFormat, mut profile: RenderProfile) -> RenderProfile {
    let flags = adapter.get_texture_format_features(format).flags;
    let supported = |count: u32| count == 1 || flags.sample_count_supported(count);
    if !supported(profile.msaa_samples) {
        let fallback = [4, 2, 1]
            .into_iter()
            .find(|&count| count < profile.msaa_samples && supported(count))
            .unwrap_or(1);
        log::warn!(
            "{}x MSAA is not supported for {:?}, using {}x",
            profile.msaa_samples,
            format,
            fallback
        );
        profile.msaa_samples = fallback;
    }
    profile
}

fn mk_msaa_target(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> Option<Texture> {
    (sample_count > 1).then(|| {
        Texture::create_msaa_target(device, [config.width, config.height], config.format, sample_count)
    })
}
