//! Application loop of the viewer.
//!
//! [`run`] opens a window (or takes over the `canvas` element on the web),
//! creates the GPU [`Context`] and starts loading the environment map and the
//! model in the background. Finished loads come back to the event loop as
//! [`ViewerEvent`]s. Every redraw runs the frame limiter, the orbit controls,
//! the auto-rotation and finally the render passes.
//!
//! # Keyboard shortcuts
//!
//! - `H` / `Home` moves the camera back to its start position
//! - `M` cycles the material debug view
//! - `+` / `-` raise and lower the exposure

use std::{fmt::Debug, sync::Arc};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::{Key, NamedKey},
    window::Window,
};

use crate::{
    cache::CacheBuster,
    config::ViewerConfig,
    context::Context,
    data_structures::model::Model,
    frame::FrameLimiter,
    platform::RenderProfile,
    render::{Scene, render_to_surface},
    resources::{
        environment::{Environment, load_environment},
        fallback_cube,
        fetch::Progress,
        load_model_gltf,
    },
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Factor applied to the exposure per key press.
const EXPOSURE_STEP: f32 = 1.1;

/// Something the user asked for from the keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Home,
    CycleDebugView,
    ExposureUp,
    ExposureDown,
}

impl Action {
    pub fn from_key(key: &Key) -> Option<Self> {
        match key {
            Key::Named(NamedKey::Home) => Some(Action::Home),
            Key::Character(c) => match c.as_str() {
                "h" | "H" => Some(Action::Home),
                "m" | "M" => Some(Action::CycleDebugView),
                "+" | "=" => Some(Action::ExposureUp),
                "-" | "_" => Some(Action::ExposureDown),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Results of background work, delivered through the event loop.
pub enum ViewerEvent {
    #[allow(dead_code)]
    Initialized(Box<AppState>),
    ModelLoaded(Model),
    ModelFailed(anyhow::Error),
    EnvironmentLoaded(Environment),
    EnvironmentFailed(anyhow::Error),
}

impl Debug for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::ModelLoaded(model) => f
                .debug_struct("ModelLoaded")
                .field("meshes", &model.meshes.len())
                .finish(),
            Self::ModelFailed(e) => f.debug_tuple("ModelFailed").field(e).finish(),
            Self::EnvironmentLoaded(env) => f
                .debug_struct("EnvironmentLoaded")
                .field("mip_levels", &env.mip_levels)
                .finish(),
            Self::EnvironmentFailed(e) => f.debug_tuple("EnvironmentFailed").field(e).finish(),
        }
    }
}

/// GPU context plus what is shown in it.
#[derive(Debug)]
pub struct AppState {
    pub(crate) ctx: Context,
    scene: Option<Scene>,
    limiter: FrameLimiter,
    is_surface_configured: bool,
}

impl AppState {
    pub fn new(ctx: Context) -> Self {
        let limiter = FrameLimiter::new(ctx.profile.target_fps, ctx.profile.throttle);
        Self {
            ctx,
            scene: None,
            limiter,
            is_surface_configured: false,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.resize(width, height);
            self.is_surface_configured = true;
        }
    }

    /// Resizes to the window's current size, honouring the pixel ratio cap.
    fn fit_window(&mut self) {
        if let Some(window) = self.ctx.window() {
            let size = window.inner_size();
            let (width, height) = self
                .ctx
                .profile
                .surface_size((size.width, size.height), window.scale_factor());
            self.resize(width, height);
        }
    }

    /// Shows a loaded model, or the fallback cube when loading failed.
    ///
    /// Loaded models get the mobile material tuning and receive shadows on
    /// desktop. The cube is shown as built and only casts.
    pub fn on_model_result(&mut self, result: anyhow::Result<Model>) {
        let profile = &self.ctx.profile;
        let mut model = match result {
            Ok(mut model) => {
                log::info!("Model ready with {} meshes", model.meshes.len());
                if let Some(tuning) = profile.material_tuning {
                    model.tune_materials(&self.ctx.queue, &tuning);
                }
                model.set_receive_shadows(&self.ctx.queue, profile.casts_shadows());
                model
            }
            Err(e) => {
                log::error!("Error loading model: {:#}", e);
                log::info!("Showing the fallback cube instead");
                let ctx = &self.ctx;
                fallback_cube(&ctx.device, &ctx.queue, &ctx.layouts.material)
            }
        };
        model.casts_shadow = profile.casts_shadows();
        self.scene = Some(Scene::new(&self.ctx.device, model));
    }

    /// Binds a loaded environment map; without one the shader skips reflections.
    pub fn on_environment_result(&mut self, result: anyhow::Result<Environment>) {
        match result {
            Ok(environment) => {
                log::info!("HDRI environment loaded");
                self.ctx.set_environment(environment);
            }
            Err(e) => log::warn!("Error loading HDRI, continuing without environment map: {:#}", e),
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Home => {
                self.ctx.camera.home(&self.ctx.queue);
                log::info!("Camera reset to home");
            }
            Action::CycleDebugView => {
                let view = self.ctx.cycle_debug_view();
                log::info!("Material debug view: {:?}", view);
            }
            Action::ExposureUp => self.ctx.set_exposure(self.ctx.exposure() * EXPOSURE_STEP),
            Action::ExposureDown => self.ctx.set_exposure(self.ctx.exposure() / EXPOSURE_STEP),
        }
    }

    /// One animation-frame callback. Throttled frames do nothing at all.
    fn frame(&mut self, now_ms: f64, auto_rotate_speed: f32) -> Result<(), wgpu::SurfaceError> {
        if !self.is_surface_configured || !self.limiter.should_render(now_ms) {
            return Ok(());
        }
        self.ctx.camera.update(&self.ctx.queue);
        if self.ctx.profile.auto_rotate {
            if let Some(scene) = &mut self.scene {
                scene.rotate(&self.ctx.queue, cgmath::Rad(auto_rotate_speed));
            }
        }
        render_to_surface(&self.ctx, self.scene.as_ref())
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<ViewerEvent>,
    config: ViewerConfig,
    profile: RenderProfile,
    cache: CacheBuster,
    state: Option<AppState>,
    started: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<ViewerEvent>, config: ViewerConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        let platform = config.platform();
        let profile = RenderProfile::for_platform(platform);
        let cache = CacheBuster::now();
        log::info!("Platform {:?}, asset version {}", platform, cache.version());
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config,
            profile,
            cache,
            state: None,
            started: Instant::now(),
        })
    }

    /// Runs `fut` and posts its result back as an event.
    ///
    /// On the web the future runs on the browser's task queue. Natively it is
    /// driven to completion right here, so the loads started from `resumed`
    /// finish one after the other before the first frame is drawn.
    fn spawn(&self, fut: impl Future<Output = ViewerEvent> + 'static) {
        let proxy = self.proxy.clone();
        #[cfg(not(target_arch = "wasm32"))]
        {
            let event = self.async_runtime.block_on(fut);
            send(&proxy, event);
        }
        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(async move {
                send(&proxy, fut.await);
            });
        }
    }

    /// Starts loading the environment map and the model.
    fn load_assets(&self, ctx: &Context) {
        let device = ctx.device.clone();
        let queue = ctx.queue.clone();
        let env_file = self.cache.versioned(&self.config.asset(&self.config.environment_path));
        self.spawn(async move {
            log::info!("Loading environment {}", env_file);
            match load_environment(&env_file, &device, &queue, log_progress("environment")).await {
                Ok(environment) => ViewerEvent::EnvironmentLoaded(environment),
                Err(e) => ViewerEvent::EnvironmentFailed(e),
            }
        });

        let device = ctx.device.clone();
        let queue = ctx.queue.clone();
        let layout = ctx.layouts.material.clone();
        let model_file = self.cache.versioned(&self.config.asset(&self.config.model_path));
        self.spawn(async move {
            log::info!("Loading model {}", model_file);
            match load_model_gltf(&model_file, &device, &queue, &layout, log_progress("model")).await {
                Ok(model) => ViewerEvent::ModelLoaded(model),
                Err(e) => ViewerEvent::ModelFailed(e),
            }
        });
    }

    fn with_state(&mut self, f: impl FnOnce(&mut AppState)) {
        match &mut self.state {
            Some(state) => f(state),
            None => log::warn!("Asset arrived before the GPU context, dropping it"),
        }
    }

    fn initialized(&mut self, mut state: AppState) {
        state.fit_window();
        self.load_assets(&state.ctx);
        if let Some(window) = state.ctx.window() {
            window.request_redraw();
        }
        self.state = Some(state);
        log::info!("Render loop started");
    }
}

fn send(proxy: &EventLoopProxy<ViewerEvent>, event: ViewerEvent) {
    if let Err(e) = proxy.send_event(event) {
        log::error!("Event loop closed before {:?} could be delivered", e.0);
    }
}

/// Logs load progress in steps of ten percent.
fn log_progress(asset: &'static str) -> impl FnMut(Progress) {
    let mut last_step = None;
    move |progress| match progress.percent() {
        Some(percent) => {
            let step = (percent / 10.0).floor() as u32;
            if last_step != Some(step) {
                last_step = Some(step);
                log::info!("{}: {:.0}% loaded", asset, percent);
            }
        }
        None => log::debug!("{}: {} bytes loaded", asset, progress.loaded),
    }
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("GLB Viewer");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Could not create the window: {}", e);
                event_loop.exit();
                return;
            }
        };
        let inner = window.inner_size();
        let size = self
            .profile
            .surface_size((inner.width, inner.height), window.scale_factor());
        let config = self.config.clone();
        let profile = self.profile.clone();
        let init_future = async move { Context::new(window, size, &config, profile).await };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(ctx) => self.initialized(AppState::new(ctx)),
                Err(e) => {
                    log::error!("App initialization failed. Cannot create the main context: {:#}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok(ctx) => send(&proxy, ViewerEvent::Initialized(Box::new(AppState::new(ctx)))),
                    Err(e) => log::error!("App initialization failed. Cannot create the main context: {:#}", e),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Initialized(state) => self.initialized(*state),
            ViewerEvent::ModelLoaded(model) => self.with_state(|state| state.on_model_result(Ok(model))),
            ViewerEvent::ModelFailed(e) => self.with_state(|state| state.on_model_result(Err(e))),
            ViewerEvent::EnvironmentLoaded(environment) => {
                self.with_state(|state| state.on_environment_result(Ok(environment)))
            }
            ViewerEvent::EnvironmentFailed(e) => self.with_state(|state| state.on_environment_result(Err(e))),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.camera.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => state.fit_window(),
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                if let Some(action) = Action::from_key(&event.logical_key) {
                    state.apply(action);
                }
            }
            WindowEvent::RedrawRequested => {
                // keep the animation-frame loop going
                if let Some(window) = state.ctx.window() {
                    window.request_redraw();
                }
                let now_ms = self.started.elapsed().as_secs_f64() * 1000.0;
                match state.frame(now_ms, self.config.auto_rotate_speed) {
                    Ok(()) => (),
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => state.fit_window(),
                    Err(e) => log::error!("Unable to render {}", e),
                }
            }
            _ => {}
        }
    }
}

/// Sets up `env_logger` natively; `default_filter` applies unless `RUST_LOG` is set.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    if let Err(e) = env_logger::Builder::from_env(env).try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    }
}

/// Forwards log records to the browser console.
#[cfg(target_arch = "wasm32")]
pub fn init_logging(level: log::Level) {
    if let Err(e) = console_log::init_with_level(level) {
        web_sys::console::warn_1(&format!("Could not initialize logger: {e}").into());
    }
}

/// Opens the viewer and blocks until the window is closed.
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;
    event_loop.run_app(&mut app)?;
    Ok(())
}

/// Entry point of the web build.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    init_logging(log::Level::Info);
    let query = web_sys::window()
        .and_then(|window| window.location().search().ok())
        .unwrap_or_default();
    let config = ViewerConfig::default().with_query(&query);
    run(config).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
