//! glb-viewer
//!
//! A small cross-platform glTF/GLB viewer built on wgpu and winit. It shows a
//! single model lit by an HDRI environment map, a key light with soft shadows
//! and ambient light, and lets the user orbit, pan and zoom around it. Mobile
//! devices get a lighter render profile; a failing model load is replaced by
//! a green cube. Runs natively and in the browser (WASM + WebGL2).
//!
//! High-level modules
//! - `cache`: cache-busting version query for asset requests
//! - `camera`: camera, projection, orbit controls and the camera uniform
//! - `config`: viewer configuration and colour helpers
//! - `context`: central GPU context that owns device/queue/pipelines and targets
//! - `data_structures`: meshes, materials, model placement and textures
//! - `frame`: frame-rate throttling
//! - `pipelines`: the PBR and shadow pipelines, lights and environment bindings
//! - `platform`: mobile/desktop detection and the render profile
//! - `render`: shadow and main passes, offscreen rendering
//! - `resources`: loading models and environment maps
//! - `viewer`: window, event loop and keyboard shortcuts
//!

pub mod cache;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod frame;
pub mod pipelines;
pub mod platform;
pub mod render;
pub mod resources;
pub mod viewer;

pub use config::ViewerConfig;
pub use viewer::run;
