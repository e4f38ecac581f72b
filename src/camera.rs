//! Perspective camera, projection and orbit controls.
//!
//! The camera always looks at a target point. [`OrbitControls`] moves it on a
//! sphere around that target (rotate), slides both along the view plane
//! (pan) and changes the sphere radius (dolly). All movements are damped so
//! the camera eases out after the input stops.

use std::collections::HashMap;
use std::f32::consts::PI;

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Keeps the polar angle away from the poles where `look_at` degenerates.
const POLAR_EPSILON: f32 = 1e-6;
/// Zoom factor per wheel notch.
const ZOOM_SCALE: f32 = 0.95;
/// Pixels of trackpad scrolling that count as one wheel notch.
const PIXELS_PER_NOTCH: f64 = 100.0;

#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
        }
    }

    pub fn look_at(&mut self, target: Point3<f32>) {
        self.target = target;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    /// Unit vectors pointing right and up on screen, in world space.
    pub fn screen_axes(&self) -> (Vector3<f32>, Vector3<f32>) {
        let forward = (self.target - self.position).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward);
        (right, up)
    }
}

#[derive(Clone, Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn fovy(&self) -> Rad<f32> {
        self.fovy
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Position on a sphere around the orbit target. `theta` is the azimuth
/// around +Y measured from +Z, `phi` the polar angle measured from +Y.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub phi: f32,
    pub theta: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vector3<f32>) -> Self {
        let radius = offset.magnitude();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(&self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Drag {
    None,
    Rotate,
    Pan,
}

/// Damped orbit controls around a target point.
#[derive(Debug)]
pub struct OrbitControls {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub screen_space_panning: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    target: Point3<f32>,
    spherical_delta: Spherical,
    pan_offset: Vector3<f32>,
    scale: f32,
    // saved by `save_state`, restored by `reset`
    target0: Point3<f32>,
    position0: Point3<f32>,
    viewport: (u32, u32),
    drag: Drag,
    cursor: Option<PhysicalPosition<f64>>,
    touches: HashMap<u64, PhysicalPosition<f64>>,
}

impl OrbitControls {
    pub fn new(camera: &Camera, viewport: (u32, u32)) -> Self {
        Self {
            enable_damping: false,
            damping_factor: 0.05,
            screen_space_panning: true,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            target: camera.target,
            spherical_delta: Spherical::default(),
            pan_offset: Vector3::new(0.0, 0.0, 0.0),
            scale: 1.0,
            target0: camera.target,
            position0: camera.position,
            viewport,
            drag: Drag::None,
            cursor: None,
            touches: HashMap::new(),
        }
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    /// Remembers the current camera placement as the one `reset` returns to.
    pub fn save_state(&mut self, camera: &Camera) {
        self.target0 = self.target;
        self.position0 = camera.position;
    }

    /// Moves the camera back to the saved state and drops any pending motion.
    pub fn reset(&mut self, camera: &mut Camera) {
        self.target = self.target0;
        camera.position = self.position0;
        camera.look_at(self.target);
        self.spherical_delta = Spherical::default();
        self.pan_offset = Vector3::new(0.0, 0.0, 0.0);
        self.scale = 1.0;
        self.drag = Drag::None;
        self.touches.clear();
        self.update(camera);
    }

    /// Turns the camera around the target by `angle` radians (azimuth).
    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    /// Tilts the camera by `angle` radians (polar).
    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    /// Moves closer to the target; `scale` < 1 zooms in.
    pub fn dolly(&mut self, scale: f32) {
        self.scale *= scale;
    }

    /// Pans by a screen-space pixel delta, measured at the target's distance.
    pub fn pan(&mut self, camera: &Camera, fovy: Rad<f32>, dx: f32, dy: f32) {
        let height = self.viewport.1.max(1) as f32;
        let offset = camera.position - self.target;
        let target_distance = offset.magnitude() * (fovy.0 / 2.0).tan();
        let (right, up) = camera.screen_axes();
        let up = if self.screen_space_panning {
            up
        } else {
            // pan parallel to the ground
            Vector3::unit_y().cross(right).normalize()
        };
        let left = right * (-2.0 * dx * target_distance / height * self.pan_speed);
        let up = up * (2.0 * dy * target_distance / height * self.pan_speed);
        self.pan_offset += left + up;
    }

    /// Applies pending motion to `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let old_position = camera.position;
        let old_target = self.target;
        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_offset(offset);

        if self.enable_damping {
            spherical.theta += self.spherical_delta.theta * self.damping_factor;
            spherical.phi += self.spherical_delta.phi * self.damping_factor;
        } else {
            spherical.theta += self.spherical_delta.theta;
            spherical.phi += self.spherical_delta.phi;
        }

        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        if self.enable_damping {
            self.target += self.pan_offset * self.damping_factor;
        } else {
            self.target += self.pan_offset;
        }

        camera.position = self.target + spherical.to_offset();
        camera.look_at(self.target);

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.spherical_delta.theta *= decay;
            self.spherical_delta.phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.spherical_delta = Spherical::default();
            self.pan_offset = Vector3::new(0.0, 0.0, 0.0);
        }
        self.scale = 1.0;

        (camera.position - old_position).magnitude2() > f32::EPSILON
            || (self.target - old_target).magnitude2() > f32::EPSILON
    }

    /// Feeds a window event into the controls. Returns whether it was used.
    pub fn handle_window_event(&mut self, camera: &Camera, fovy: Rad<f32>, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                self.drag = match (state, button) {
                    (ElementState::Pressed, MouseButton::Left) => Drag::Rotate,
                    (ElementState::Pressed, MouseButton::Right | MouseButton::Middle) => Drag::Pan,
                    (ElementState::Released, _) => Drag::None,
                    _ => self.drag,
                };
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.cursor.replace(*position);
                match previous {
                    Some(previous) if self.drag != Drag::None => {
                        let dx = (position.x - previous.x) as f32;
                        let dy = (position.y - previous.y) as f32;
                        self.drag_by(camera, fovy, dx, dy);
                        true
                    }
                    _ => false,
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.drag = Drag::None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y as f64,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y / PIXELS_PER_NOTCH,
                };
                // scrolling up zooms in
                self.dolly(ZOOM_SCALE.powf(notches as f32));
                true
            }
            WindowEvent::PinchGesture { delta, .. } => {
                self.dolly(1.0 - *delta as f32);
                true
            }
            WindowEvent::Touch(touch) => {
                self.handle_touch(camera, fovy, touch.id, touch.phase, touch.location);
                true
            }
            _ => false,
        }
    }

    fn drag_by(&mut self, camera: &Camera, fovy: Rad<f32>, dx: f32, dy: f32) {
        match self.drag {
            Drag::Rotate => {
                let height = self.viewport.1.max(1) as f32;
                self.rotate_left(2.0 * PI * dx / height * self.rotate_speed);
                self.rotate_up(2.0 * PI * dy / height * self.rotate_speed);
            }
            Drag::Pan => self.pan(camera, fovy, dx, dy),
            Drag::None => (),
        }
    }

    /// One finger rotates, two fingers pinch to dolly and drag to pan.
    fn handle_touch(
        &mut self,
        camera: &Camera,
        fovy: Rad<f32>,
        id: u64,
        phase: TouchPhase,
        location: PhysicalPosition<f64>,
    ) {
        match phase {
            TouchPhase::Started => {
                self.touches.insert(id, location);
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.touches.remove(&id);
            }
            TouchPhase::Moved => {
                let before = self.touch_centre_and_spread();
                let Some(previous) = self.touches.insert(id, location) else {
                    return;
                };
                match self.touches.len() {
                    1 => {
                        let height = self.viewport.1.max(1) as f32;
                        let dx = (location.x - previous.x) as f32;
                        let dy = (location.y - previous.y) as f32;
                        self.rotate_left(2.0 * PI * dx / height * self.rotate_speed);
                        self.rotate_up(2.0 * PI * dy / height * self.rotate_speed);
                    }
                    2 => {
                        if let (Some((c0, s0)), Some((c1, s1))) = (before, self.touch_centre_and_spread()) {
                            if s1 > 0.0 {
                                self.dolly(s0 / s1);
                            }
                            self.pan(camera, fovy, (c1.0 - c0.0) as f32, (c1.1 - c0.1) as f32);
                        }
                    }
                    _ => (),
                }
            }
        }
    }

    fn touch_centre_and_spread(&self) -> Option<((f64, f64), f32)> {
        if self.touches.len() != 2 {
            return None;
        }
        let mut points = self.touches.values();
        let a = points.next()?;
        let b = points.next()?;
        let centre = ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
        let spread = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt() as f32;
        Some((centre, spread))
    }
}

/// Camera state plus its GPU uniform.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controls: OrbitControls,
    pub projection: Projection,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl CameraResources {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        camera: Camera,
        controls: OrbitControls,
        projection: Projection,
    ) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, &projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controls,
            projection,
            uniform,
            buffer,
            bind_group,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
        self.controls.resize(width, height);
    }

    /// Runs the controls and uploads the resulting view. Returns whether the camera moved.
    pub fn update(&mut self, queue: &wgpu::Queue) -> bool {
        let moved = self.controls.update(&mut self.camera);
        self.write_to_buffer(queue);
        moved
    }

    /// Puts the camera back where it started, see [`OrbitControls::reset`].
    pub fn home(&mut self, queue: &wgpu::Queue) {
        self.controls.reset(&mut self.camera);
        self.write_to_buffer(queue);
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        let fovy = self.projection.fovy();
        self.controls.handle_window_event(&self.camera, fovy, event)
    }

    pub fn write_to_buffer(&mut self, queue: &wgpu::Queue) {
        self.uniform.update_view_proj(&self.camera, &self.projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
