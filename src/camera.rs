//! Camera, projection and orbit controls.
//!
//! The camera orbits a target point: right-drag swings the eye around it, the mouse wheel
//! moves it closer or further away. The projection keeps a fixed aspect ratio; the window is
//! letterboxed instead of stretching the scene.

use std::f32::consts::FRAC_PI_2;

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use instant::Duration;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// cgmath builds OpenGL clip space (z in -1..1); wgpu expects z in 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const SAFE_POLAR: f32 = 0.01;
const MIN_DISTANCE: f32 = 10.0;
const MAX_DISTANCE: f32 = 600.0;

/// Eye position in spherical coordinates around `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub target: Point3<f32>,
    pub distance: f32,
    /// Angle around the y axis.
    pub azimuth: Rad<f32>,
    /// Angle from the +y axis, kept away from both poles.
    pub polar: Rad<f32>,
}

impl Camera {
    pub fn looking_at<E: Into<Point3<f32>>, T: Into<Point3<f32>>>(eye: E, target: T) -> Self {
        let target = target.into();
        let offset = eye.into() - target;
        let distance = offset.magnitude().max(f32::EPSILON);
        Self {
            target,
            distance,
            azimuth: Rad(offset.x.atan2(offset.z)),
            polar: Rad((offset.y / distance).clamp(-1.0, 1.0).acos()),
        }
    }

    pub fn eye(&self) -> Point3<f32> {
        let (sin_p, cos_p) = self.polar.0.sin_cos();
        let (sin_a, cos_a) = self.azimuth.0.sin_cos();
        self.target + Vector3::new(sin_p * sin_a, cos_p, sin_p * cos_a) * self.distance
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye(), self.target, Vector3::unit_y())
    }
}

#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(aspect: f32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Accumulates mouse input between frames and applies it to a [`Camera`] on `update`.
#[derive(Debug)]
pub struct CameraController {
    rotate_horizontal: f32,
    rotate_vertical: f32,
    scroll: f32,
    dragging: bool,
    sensitivity: f32,
    zoom_speed: f32,
}

impl CameraController {
    pub fn new(sensitivity: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            scroll: 0.0,
            dragging: false,
            sensitivity,
            zoom_speed,
        }
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state,
                ..
            } => self.dragging = *state == ElementState::Pressed,
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll += match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
            }
            _ => {}
        }
    }

    /// Raw mouse motion; only counts while the right button is held.
    pub fn handle_mouse(&mut self, mouse_dx: f64, mouse_dy: f64) {
        if self.dragging {
            self.rotate_horizontal += mouse_dx as f32;
            self.rotate_vertical += mouse_dy as f32;
        }
    }

    pub fn update(&mut self, camera: &mut Camera, dt: Duration) {
        let dt = dt.as_secs_f32();

        camera.azimuth -= Rad(self.rotate_horizontal * self.sensitivity * dt);
        camera.polar -= Rad(self.rotate_vertical * self.sensitivity * dt);
        camera.polar = Rad(camera.polar.0.clamp(SAFE_POLAR, 2.0 * FRAC_PI_2 - SAFE_POLAR));

        // Each wheel notch moves a fixed fraction of the current distance
        camera.distance = (camera.distance * (1.0 - self.scroll * self.zoom_speed))
            .clamp(MIN_DISTANCE, MAX_DISTANCE);

        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;
        self.scroll = 0.0;
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
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
        self.view_position = camera.eye().to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Layout of bind group 0: the camera uniform, read by both shader stages.
pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("camera_bind_group_layout"),
    })
}

#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[cfg(test)]
mod tests {
    use cgmath::EuclideanSpace;

    use super::*;

    fn close(a: Point3<f32>, b: Point3<f32>) -> bool {
        (a - b).magnitude() < 1e-3
    }

    #[test]
    fn spherical_round_trip_keeps_the_eye() {
        let camera = Camera::looking_at((40.0, 20.0, 100.0), (0.0, 0.0, 0.0));
        assert!(close(camera.eye(), Point3::new(40.0, 20.0, 100.0)));
    }

    #[test]
    fn orbiting_keeps_the_distance_to_the_target() {
        let mut camera = Camera::looking_at((40.0, 20.0, 100.0), Point3::origin());
        let before = camera.distance;
        let mut controller = CameraController::new(0.5, 0.1);
        controller.handle_window_events(&WindowEvent::MouseInput {
            device_id: winit::event::DeviceId::dummy(),
            state: ElementState::Pressed,
            button: MouseButton::Right,
        });
        controller.handle_mouse(120.0, -40.0);
        controller.update(&mut camera, Duration::from_millis(16));
        assert!((camera.eye().to_vec().magnitude() - before).abs() < 1e-3);
        assert!(!close(camera.eye(), Point3::new(40.0, 20.0, 100.0)));
    }

    #[test]
    fn motion_without_right_drag_is_ignored() {
        let mut camera = Camera::looking_at((40.0, 20.0, 100.0), Point3::origin());
        let mut controller = CameraController::new(0.5, 0.1);
        controller.handle_mouse(500.0, 500.0);
        controller.update(&mut camera, Duration::from_millis(16));
        assert!(close(camera.eye(), Point3::new(40.0, 20.0, 100.0)));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = Camera::looking_at((0.0, 0.0, 50.0), Point3::origin());
        let mut controller = CameraController::new(0.5, 0.1);
        controller.scroll = 100.0;
        controller.update(&mut camera, Duration::from_millis(16));
        assert_eq!(camera.distance, MIN_DISTANCE);
    }
}
