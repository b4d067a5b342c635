//! Perspective camera and orbit controls
//!
//! The orbit controls keep a spherical position around a target point and
//! apply drag input with damping, one step per rendered frame.

use glam::{Mat4, Vec2, Vec3};

/// Keeps pitch away from the poles where `look_at` degenerates
const PITCH_LIMIT: f32 = 1.55;

/// Perspective camera looking from `eye` at `target`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub eye: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Aspect ratio (width/height)
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            eye: Vec3::ZERO,
            target: Vec3::NEG_Z,
            fov_degrees,
            aspect,
            near,
            far,
        }
    }

    /// Place the camera at `eye`, looking at `target`
    pub fn looking_at(mut self, eye: Vec3, target: Vec3) -> Self {
        self.eye = eye;
        self.target = target;
        self
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    /// Get combined view-projection matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update aspect ratio on resize
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }
}

/// Orbit controls with damping (zoom disabled)
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    target: Vec3,
    /// Horizontal angle (yaw) in radians
    yaw: f32,
    /// Vertical angle (pitch) in radians
    pitch: f32,
    distance: f32,
    /// Rotation still to be applied, drained by `damping` each update
    pending: Vec2,
    damping: f32,
    rotate_speed: f32,
    last_drag: Option<Vec2>,
}

impl OrbitControls {
    /// Create controls that start from the camera's current placement
    pub fn new(camera: &PerspectiveCamera, damping: f32, rotate_speed: f32) -> Self {
        let offset = camera.eye - camera.target;
        let distance = offset.length().max(f32::EPSILON);
        let pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        let yaw = offset.x.atan2(offset.z);
        Self {
            target: camera.target,
            yaw,
            pitch,
            distance,
            pending: Vec2::ZERO,
            damping: damping.clamp(0.0, 1.0),
            rotate_speed,
            last_drag: None,
        }
    }

    /// Calculate camera position from spherical coordinates
    pub fn eye_position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn begin_drag(&mut self, position: Vec2) {
        self.last_drag = Some(position);
    }

    /// Accumulate rotation for a drag to `position` (device pixels)
    pub fn drag_to(&mut self, position: Vec2, viewport_height: f32) {
        let Some(last) = self.last_drag else {
            return;
        };
        self.last_drag = Some(position);
        if viewport_height <= 0.0 {
            return;
        }
        let delta = position - last;
        let scale = std::f32::consts::TAU / viewport_height * self.rotate_speed;
        self.pending.x -= delta.x * scale;
        self.pending.y += delta.y * scale;
    }

    pub fn end_drag(&mut self) {
        self.last_drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.last_drag.is_some()
    }

    /// Apply one damped step and move the camera
    pub fn update(&mut self, camera: &mut PerspectiveCamera) {
        if self.damping > 0.0 {
            self.yaw += self.pending.x * self.damping;
            self.pitch += self.pending.y * self.damping;
            self.pending *= 1.0 - self.damping;
        } else {
            self.yaw += self.pending.x;
            self.pitch += self.pending.y;
            self.pending = Vec2::ZERO;
        }
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);

        camera.eye = self.eye_position();
        camera.target = self.target;
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }
}
