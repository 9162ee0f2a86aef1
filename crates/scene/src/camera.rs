use glam::{Mat3, Vec2, Vec3};
use rtdemo_uniforms::UniformBlock;
use serde::{Deserialize, Serialize};

/// Slack allowed on unit length and orthogonality of the axes.
const AXIS_TOLERANCE: f32 = 1e-2;

/// Steepest elevation the fly controls allow, so `view` never lines up with world Y.
const MAX_ELEVATION: f32 = 85.0 * std::f32::consts::PI / 180.0;

/// Pinhole camera described by its axes, as the tracing shader consumes it.
///
/// Primary rays leave `position` along `view + x*scale.x*right + y*scale.y*up`
/// for screen coordinates `x, y` in `[-1, 1]`. `view` is deliberately not
/// normalized: its length is the focal distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    pub view: Vec3,
    pub up: Vec3,
    pub right: Vec3,
    pub scale: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(18.0, 0.0, -18.0),
            view: Vec3::new(-2.0, 0.0, 2.0),
            up: Vec3::Y,
            right: Vec3::new(1.0, 0.0, 1.0) / 2.0_f32.sqrt(),
            scale: Vec2::new(800.0 / 600.0, 1.0),
        }
    }
}

impl Camera {
    /// Match the horizontal scale to the framebuffer aspect ratio.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.scale = Vec2::new(width as f32 / height.max(1) as f32, 1.0);
    }

    /// Apply `m` to every axis and to the position.
    pub fn transform(&mut self, m: Mat3) {
        self.position = m * self.position;
        self.view = m * self.view;
        self.up = m * self.up;
        self.right = m * self.right;
    }

    /// Rotate the whole rig about the world Y axis through the origin.
    pub fn orbit(&mut self, angle: f32) {
        self.transform(Mat3::from_rotation_y(angle));
    }

    /// Translate along the camera's own axes.
    pub fn move_local(&mut self, forward: f32, strafe: f32, lift: f32) {
        self.position += self.view.normalize() * forward
            + self.right.normalize() * strafe
            + self.up.normalize() * lift;
    }

    /// Turn about world Y; positive angles turn towards `right`.
    pub fn yaw(&mut self, angle: f32) {
        let m = Mat3::from_rotation_y(angle);
        self.view = m * self.view;
        self.up = m * self.up;
        self.right = m * self.right;
    }

    /// Tilt about `right`; positive angles look up. Elevation is clamped.
    pub fn pitch(&mut self, angle: f32) {
        let elevation = self.elevation();
        let delta = (elevation + angle).clamp(-MAX_ELEVATION, MAX_ELEVATION) - elevation;
        if delta == 0.0 {
            return;
        }
        let m = Mat3::from_axis_angle(self.right.normalize(), -delta);
        self.view = m * self.view;
        self.up = m * self.up;
    }

    /// Angle between `view` and the horizontal plane, in radians.
    pub fn elevation(&self) -> f32 {
        self.view.normalize().y.clamp(-1.0, 1.0).asin()
    }

    /// Reject rigs that would make the tracer produce NaN rays.
    pub fn check(&self) -> Result<(), &'static str> {
        let finite = self.position.is_finite()
            && self.view.is_finite()
            && self.up.is_finite()
            && self.right.is_finite()
            && self.scale.is_finite();
        if !finite {
            return Err("non-finite component");
        }
        if self.view.length() <= 1e-6 {
            return Err("view has zero length");
        }
        if (self.right.length() - 1.0).abs() > AXIS_TOLERANCE {
            return Err("right is not a unit vector");
        }
        if (self.up.length() - 1.0).abs() > AXIS_TOLERANCE {
            return Err("up is not a unit vector");
        }
        let view = self.view.normalize();
        if view.dot(self.right).abs() > AXIS_TOLERANCE
            || view.dot(self.up).abs() > AXIS_TOLERANCE
            || self.up.dot(self.right).abs() > AXIS_TOLERANCE
        {
            return Err("axes are not orthogonal");
        }
        if self.scale.min_element() <= 0.0 {
            return Err("non-positive scale");
        }
        Ok(())
    }

    /// Write the `uCamera.*` uniforms.
    pub fn upload(&self, block: &mut UniformBlock) {
        block.set_vec3("uCamera.position", self.position);
        block.set_vec3("uCamera.view", self.view);
        block.set_vec3("uCamera.up", self.up);
        block.set_vec3("uCamera.right", self.right);
        block.set_vec2("uCamera.scale", self.scale);
    }
}
