use glam::{Mat4, Vec3};

/// How the camera projects the scene onto its view window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionType {
    #[default]
    Perspective,
    /// Orthographic projection: parallel rays along the view direction.
    Parallel,
}

/// Camera for 3D rendering.
///
/// Every setter bumps [`Camera::revision`], so callers that cache frames can
/// tell whether anything changed since their last render by comparing revisions.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    /// Vertical field of view in radians (perspective only)
    fov_y: f32,
    /// Height of the view window for parallel projection
    parallel_height: f32,
    aspect: f32,
    near: f32,
    far: f32,
    projection: ProjectionType,
    revision: u64,
}

impl Camera {
    /// Create a new perspective camera looking from `position` at `target`.
    pub fn new(position: Vec3, target: Vec3, aspect: f32) -> Self {
        Self {
            position,
            target,
            up: Vec3::Y,
            fov_y: 45.0_f32.to_radians(),
            parallel_height: 10.0,
            aspect,
            near: 0.1,
            far: 100.0,
            projection: ProjectionType::Perspective,
            revision: 0,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn projection_type(&self) -> ProjectionType {
        self.projection
    }

    /// Vertical view angle in degrees.
    pub fn view_angle(&self) -> f32 {
        self.fov_y.to_degrees()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect
    }

    pub fn near_plane(&self) -> f32 {
        self.near
    }

    /// Near and far clipping distances.
    pub fn clipping_planes(&self) -> (f32, f32) {
        (self.near, self.far)
    }

    /// Height of the view window in world units.
    ///
    /// For perspective projection the window lies on the near plane.
    pub fn window_height(&self) -> f32 {
        match self.projection {
            ProjectionType::Perspective => 2.0 * self.near * (self.fov_y * 0.5).tan(),
            ProjectionType::Parallel => self.parallel_height,
        }
    }

    /// Monotonic change counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Get the view matrix (world → camera space)
    pub fn world_to_camera_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Camera → world. Columns are the right, up and backward axes plus the position.
    pub fn camera_to_world_matrix(&self) -> Mat4 {
        self.world_to_camera_matrix().inverse()
    }

    /// Get the projection matrix (camera → clip space)
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            ProjectionType::Perspective => {
                Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
            }
            ProjectionType::Parallel => {
                let half_h = self.parallel_height * 0.5;
                let half_w = half_h * self.aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
        }
    }

    /// Unit vector the camera looks along.
    pub fn view_direction(&self) -> Vec3 {
        (self.target - self.position).try_normalize().unwrap_or(Vec3::NEG_Z)
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.touch();
    }

    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
        self.touch();
    }

    /// Set the vertical view angle in degrees, clamped to (1, 179).
    pub fn set_view_angle(&mut self, degrees: f32) {
        self.fov_y = degrees.clamp(1.0, 179.0).to_radians();
        self.touch();
    }

    pub fn set_projection_type(&mut self, projection: ProjectionType) {
        self.projection = projection;
        self.touch();
    }

    pub fn set_parallel_height(&mut self, height: f32) {
        self.parallel_height = height.max(f32::EPSILON);
        self.touch();
    }

    /// Set clipping distances. Far is kept strictly beyond near.
    pub fn set_clipping_planes(&mut self, near: f32, far: f32) {
        self.near = near.max(f32::EPSILON);
        self.far = far.max(self.near + f32::EPSILON);
        self.touch();
    }

    /// Update aspect ratio (e.g., on window resize)
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.touch();
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_to_world_axes() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 1.0);
        let m = camera.camera_to_world_matrix();

        assert!((m.x_axis.truncate() - Vec3::X).length() < 1e-5);
        assert!((m.y_axis.truncate() - Vec3::Y).length() < 1e-5);
        // Camera looks down -n.
        assert!((m.z_axis.truncate() - Vec3::Z).length() < 1e-5);
        assert!((m.w_axis.truncate() - camera.position()).length() < 1e-5);
    }

    #[test]
    fn test_window_height() {
        let mut camera = Camera::new(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        camera.set_view_angle(90.0);
        camera.set_clipping_planes(1.0, 10.0);
        assert!((camera.window_height() - 2.0).abs() < 1e-5);

        camera.set_projection_type(ProjectionType::Parallel);
        camera.set_parallel_height(6.0);
        assert_eq!(camera.window_height(), 6.0);
    }

    #[test]
    fn test_setters_bump_revision() {
        let mut camera = Camera::new(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        let before = camera.revision();
        camera.set_aspect(16.0 / 9.0);
        camera.set_position(Vec3::ONE);
        assert_eq!(camera.revision(), before + 2);
        assert_eq!(camera.aspect_ratio(), 16.0 / 9.0);
    }

    #[test]
    fn test_clipping_planes_stay_ordered() {
        let mut camera = Camera::new(Vec3::ZERO, Vec3::NEG_Z, 1.0);
        camera.set_clipping_planes(5.0, 1.0);
        let (near, far) = camera.clipping_planes();
        assert!(far > near);
    }

    #[test]
    fn test_projection_matrix() {
        let camera = Camera::new(Vec3::ZERO, Vec3::NEG_Z, 16.0 / 9.0);
        let proj = camera.projection_matrix();
        assert!(proj.x_axis.x != 0.0);
        assert!(proj.y_axis.y != 0.0);
    }
}
