//! Pixel to primary ray mapping.

use prism_math::{Camera, ProjectionType, Ray, Vec3};

/// Maps image coordinates to world-space primary rays for one camera and
/// image size.
///
/// Pixel `(i, j)` covers `[i, i + 1] × [j, j + 1]`; row 0 is the top of the
/// image. The view window keeps the camera's window height along the
/// shorter image side.
#[derive(Debug, Clone)]
pub struct ViewMapper {
    position: Vec3,
    u: Vec3,
    v: Vec3,
    n: Vec3,
    window_width: f32,
    window_height: f32,
    inv_width: f32,
    inv_height: f32,
    near: f32,
    t_min: f32,
    t_max: f32,
    projection: ProjectionType,
}

impl ViewMapper {
    pub fn new(camera: &Camera, width: u32, height: u32) -> Self {
        let m = camera.camera_to_world_matrix();
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);

        let wh = camera.window_height();
        let (window_width, window_height) = if w >= h {
            (wh * w / h, wh)
        } else {
            (wh, wh * h / w)
        };

        let (near, far) = camera.clipping_planes();
        let t_max = match camera.projection_type() {
            // Distance from the camera to a back corner of the frustum.
            ProjectionType::Perspective => {
                let z = far / near * 0.5;
                Vec3::new(window_width * z, window_height * z, far).length()
            }
            ProjectionType::Parallel => far,
        };

        Self {
            position: camera.position(),
            u: m.x_axis.truncate(),
            v: m.y_axis.truncate(),
            n: m.z_axis.truncate(),
            window_width,
            window_height,
            inv_width: 1.0 / w,
            inv_height: 1.0 / h,
            near,
            t_min: near,
            t_max,
            projection: camera.projection_type(),
        }
    }

    /// View window size in world units.
    pub fn window_size(&self) -> (f32, f32) {
        (self.window_width, self.window_height)
    }

    /// Point on the view window (relative to the camera) for image coordinates.
    pub fn image_to_window(&self, x: f32, y: f32) -> Vec3 {
        self.window_width * (x * self.inv_width - 0.5) * self.u
            + self.window_height * (0.5 - y * self.inv_height) * self.v
    }

    /// Primary ray through image coordinates `(x, y)`.
    pub fn pixel_ray(&self, x: f32, y: f32) -> Ray {
        let p = self.image_to_window(x, y);
        let ray = match self.projection {
            ProjectionType::Perspective => Ray::new(self.position, p - self.near * self.n),
            ProjectionType::Parallel => Ray::new(self.position + p, -self.n),
        };
        ray.with_range(self.t_min, self.t_max)
    }

    /// Primary ray through the centre of pixel `(i, j)`.
    pub fn pixel_center_ray(&self, i: u32, j: u32) -> Ray {
        self.pixel_ray(i as f32 + 0.5, j as f32 + 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 1.0);
        camera.set_view_angle(90.0);
        camera.set_clipping_planes(1.0, 100.0);
        camera
    }

    #[test]
    fn test_center_ray_looks_forward() {
        let mapper = ViewMapper::new(&camera(), 100, 100);
        let ray = mapper.pixel_ray(50.0, 50.0);

        assert_eq!(ray.origin, Vec3::new(0.0, 0.0, 5.0));
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-6);
        assert_eq!(ray.t_min, 1.0);
        assert!(ray.t_max > 100.0);
    }

    #[test]
    fn test_row_zero_is_top() {
        let mapper = ViewMapper::new(&camera(), 100, 100);
        assert!(mapper.pixel_ray(50.0, 0.0).direction.y > 0.0);
        assert!(mapper.pixel_ray(50.0, 100.0).direction.y < 0.0);
        assert!(mapper.pixel_ray(0.0, 50.0).direction.x < 0.0);
    }

    #[test]
    fn test_perspective_corner_angle() {
        // 90 degree view, square image: the top edge is 45 degrees up.
        let mapper = ViewMapper::new(&camera(), 64, 64);
        let d = mapper.pixel_ray(32.0, 0.0).direction;
        assert!((d.y - (-d.z)).abs() < 1e-5);
    }

    #[test]
    fn test_window_follows_image_aspect() {
        let mapper = ViewMapper::new(&camera(), 200, 100);
        let (w, h) = mapper.window_size();
        assert!((h - 2.0).abs() < 1e-5);
        assert!((w - 4.0).abs() < 1e-5);

        let mapper = ViewMapper::new(&camera(), 100, 200);
        let (w, h) = mapper.window_size();
        assert!((w - 2.0).abs() < 1e-5);
        assert!((h - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_parallel_rays_share_direction() {
        let mut camera = camera();
        camera.set_projection_type(ProjectionType::Parallel);
        camera.set_parallel_height(4.0);
        let mapper = ViewMapper::new(&camera, 100, 100);

        let a = mapper.pixel_ray(0.0, 0.0);
        let b = mapper.pixel_ray(100.0, 100.0);
        assert!((a.direction - Vec3::NEG_Z).length() < 1e-6);
        assert!((b.direction - a.direction).length() < 1e-6);
        assert!((a.origin - Vec3::new(-2.0, 2.0, 5.0)).length() < 1e-5);
        assert_eq!(a.t_max, 100.0);
    }
}
