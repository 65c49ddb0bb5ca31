// Transform utilities for Mat4
//
// Extends glam::Mat4 with the helpers the tracer needs for actor transforms.
// glam already provides transform_point3(), transform_vector3() and inverse().

use crate::Aabb;
use glam::{Mat3, Mat4};

/// Determinants below this magnitude are treated as singular.
const SINGULAR_EPSILON: f32 = 1e-12;

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;

    /// Inverse of the matrix, or `None` when it is singular or not finite.
    fn try_inverse(&self) -> Option<Mat4>;

    /// Inverse of the matrix, falling back to identity when singular.
    fn inverse_or_identity(&self) -> Mat4;

    /// Transpose of the inverse of the upper 3x3 block.
    ///
    /// Maps local normals to world space correctly under non-uniform scale.
    fn normal_matrix(&self) -> Mat3;
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::EMPTY;
        }
        Aabb::from_point_cloud(aabb.corners().iter().map(|&c| self.transform_point3(c)))
    }

    fn try_inverse(&self) -> Option<Mat4> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
            return None;
        }
        let inverse = self.inverse();
        inverse.is_finite().then_some(inverse)
    }

    fn inverse_or_identity(&self) -> Mat4 {
        self.try_inverse().unwrap_or_else(|| {
            log::warn!("Singular transform, falling back to identity");
            Mat4::IDENTITY
        })
    }

    fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(self.inverse_or_identity()).transpose()
    }
}
