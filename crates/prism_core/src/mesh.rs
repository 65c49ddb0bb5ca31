//! Indexed triangle mesh shape.
//!
//! Triangles are found through a per-mesh [`Bvh`] and tested with the
//! Möller-Trumbore algorithm. When the mesh carries vertex normals, the
//! shading normal is interpolated barycentrically; otherwise the face normal
//! is used.

use crate::bvh::Bvh;
use crate::shape::{Shape, ShapeHit, HIT_EPSILON};
use prism_math::{Aabb, Ray, Vec3};

/// Determinants below this mean the ray is parallel to the triangle.
const PARALLEL_EPSILON: f32 = 1e-8;

/// A mesh of vertex positions, optional vertex normals and triangle indices.
///
/// Winding is counter-clockwise when seen from the side the face normal
/// points to.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    positions: Vec<Vec3>,
    normals: Option<Vec<Vec3>>,
    indices: Vec<u32>,
    bounds: Aabb,
    bvh: Bvh,
}

impl TriangleMesh {
    /// Create a mesh from positions and indices, optionally with normals.
    ///
    /// Triangles referencing missing vertices and a trailing partial triangle
    /// are dropped. Normals whose count doesn't match the positions are ignored.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>, normals: Option<Vec<Vec3>>) -> Self {
        let vertex_count = positions.len() as u32;
        let valid: Vec<u32> = indices
            .chunks_exact(3)
            .filter(|face| face.iter().all(|&i| i < vertex_count))
            .flatten()
            .copied()
            .collect();

        if valid.len() != indices.len() {
            log::warn!(
                "Dropped {} invalid mesh indices ({} triangles kept)",
                indices.len() - valid.len(),
                valid.len() / 3
            );
        }

        let normals = normals.filter(|n| {
            let matches = n.len() == positions.len();
            if !matches {
                log::warn!(
                    "Ignoring {} vertex normals for {} positions",
                    n.len(),
                    positions.len()
                );
            }
            matches
        });

        let mut mesh = Self {
            bounds: Aabb::from_point_cloud(positions.iter().copied()),
            positions,
            normals,
            indices: valid,
            bvh: Bvh::default(),
        };
        mesh.rebuild_bvh();
        mesh
    }

    /// Box mesh spanning `size`, centered at the origin, with flat per-face normals.
    pub fn cuboid(size: Vec3) -> Self {
        let h = size.abs() * 0.5;
        // (normal, u, v) with u × v = normal, so the corner order below is CCW.
        let faces = [
            (Vec3::X, Vec3::Y, Vec3::Z),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::Z, Vec3::X),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::Y, Vec3::X),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (n, u, v) in faces {
            let base = positions.len() as u32;
            let (c, u, v) = (n * h, u * h, v * h);
            positions.extend([c - u - v, c + u - v, c + u + v, c - u + v]);
            normals.extend([n; 4]);
            indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::new(positions, indices, Some(normals))
    }

    /// Flat grid in the XZ plane facing +Y, `width × depth`, centered at the origin.
    pub fn grid(width: f32, depth: f32, segments_x: u32, segments_z: u32) -> Self {
        let sx = segments_x.max(1);
        let sz = segments_z.max(1);
        let row = sx + 1;

        let mut positions = Vec::with_capacity(((sx + 1) * (sz + 1)) as usize);
        for j in 0..=sz {
            for i in 0..=sx {
                positions.push(Vec3::new(
                    width * (i as f32 / sx as f32 - 0.5),
                    0.0,
                    depth * (j as f32 / sz as f32 - 0.5),
                ));
            }
        }

        let mut indices = Vec::with_capacity((sx * sz * 6) as usize);
        for j in 0..sz {
            for i in 0..sx {
                let a = j * row + i;
                let b = a + 1;
                let c = a + row + 1;
                let d = a + row;
                indices.extend([a, c, b, a, d, c]);
            }
        }

        let normals = vec![Vec3::Y; positions.len()];
        Self::new(positions, indices, Some(normals))
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn normals(&self) -> Option<&[Vec3]> {
        self.normals.as_deref()
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Compute smooth vertex normals by averaging face normals.
    ///
    /// Replaces any existing normals. Vertices not used by any non-degenerate
    /// face get +Y.
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];

        for face in self.indices.chunks_exact(3) {
            let [p0, p1, p2] = [0, 1, 2].map(|k| self.positions[face[k] as usize]);
            // Area-weighted: the cross product is left unnormalized.
            let face_normal = (p1 - p0).cross(p2 - p0);
            for &i in face {
                normals[i as usize] += face_normal;
            }
        }

        for normal in &mut normals {
            *normal = normal.try_normalize().unwrap_or(Vec3::Y);
        }

        self.normals = Some(normals);
    }

    /// Builder variant of [`TriangleMesh::compute_normals`].
    pub fn with_computed_normals(mut self) -> Self {
        self.compute_normals();
        self
    }

    fn vertices(&self, triangle: usize) -> [Vec3; 3] {
        let base = triangle * 3;
        [0, 1, 2].map(|k| self.positions[self.indices[base + k] as usize])
    }

    fn rebuild_bvh(&mut self) {
        let bounds: Vec<Aabb> = (0..self.triangle_count())
            .map(|t| Aabb::from_point_cloud(self.vertices(t)))
            .collect();
        self.bvh = Bvh::build(&bounds);
    }

    /// Möller-Trumbore ray-triangle intersection. Returns the ray parameter.
    fn intersect_triangle(&self, ray: &Ray, triangle: usize) -> Option<f32> {
        let [v0, v1, v2] = self.vertices(triangle);
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        let h = ray.direction.cross(edge2);
        let a = edge1.dot(h);
        if a.abs() < PARALLEL_EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        Some(f * edge2.dot(q))
    }

    fn face_normal(&self, triangle: usize) -> Vec3 {
        let [v0, v1, v2] = self.vertices(triangle);
        (v1 - v0).cross(v2 - v0).try_normalize().unwrap_or(Vec3::Y)
    }

    /// Barycentric weights of `p` (assumed on the triangle's plane).
    fn barycentric(&self, triangle: usize, p: Vec3) -> Option<Vec3> {
        let [v0, v1, v2] = self.vertices(triangle);
        let e0 = v1 - v0;
        let e1 = v2 - v0;
        let ep = p - v0;

        let d00 = e0.dot(e0);
        let d01 = e0.dot(e1);
        let d11 = e1.dot(e1);
        let d20 = ep.dot(e0);
        let d21 = ep.dot(e1);
        let denom = d00 * d11 - d01 * d01;
        if denom.abs() < f32::EPSILON {
            return None;
        }

        let v = (d11 * d20 - d01 * d21) / denom;
        let w = (d00 * d21 - d01 * d20) / denom;
        Some(Vec3::new(1.0 - v - w, v, w))
    }
}

impl Shape for TriangleMesh {
    fn intersect(&self, ray: &Ray, hit: &mut ShapeHit) -> bool {
        let clipped = ray.with_range(ray.t_min, ray.t_max.min(hit.distance));
        let nearest = self.bvh.nearest(&clipped, |triangle, bound| {
            self.intersect_triangle(&clipped, triangle)
                .filter(|&t| t > HIT_EPSILON && t >= clipped.t_min && t < bound)
        });

        match nearest {
            Some((triangle, t)) if hit.accepts(ray, t) => {
                hit.distance = t;
                hit.triangle = Some(triangle as u32);
                true
            }
            _ => false,
        }
    }

    fn normal_at(&self, point: Vec3, triangle: Option<u32>) -> Vec3 {
        let Some(triangle) = triangle.map(|t| t as usize).filter(|&t| t < self.triangle_count()) else {
            return Vec3::Y;
        };

        let Some(normals) = &self.normals else {
            return self.face_normal(triangle);
        };

        let Some(weights) = self.barycentric(triangle, point) else {
            return self.face_normal(triangle);
        };

        let base = triangle * 3;
        let [n0, n1, n2] = [0, 1, 2].map(|k| normals[self.indices[base + k] as usize]);
        (n0 * weights.x + n1 * weights.y + n2 * weights.z)
            .try_normalize()
            .unwrap_or_else(|| self.face_normal(triangle))
    }

    fn bounds(&self) -> Aabb {
        self.bounds
    }

    fn name(&self) -> &'static str {
        "mesh"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cuboid::Cuboid;

    fn single_triangle(normals: Option<Vec<Vec3>>) -> TriangleMesh {
        TriangleMesh::new(
            vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![0, 1, 2],
            normals,
        )
    }

    #[test]
    fn test_triangle_hit_and_face_normal() {
        let mesh = single_triangle(None);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::NEG_Z);
        let mut hit = ShapeHit::default();

        assert!(mesh.intersect(&ray, &mut hit));
        assert!((hit.distance - 3.0).abs() < 1e-5);
        assert_eq!(hit.triangle, Some(0));
        assert!((mesh.normal_at(ray.at(hit.distance), hit.triangle) - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_triangle_miss() {
        let mesh = single_triangle(None);
        let ray = Ray::new(Vec3::new(2.0, 2.0, 3.0), Vec3::NEG_Z);
        let mut hit = ShapeHit::default();
        assert!(!mesh.intersect(&ray, &mut hit));
    }

    #[test]
    fn test_smooth_normal_interpolation() {
        let tilted = Vec3::new(1.0, 0.0, 1.0).normalize();
        let mesh = single_triangle(Some(vec![Vec3::Z, tilted, Vec3::Z]));

        // At vertex 1 the normal is exactly that vertex's normal.
        let n = mesh.normal_at(Vec3::new(1.0, -1.0, 0.0), Some(0));
        assert!((n - tilted).length() < 1e-4);

        // Away from vertex 1 it leans less.
        let n = mesh.normal_at(Vec3::new(-0.5, -0.5, 0.0), Some(0));
        assert!(n.x > 0.0 && n.x < tilted.x);
    }

    #[test]
    fn test_cuboid_mesh_matches_cuboid_shape() {
        let mesh = TriangleMesh::cuboid(Vec3::splat(2.0));
        let cuboid = Cuboid::new(Vec3::ONE);
        assert_eq!(mesh.triangle_count(), 12);

        let origins = [
            Vec3::new(0.3, 0.2, 5.0),
            Vec3::new(-5.0, 0.1, -0.4),
            Vec3::new(0.2, 6.0, 0.3),
            Vec3::new(0.1, -0.2, -7.0),
        ];
        for origin in origins {
            let ray = Ray::new(origin, -origin);
            let mut a = ShapeHit::default();
            let mut b = ShapeHit::default();
            assert!(mesh.intersect(&ray, &mut a));
            assert!(cuboid.intersect(&ray, &mut b));
            assert!((a.distance - b.distance).abs() < 1e-4);

            let p = ray.at(a.distance);
            let na = mesh.normal_at(p, a.triangle);
            let nb = cuboid.normal_at(p, None);
            assert!((na - nb).length() < 1e-4, "{na} vs {nb}");
        }
    }

    #[test]
    fn test_grid_faces_up() {
        let mut grid = TriangleMesh::grid(4.0, 4.0, 3, 2);
        assert_eq!(grid.triangle_count(), 12);

        grid.compute_normals();
        assert!(grid.normals().unwrap().iter().all(|n| (*n - Vec3::Y).length() < 1e-5));

        let ray = Ray::new(Vec3::new(0.7, 2.0, -1.1), Vec3::NEG_Y);
        let mut hit = ShapeHit::default();
        assert!(grid.intersect(&ray, &mut hit));
        assert!((hit.distance - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_invalid_indices_dropped() {
        let mesh = TriangleMesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2, 0, 1, 9, 2], None);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_empty_mesh_never_hits() {
        let mesh = TriangleMesh::new(Vec::new(), Vec::new(), None);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::NEG_Z);
        let mut hit = ShapeHit::default();
        assert!(!mesh.intersect(&ray, &mut hit));
        assert!(mesh.bounds().is_empty());
    }
}
