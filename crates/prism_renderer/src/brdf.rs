//! Local illumination models and the reflect/refract helpers.
//!
//! Both models return the diffuse and specular parts separately, already
//! multiplied by the cosine term but not by the light colour.

use std::f32::consts::PI;

use prism_core::{Color, Material};
use prism_math::Vec3;

/// Keeps the Cook-Torrance denominator away from zero at grazing angles.
const SPECULAR_DENOM_EPSILON: f32 = 1e-6;

/// Diffuse and specular contributions of one light.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BrdfTerms {
    pub diffuse: Color,
    pub specular: Color,
}

impl BrdfTerms {
    pub fn total(&self) -> Color {
        self.diffuse + self.specular
    }
}

/// Lambert diffuse plus a Phong highlight.
///
/// `n_dot_l` is the cosine between the shading normal and the light vector,
/// `r_dot_l` between the mirror direction of the view ray and the light vector.
pub fn phong(material: &Material, n_dot_l: f32, r_dot_l: f32) -> BrdfTerms {
    if n_dot_l <= 0.0 {
        return BrdfTerms::default();
    }

    let specular = if material.shine > 0.0 && r_dot_l > 0.0 {
        material.specular * r_dot_l.powf(material.shine)
    } else {
        Color::ZERO
    };

    BrdfTerms {
        diffuse: material.diffuse * n_dot_l,
        specular,
    }
}

/// Cook-Torrance microfacet model.
///
/// GGX (Trowbridge-Reitz) distribution, Smith-Schlick geometry and Schlick
/// Fresnel. `n`, `v` and `l` are unit vectors: the shading normal, the
/// direction toward the viewer and the direction toward the light.
pub fn cook_torrance(material: &Material, n: Vec3, v: Vec3, l: Vec3) -> BrdfTerms {
    let n_dot_l = n.dot(l);
    if n_dot_l <= 0.0 {
        return BrdfTerms::default();
    }

    let h = (v + l).try_normalize().unwrap_or(n);
    let n_dot_v = n.dot(v).max(0.0);
    let n_dot_h = n.dot(h).max(0.0);
    let v_dot_h = v.dot(h).max(0.0);

    let roughness = material.roughness.clamp(0.0, 1.0);
    let d = ggx_distribution(n_dot_h, roughness);
    let g = smith_schlick(n_dot_v, roughness) * smith_schlick(n_dot_l, roughness);
    let f = fresnel_schlick(material.f0(), v_dot_h);

    let specular = f * (d * g / (4.0 * n_dot_v * n_dot_l + SPECULAR_DENOM_EPSILON));
    let k_d = (Color::ONE - f) * (1.0 - material.metalness);
    let diffuse = k_d * material.diffuse / PI;

    BrdfTerms {
        diffuse: diffuse * n_dot_l,
        specular: specular * n_dot_l,
    }
}

/// Trowbridge-Reitz normal distribution with `alpha = roughness²`.
pub fn ggx_distribution(n_dot_h: f32, roughness: f32) -> f32 {
    let a = roughness * roughness;
    let a2 = a * a;
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    a2 / (PI * denom * denom).max(f32::MIN_POSITIVE)
}

/// Schlick approximation of the Smith masking term for one direction.
pub fn smith_schlick(n_dot_x: f32, roughness: f32) -> f32 {
    let k = (roughness + 1.0) * (roughness + 1.0) / 8.0;
    n_dot_x / (n_dot_x * (1.0 - k) + k)
}

/// Schlick's Fresnel approximation.
pub fn fresnel_schlick(f0: Color, cos_theta: f32) -> Color {
    f0 + (Color::ONE - f0) * (1.0 - cos_theta.clamp(0.0, 1.0)).powi(5)
}

/// Mirror `v` about the normal `n`.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract unit vector `v` through a surface with unit normal `n` facing it.
///
/// `eta` is n1 / n2. Returns `None` on total internal reflection.
pub fn refract(v: Vec3, n: Vec3, eta: f32) -> Option<Vec3> {
    let c1 = -n.dot(v);
    let discriminant = 1.0 - eta * eta * (1.0 - c1 * c1);
    if discriminant < 0.0 {
        return None;
    }
    (eta * v + (eta * c1 - discriminant.sqrt()) * n).try_normalize()
}
