//! Surface materials for Whitted shading.
//!
//! One material type covers both the classic Phong model and the
//! Cook-Torrance microfacet model; [`Brdf`] selects which one lights it.
//! Materials are shared between actors through `Arc`.

use prism_math::Vec3;

/// Type alias for RGB color (linear space)
pub type Color = Vec3;

/// Fresnel reflectance at normal incidence for common dielectrics.
pub const DIELECTRIC_F0: f32 = 0.04;

/// Local illumination model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Brdf {
    /// Lambert diffuse plus a Phong highlight.
    #[default]
    Phong,
    /// Lambert diffuse plus a GGX / Smith-Schlick / Schlick specular lobe.
    CookTorrance,
}

/// Surface description.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Ambient reflectance, multiplied by the scene ambient light
    pub ambient: Color,
    /// Diffuse reflectance (Od)
    pub diffuse: Color,
    /// Specular reflectance (Os): Phong highlight colour or F0 tint
    pub specular: Color,
    /// Phong exponent. Zero disables the highlight.
    pub shine: f32,
    /// Microfacet roughness in [0, 1]
    pub roughness: f32,
    /// 0 = dielectric, 1 = metal
    pub metalness: f32,
    /// Mirror reflectance. Drives the reflection branch.
    pub reflectance: Color,
    /// Transmission colour. Drives the refraction branch.
    pub transparency: Color,
    /// Index of refraction, at least 1
    pub ior: f32,
    pub model: Brdf,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Color::splat(0.2),
            diffuse: Color::splat(0.8),
            specular: Color::ZERO,
            shine: 0.0,
            roughness: 0.5,
            metalness: 0.0,
            reflectance: Color::ZERO,
            transparency: Color::ZERO,
            ior: 1.0,
            model: Brdf::Phong,
        }
    }
}

impl Material {
    /// Phong material. The specular colour also acts as mirror reflectance.
    pub fn phong(diffuse: Color, specular: Color, shine: f32) -> Self {
        Self {
            ambient: diffuse * 0.2,
            diffuse,
            specular,
            shine: shine.max(0.0),
            reflectance: specular,
            ..Default::default()
        }
    }

    /// Plain diffuse material.
    pub fn matte(diffuse: Color) -> Self {
        Self::phong(diffuse, Color::ZERO, 0.0)
    }

    /// Cook-Torrance material.
    ///
    /// The BRDF scales diffuse by `1 - metalness`; a full metal stores no
    /// diffuse at all.
    pub fn pbr(base_color: Color, specular: Color, roughness: f32, metalness: f32) -> Self {
        let metalness = metalness.clamp(0.0, 1.0);
        let diffuse = if metalness >= 1.0 { Color::ZERO } else { base_color };
        let mut material = Self {
            ambient: diffuse * 0.2,
            diffuse,
            specular,
            roughness: roughness.clamp(0.0, 1.0),
            metalness,
            model: Brdf::CookTorrance,
            ..Default::default()
        };
        material.reflectance = material.f0() * (1.0 - material.roughness);
        material
    }

    /// Non-metallic Cook-Torrance material with the 0.04 F0 floor.
    pub fn dielectric(base_color: Color, roughness: f32) -> Self {
        Self::pbr(base_color, Color::splat(DIELECTRIC_F0), roughness, 0.0)
    }

    /// Clear glass: fully transparent with a weak mirror component.
    pub fn glass(ior: f32) -> Self {
        Self {
            ambient: Color::ZERO,
            diffuse: Color::ZERO,
            specular: Color::ONE,
            shine: 128.0,
            reflectance: Color::splat(0.1),
            transparency: Color::splat(0.9),
            ior: ior.max(1.0),
            ..Default::default()
        }
    }

    /// Perfect mirror tinted by `color`.
    pub fn mirror(color: Color) -> Self {
        Self {
            ambient: Color::ZERO,
            diffuse: Color::ZERO,
            specular: color,
            shine: 256.0,
            reflectance: color,
            ..Default::default()
        }
    }

    pub fn copper(roughness: f32) -> Self {
        Self::metal(Color::new(0.95, 0.64, 0.54), roughness)
    }

    pub fn aluminum(roughness: f32) -> Self {
        Self::metal(Color::new(0.91, 0.92, 0.92), roughness)
    }

    pub fn silver(roughness: f32) -> Self {
        Self::metal(Color::new(0.95, 0.93, 0.88), roughness)
    }

    pub fn titanium(roughness: f32) -> Self {
        Self::metal(Color::new(0.542, 0.497, 0.449), roughness)
    }

    pub fn gold(roughness: f32) -> Self {
        Self::metal(Color::new(1.0, 0.71, 0.29), roughness)
    }

    fn metal(f0: Color, roughness: f32) -> Self {
        Self::pbr(f0, f0, roughness, 1.0)
    }

    /// Builder: set the transmission colour and index of refraction.
    pub fn with_transparency(mut self, transparency: Color, ior: f32) -> Self {
        self.transparency = transparency;
        self.ior = ior.max(1.0);
        self
    }

    /// Builder: set the mirror reflectance.
    pub fn with_reflectance(mut self, reflectance: Color) -> Self {
        self.reflectance = reflectance;
        self
    }

    pub fn with_ambient(mut self, ambient: Color) -> Self {
        self.ambient = ambient;
        self
    }

    /// Fresnel reflectance at normal incidence.
    ///
    /// Interpolates from the dielectric floor toward `specular` by metalness.
    pub fn f0(&self) -> Color {
        Color::splat(DIELECTRIC_F0).lerp(self.specular, self.metalness)
    }

    pub fn is_transparent(&self) -> bool {
        is_non_black(self.transparency)
    }

    pub fn is_reflective(&self) -> bool {
        is_non_black(self.reflectance)
    }
}

/// True if any channel is positive.
#[inline]
pub fn is_non_black(c: Color) -> bool {
    c.max_element() > 0.0
}
