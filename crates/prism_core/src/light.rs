//! Point, directional and spot lights.

use crate::material::Color;
use prism_math::Vec3;

/// Distances are floored at this value before attenuation.
const MIN_DISTANCE: f32 = 1e-4;

/// Distance attenuation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Falloff {
    #[default]
    Constant,
    Linear,
    Quadratic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Omnidirectional light at the light position.
    Point,
    /// Parallel light travelling along `direction`; the position is ignored.
    Directional { direction: Vec3 },
    /// Cone of half angle `cutoff` (degrees) around `direction`.
    Spot {
        direction: Vec3,
        cutoff: f32,
        exponent: f32,
    },
}

/// Direction and distance from a surface point to a light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    /// Unit vector from the point toward the light
    pub direction: Vec3,
    /// Distance to the light, infinite for directional lights
    pub distance: f32,
    /// Angular attenuation in [0, 1] (spot cone), 1 for other kinds
    pub intensity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub name: String,
    pub kind: LightKind,
    pub position: Vec3,
    pub color: Color,
    pub falloff: Falloff,
    /// Points farther than this receive no light
    pub range: Option<f32>,
    pub enabled: bool,
}

impl Light {
    pub fn point(position: Vec3, color: Color) -> Self {
        Self {
            name: String::from("light"),
            kind: LightKind::Point,
            position,
            color,
            falloff: Falloff::Constant,
            range: None,
            enabled: true,
        }
    }

    pub fn directional(direction: Vec3, color: Color) -> Self {
        Self {
            kind: LightKind::Directional {
                direction: direction.try_normalize().unwrap_or(Vec3::NEG_Y),
            },
            ..Self::point(Vec3::ZERO, color)
        }
    }

    pub fn spot(position: Vec3, direction: Vec3, cutoff: f32, color: Color) -> Self {
        Self {
            kind: LightKind::Spot {
                direction: direction.try_normalize().unwrap_or(Vec3::NEG_Y),
                cutoff: cutoff.clamp(0.0, 90.0),
                exponent: 1.0,
            },
            ..Self::point(position, color)
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_falloff(mut self, falloff: Falloff) -> Self {
        self.falloff = falloff;
        self
    }

    pub fn with_range(mut self, range: f32) -> Self {
        self.range = Some(range.max(0.0));
        self
    }

    /// Direction and distance from `point` to the light.
    ///
    /// `None` when the light is off, the point is out of range, or it lies
    /// outside a spot cone.
    pub fn light_vector(&self, point: Vec3) -> Option<LightSample> {
        if !self.enabled {
            return None;
        }

        if let LightKind::Directional { direction } = self.kind {
            return Some(LightSample {
                direction: -direction,
                distance: f32::INFINITY,
                intensity: 1.0,
            });
        }

        let to_light = self.position - point;
        let distance = to_light.length();
        let direction = to_light.try_normalize()?;
        if self.range.is_some_and(|range| distance > range) {
            return None;
        }

        let intensity = match self.kind {
            LightKind::Spot {
                direction: axis,
                cutoff,
                exponent,
            } => {
                let cos_angle = (-direction).dot(axis);
                if cos_angle < cutoff.to_radians().cos() {
                    return None;
                }
                cos_angle.max(0.0).powf(exponent)
            }
            _ => 1.0,
        };

        Some(LightSample {
            direction,
            distance,
            intensity,
        })
    }

    /// Colour reaching a point at `distance`, after falloff.
    pub fn light_color(&self, distance: f32) -> Color {
        if matches!(self.kind, LightKind::Directional { .. }) {
            return self.color;
        }
        let d = distance.max(MIN_DISTANCE);
        match self.falloff {
            Falloff::Constant => self.color,
            Falloff::Linear => self.color / d,
            Falloff::Quadratic => self.color / (d * d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_light_vector() {
        let light = Light::point(Vec3::new(0.0, 5.0, 0.0), Color::ONE);
        let sample = light.light_vector(Vec3::new(0.0, 1.0, 0.0)).unwrap();

        assert!((sample.direction - Vec3::Y).length() < 1e-6);
        assert!((sample.distance - 4.0).abs() < 1e-6);
        assert_eq!(sample.intensity, 1.0);
    }

    #[test]
    fn test_falloff() {
        let light = Light::point(Vec3::ZERO, Color::ONE);
        assert_eq!(light.light_color(2.0), Color::ONE);

        let linear = light.clone().with_falloff(Falloff::Linear);
        assert_eq!(linear.light_color(2.0), Color::splat(0.5));

        let quadratic = light.with_falloff(Falloff::Quadratic);
        assert_eq!(quadratic.light_color(2.0), Color::splat(0.25));
        assert!(quadratic.light_color(0.0).is_finite());
    }

    #[test]
    fn test_disabled_and_out_of_range() {
        let mut light = Light::point(Vec3::ZERO, Color::ONE).with_range(3.0);
        assert!(light.light_vector(Vec3::new(0.0, 0.0, 2.0)).is_some());
        assert!(light.light_vector(Vec3::new(0.0, 0.0, 4.0)).is_none());

        light.enabled = false;
        assert!(light.light_vector(Vec3::new(0.0, 0.0, 2.0)).is_none());
    }

    #[test]
    fn test_directional_never_attenuates() {
        let light = Light::directional(Vec3::NEG_Y, Color::ONE).with_falloff(Falloff::Quadratic);
        let sample = light.light_vector(Vec3::new(100.0, 0.0, 0.0)).unwrap();

        assert_eq!(sample.direction, Vec3::Y);
        assert!(sample.distance.is_infinite());
        assert_eq!(light.light_color(sample.distance), Color::ONE);
    }

    #[test]
    fn test_spot_cone() {
        let light = Light::spot(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, 30.0, Color::ONE);

        let below = light.light_vector(Vec3::ZERO).unwrap();
        assert!((below.intensity - 1.0).abs() < 1e-6);

        // 45 degrees off axis is outside a 30 degree cone.
        assert!(light.light_vector(Vec3::new(5.0, 0.0, 0.0)).is_none());
    }
}
