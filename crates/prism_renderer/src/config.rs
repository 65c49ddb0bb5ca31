//! Render configuration.
//!
//! All fields have defaults, so a JSON file only needs the values it wants
//! to change. Out-of-range values are clamped (with a warning) rather than
//! rejected.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Upper bound for the recursion depth.
pub const MAX_RECURSION_LEVEL: u32 = 20;

/// Upper bound for adaptive subdivision (16×16 sub-cells per pixel).
pub const MAX_SUBDIVISION_LEVEL: u32 = 4;

/// Smallest accepted ray weight cut-off.
pub const MIN_WEIGHT_FLOOR: f32 = 0.001;

/// How shadow rays treat transparent surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowPolicy {
    /// Transparent surfaces cast no shadow. The shadow ray passes them
    /// untinted and unrefracted and keeps looking for an opaque occluder.
    #[default]
    SkipTransparent,
    /// Every surface blocks light.
    AllOpaque,
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Maximum reflection/refraction depth (0 = direct lighting only)
    pub max_recursion_level: u32,
    /// Branches whose accumulated weight falls to this value stop recursing
    pub min_weight: f32,
    /// Maximum per-channel corner deviation before a cell is subdivided
    pub adaptive_threshold: f32,
    /// Adaptive supersampling depth; 0 shoots one ray through each pixel centre
    pub max_subdivision_level: u32,
    /// Jitter pixel corners by up to 1/8 pixel
    pub use_jitter: bool,
    /// Index of refraction of the medium the camera sits in
    pub scene_ior: f32,
    pub shadow_policy: ShadowPolicy,
    /// Worker count; `None` uses the hardware concurrency
    pub threads: Option<usize>,
    /// Seed mixed with each pixel corner position to derive its jitter
    pub jitter_seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_recursion_level: 6,
            min_weight: MIN_WEIGHT_FLOOR,
            adaptive_threshold: 0.1,
            max_subdivision_level: 0,
            use_jitter: false,
            scene_ior: 1.0,
            shadow_policy: ShadowPolicy::SkipTransparent,
            threads: None,
            jitter_seed: 0,
        }
    }
}

impl RenderConfig {
    /// Parse a configuration from JSON, then clamp it into range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.check_finite()?;
        Ok(config.sanitized())
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Clamp every field into its valid range, warning about each change.
    pub fn sanitized(mut self) -> Self {
        if self.max_recursion_level > MAX_RECURSION_LEVEL {
            log::warn!(
                "max_recursion_level {} clamped to {}",
                self.max_recursion_level,
                MAX_RECURSION_LEVEL
            );
            self.max_recursion_level = MAX_RECURSION_LEVEL;
        }
        if self.min_weight.is_nan() || self.min_weight < MIN_WEIGHT_FLOOR {
            log::warn!("min_weight {} raised to {}", self.min_weight, MIN_WEIGHT_FLOOR);
            self.min_weight = MIN_WEIGHT_FLOOR;
        }
        let threshold = self.adaptive_threshold.clamp(0.0, 1.0);
        if threshold != self.adaptive_threshold {
            log::warn!("adaptive_threshold {} clamped to {}", self.adaptive_threshold, threshold);
            self.adaptive_threshold = threshold;
        }
        if self.max_subdivision_level > MAX_SUBDIVISION_LEVEL {
            log::warn!(
                "max_subdivision_level {} clamped to {}",
                self.max_subdivision_level,
                MAX_SUBDIVISION_LEVEL
            );
            self.max_subdivision_level = MAX_SUBDIVISION_LEVEL;
        }
        if self.scene_ior.is_nan() || self.scene_ior < 1.0 {
            log::warn!("scene_ior {} raised to 1.0", self.scene_ior);
            self.scene_ior = 1.0;
        }
        if self.threads == Some(0) {
            log::warn!("threads = 0 replaced by hardware concurrency");
            self.threads = None;
        }
        self
    }

    fn check_finite(&self) -> Result<(), ConfigError> {
        let fields = [
            ("min_weight", self.min_weight),
            ("adaptive_threshold", self.adaptive_threshold),
            ("scene_ior", self.scene_ior),
        ];
        match fields.iter().find(|(_, value)| !value.is_finite()) {
            Some(&(field, _)) => Err(ConfigError::NonFinite { field }),
            None => Ok(()),
        }
    }

    pub fn with_max_recursion_level(mut self, level: u32) -> Self {
        self.max_recursion_level = level;
        self
    }

    pub fn with_min_weight(mut self, weight: f32) -> Self {
        self.min_weight = weight;
        self
    }

    /// Enable adaptive supersampling with the given depth and threshold.
    pub fn with_adaptive(mut self, level: u32, threshold: f32) -> Self {
        self.max_subdivision_level = level;
        self.adaptive_threshold = threshold;
        self
    }

    pub fn with_jitter(mut self, seed: u64) -> Self {
        self.use_jitter = true;
        self.jitter_seed = seed;
        self
    }

    pub fn with_scene_ior(mut self, ior: f32) -> Self {
        self.scene_ior = ior;
        self
    }

    pub fn with_shadow_policy(mut self, policy: ShadowPolicy) -> Self {
        self.shadow_policy = policy;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }
}
