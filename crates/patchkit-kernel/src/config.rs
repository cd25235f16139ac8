//! Tessellation and material settings.

use patchkit_tessellate::{Highlight, MaterialId};
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};

/// Material slots the buffers reference by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialTable {
    /// Curve polylines and isoparms.
    pub wire: u32,
    /// Wire segments over active spans.
    pub wire_active: u32,
    /// Control hull edges.
    pub hull: u32,
    /// Hull edges touching a selected control point.
    pub hull_active: u32,
    /// Shaded surfaces.
    pub shaded: u32,
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self {
            wire: 0,
            wire_active: 1,
            hull: 2,
            hull_active: 3,
            shaded: 4,
        }
    }
}

impl MaterialTable {
    /// Materials for wire partitions.
    pub fn wire_highlight(&self) -> Highlight {
        Highlight {
            normal: MaterialId(self.wire),
            active: MaterialId(self.wire_active),
        }
    }

    /// Materials for hull partitions.
    pub fn hull_highlight(&self) -> Highlight {
        Highlight {
            normal: MaterialId(self.hull),
            active: MaterialId(self.hull_active),
        }
    }
}

/// Kernel settings.
///
/// Every field has a default, so a TOML file only needs the values it
/// overrides:
///
/// ```toml
/// samples_per_span = 8
///
/// [materials]
/// hull_active = 7
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Samples per knot span along each direction of curves and surfaces.
    pub samples_per_span: usize,
    /// Samples along each direction of a Bezier patch.
    pub bezier_samples: usize,
    /// Gap kept below the top of a knot domain when sampling.
    pub param_epsilon: f64,
    /// Finite-difference step for NURBS surface normals.
    pub normal_step: f64,
    /// Finite-difference step for Bezier patch normals.
    pub bezier_normal_step: f64,
    /// Material ids.
    pub materials: MaterialTable,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            samples_per_span: 5,
            bezier_samples: 10,
            param_epsilon: 1e-4,
            normal_step: 1e-4,
            bezier_normal_step: 1e-3,
            materials: MaterialTable::default(),
        }
    }
}

impl KernelConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| KernelError::InvalidConfig(e.to_string()))
    }

    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if self.samples_per_span < 1 {
            return Err(KernelError::InvalidConfig(
                "samples_per_span must be at least 1".into(),
            ));
        }
        if self.bezier_samples < 2 {
            return Err(KernelError::InvalidConfig(
                "bezier_samples must be at least 2".into(),
            ));
        }
        for (name, value) in [
            ("param_epsilon", self.param_epsilon),
            ("normal_step", self.normal_step),
            ("bezier_normal_step", self.bezier_normal_step),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(KernelError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Sample count along a direction with `points` control points of `degree`.
    pub fn samples_for(&self, points: usize, degree: usize) -> usize {
        self.samples_per_span * points.saturating_sub(degree) + 1
    }
}
