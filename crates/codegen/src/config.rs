use serde::{Deserialize, Serialize};

use crate::error::CodegenError;

/// How channel length relates to its end-node positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LengthRule {
    /// `L² = dx² + dy²`
    #[default]
    Euclidean,
    /// `L = |dx| + |dy|`
    Manhattan,
}

/// Whether node positions are bounded by the chip extent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChipArea {
    #[default]
    Finite,
    Unbounded,
}

/// Swappable placement rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlacementConfig {
    pub length_rule: LengthRule,
    pub chip_area: ChipArea,
}

/// Options for the full microfluidic strategy set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SynthesisConfig {
    pub placement: PlacementConfig,
}

impl SynthesisConfig {
    pub fn from_json(text: &str) -> Result<Self, CodegenError> {
        serde_json::from_str(text)
            .map_err(|e| CodegenError::parameter("synthesisConfig", e.to_string()))
    }
}
