use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::error::CodegenError;

/// Fabrication limits shared by every strategy in one run.
///
/// All values are finite and strictly positive; the crossing angle is in
/// radians and at most π/2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessParameters {
    min_node_distance: f64,
    min_channel_length: f64,
    max_chip_x: f64,
    max_chip_y: f64,
    critical_crossing_angle: f64,
}

impl ProcessParameters {
    pub fn new(
        min_node_distance: f64,
        min_channel_length: f64,
        max_chip_x: f64,
        max_chip_y: f64,
        critical_crossing_angle: f64,
    ) -> Result<Self, CodegenError> {
        let params = Self {
            min_node_distance,
            min_channel_length,
            max_chip_x,
            max_chip_y,
            critical_crossing_angle,
        };
        params.validate()?;
        Ok(params)
    }

    /// Parse camelCase JSON and validate.
    pub fn from_json(text: &str) -> Result<Self, CodegenError> {
        let params: Self = serde_json::from_str(text)
            .map_err(|e| CodegenError::parameter("processParameters", e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<(), CodegenError> {
        let fields = [
            ("minNodeDistance", self.min_node_distance),
            ("minChannelLength", self.min_channel_length),
            ("maxChipX", self.max_chip_x),
            ("maxChipY", self.max_chip_y),
            ("criticalCrossingAngle", self.critical_crossing_angle),
        ];
        for (name, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(CodegenError::parameter(
                    name,
                    format!("must be finite and positive, got {value}"),
                ));
            }
        }
        if self.critical_crossing_angle > FRAC_PI_2 {
            return Err(CodegenError::parameter(
                "criticalCrossingAngle",
                format!(
                    "must not exceed pi/2 radians, got {}",
                    self.critical_crossing_angle
                ),
            ));
        }
        Ok(())
    }

    pub fn min_node_distance(&self) -> f64 {
        self.min_node_distance
    }

    pub fn min_channel_length(&self) -> f64 {
        self.min_channel_length
    }

    pub fn max_chip_x(&self) -> f64 {
        self.max_chip_x
    }

    pub fn max_chip_y(&self) -> f64 {
        self.max_chip_y
    }

    pub fn critical_crossing_angle(&self) -> f64 {
        self.critical_crossing_angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_parameters() {
        let params = ProcessParameters::new(1e-4, 2e-4, 0.02, 0.01, 0.5).unwrap();
        assert_eq!(params.min_channel_length(), 2e-4);
        assert_eq!(params.critical_crossing_angle(), 0.5);
    }

    #[test]
    fn rejects_non_positive_and_non_finite() {
        assert_eq!(
            ProcessParameters::new(0.0, 1.0, 1.0, 1.0, 0.5),
            Err(CodegenError::parameter(
                "minNodeDistance",
                "must be finite and positive, got 0"
            ))
        );
        assert!(ProcessParameters::new(1.0, -1.0, 1.0, 1.0, 0.5).is_err());
        assert!(ProcessParameters::new(1.0, 1.0, f64::INFINITY, 1.0, 0.5).is_err());
        assert!(ProcessParameters::new(1.0, 1.0, 1.0, f64::NAN, 0.5).is_err());
    }

    #[test]
    fn rejects_obtuse_crossing_angle() {
        assert!(ProcessParameters::new(1.0, 1.0, 1.0, 1.0, FRAC_PI_2).is_ok());
        assert!(ProcessParameters::new(1.0, 1.0, 1.0, 1.0, 2.0).is_err());
    }

    #[test]
    fn loads_from_json() {
        let params = ProcessParameters::from_json(
            r#"{"minNodeDistance": 0.001, "minChannelLength": 0.002,
                "maxChipX": 0.05, "maxChipY": 0.03, "criticalCrossingAngle": 0.7}"#,
        )
        .unwrap();
        assert_eq!(params.max_chip_x(), 0.05);
        assert_eq!(params.max_chip_y(), 0.03);

        assert!(matches!(
            ProcessParameters::from_json(r#"{"minNodeDistance": 0.001}"#),
            Err(CodegenError::InvalidParameter { .. })
        ));
        assert!(matches!(
            ProcessParameters::from_json(
                r#"{"minNodeDistance": -1, "minChannelLength": 1,
                    "maxChipX": 1, "maxChipY": 1, "criticalCrossingAngle": 0.5}"#
            ),
            Err(CodegenError::InvalidParameter { .. })
        ));
    }
}
