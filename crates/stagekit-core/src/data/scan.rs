//! Scan parameters
//!
//! [`ScanForm`] holds the raw user input; [`ScanForm::validate`] turns it
//! into a [`ScanRequest`] whose numeric fields are all finite and
//! non-negative.

use crate::error::AcquisitionError;
use serde::{Deserialize, Serialize};

/// Raw scan parameters as entered by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanForm {
    /// Exposure / dwell time in seconds
    pub exposure: String,
    /// Grid count along X
    pub nx: u32,
    /// Grid count along Y
    pub ny: u32,
    /// Step size along X
    pub rx: String,
    /// Step size along Y
    pub ry: String,
    /// Selected objective index, if any
    pub objective: Option<usize>,
}

impl ScanForm {
    /// Parse and validate the form
    pub fn validate(&self) -> Result<ScanRequest, AcquisitionError> {
        Ok(ScanRequest {
            exposure: parse_non_negative("exposure", &self.exposure)?,
            nx: self.nx,
            ny: self.ny,
            rx: parse_non_negative("rx", &self.rx)?,
            ry: parse_non_negative("ry", &self.ry)?,
            objective: self.objective,
        })
    }
}

fn parse_non_negative(field: &str, text: &str) -> Result<f64, AcquisitionError> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| AcquisitionError::InvalidParameter {
            field: field.to_string(),
            reason: format!("'{}' is not a number", text.trim()),
        })?;
    check_non_negative(field, value)
}

fn check_non_negative(field: &str, value: f64) -> Result<f64, AcquisitionError> {
    if !value.is_finite() {
        return Err(AcquisitionError::InvalidParameter {
            field: field.to_string(),
            reason: "must be finite".to_string(),
        });
    }
    if value < 0.0 {
        return Err(AcquisitionError::InvalidParameter {
            field: field.to_string(),
            reason: format!("{} is negative", value),
        });
    }
    Ok(value)
}

/// Validated scan parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Exposure / dwell time in seconds
    pub exposure: f64,
    /// Grid count along X
    pub nx: u32,
    /// Grid count along Y
    pub ny: u32,
    /// Step size along X
    pub rx: f64,
    /// Step size along Y
    pub ry: f64,
    /// Selected objective index, if any
    pub objective: Option<usize>,
}

impl ScanRequest {
    /// Build a request from already-numeric values
    pub fn new(
        exposure: f64,
        nx: u32,
        ny: u32,
        rx: f64,
        ry: f64,
        objective: Option<usize>,
    ) -> Result<Self, AcquisitionError> {
        Ok(Self {
            exposure: check_non_negative("exposure", exposure)?,
            nx,
            ny,
            rx: check_non_negative("rx", rx)?,
            ry: check_non_negative("ry", ry)?,
            objective,
        })
    }

    /// X coordinate of the first grid point: `-Nx * Rx / 2`
    pub fn x_offset(&self) -> f64 {
        -(self.nx as f64) * self.rx / 2.0
    }

    /// Y coordinate of the first grid point: `-Ny * Ry / 2`
    pub fn y_offset(&self) -> f64 {
        -(self.ny as f64) * self.ry / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(exposure: &str, rx: &str, ry: &str) -> ScanForm {
        ScanForm {
            exposure: exposure.to_string(),
            nx: 3,
            ny: 2,
            rx: rx.to_string(),
            ry: ry.to_string(),
            objective: Some(0),
        }
    }

    #[test]
    fn test_validate_parses_fields() {
        let request = form(" 0.5 ", "0.1", "0.2").validate().unwrap();
        assert_eq!(request.exposure, 0.5);
        assert_eq!(request.nx, 3);
        assert_eq!(request.ry, 0.2);
        assert_eq!(request.objective, Some(0));
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let err = form("abc", "0.1", "0.2").validate().unwrap_err();
        assert_eq!(
            err,
            AcquisitionError::InvalidParameter {
                field: "exposure".to_string(),
                reason: "'abc' is not a number".to_string(),
            }
        );
    }

    #[test]
    fn test_validate_rejects_negative_and_non_finite() {
        let err = form("0.5", "-0.1", "0.2").validate().unwrap_err();
        assert!(matches!(err, AcquisitionError::InvalidParameter { ref field, .. } if field == "rx"));

        let err = form("0.5", "0.1", "inf").validate().unwrap_err();
        assert!(matches!(err, AcquisitionError::InvalidParameter { ref field, .. } if field == "ry"));
    }

    #[test]
    fn test_offsets() {
        let request = ScanRequest::new(0.5, 3, 2, 0.1, 0.2, Some(0)).unwrap();
        assert!((request.x_offset() + 0.15).abs() < 1e-12);
        assert!((request.y_offset() + 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_zero_grid_is_valid() {
        let request = ScanRequest::new(0.0, 0, 0, 0.0, 0.0, None).unwrap();
        assert_eq!(request.x_offset(), 0.0);
    }
}
