//! Physical dimensions of zones and containers.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Smallest side length accepted for a new zone or container.
pub const MIN_DIMENSION: f64 = 0.1;

/// Width × height × length of a storage volume.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub length: f64,
}

impl ValueObject for Dimensions {}

impl Dimensions {
    pub const fn new(width: f64, height: f64, length: f64) -> Self {
        Self {
            width,
            height,
            length,
        }
    }

    /// `1×1×1`, used for containers that arrive without dimensions.
    pub const fn unit() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    /// Build from optional wire fields; `None` unless all three are present.
    pub fn from_optional(width: Option<f64>, height: Option<f64>, length: Option<f64>) -> Option<Self> {
        Some(Self::new(width?, height?, length?))
    }

    pub fn volume(&self) -> f64 {
        self.width * self.height * self.length
    }

    pub fn min_side(&self) -> f64 {
        self.width.min(self.height).min(self.length)
    }

    /// Each side halved, floored at [`MIN_DIMENSION`].
    pub fn halved(&self) -> Self {
        let half = |v: f64| (v / 2.0).max(MIN_DIMENSION);
        Self::new(half(self.width), half(self.height), half(self.length))
    }

    /// Reject non-finite values and sides below [`MIN_DIMENSION`].
    pub fn validate(&self) -> DomainResult<()> {
        let sides = [self.width, self.height, self.length];
        if sides.iter().any(|v| !v.is_finite()) {
            return Err(DomainError::validation("dimensions must be finite numbers"));
        }
        if self.min_side() < MIN_DIMENSION {
            return Err(DomainError::validation(format!(
                "every dimension must be at least {MIN_DIMENSION}"
            )));
        }
        Ok(())
    }

    /// Fails when any side exceeds the corresponding side of `parent`.
    pub fn ensure_fits_within(&self, parent: &Dimensions) -> DomainResult<()> {
        let checks = [
            ("width", self.width, parent.width),
            ("height", self.height, parent.height),
            ("length", self.length, parent.length),
        ];
        for (side, own, outer) in checks {
            if own > outer {
                return Err(DomainError::validation(format!(
                    "{side} {own} exceeds parent {side} {outer}"
                )));
            }
        }
        Ok(())
    }
}
