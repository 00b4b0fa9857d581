//! Recency decay of document scores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FathomError, Result};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Attenuates scores by document age.
///
/// A document `age` days old keeps
/// `floor + (1 - floor) * 2^(-exponent * age / half_life_days)` of its score:
/// exactly half of the decaying share after one half-life (with exponent 1),
/// approaching but never reaching `floor`. Documents from the future count as
/// age zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecencyDecay {
    pub half_life_days: f64,
    #[serde(default = "default_exponent")]
    pub exponent: f64,
    #[serde(default)]
    pub floor: f64,
    /// Reference time ages are measured from; the query time when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
}

fn default_exponent() -> f64 {
    1.0
}

impl RecencyDecay {
    pub fn new(half_life_days: f64) -> Self {
        RecencyDecay {
            half_life_days,
            exponent: 1.0,
            floor: 0.0,
            as_of: None,
        }
    }

    pub fn with_exponent(mut self, exponent: f64) -> Self {
        self.exponent = exponent;
        self
    }

    pub fn with_floor(mut self, floor: f64) -> Self {
        self.floor = floor;
        self
    }

    pub fn as_of(mut self, reference: DateTime<Utc>) -> Self {
        self.as_of = Some(reference);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.half_life_days.is_finite() || self.half_life_days <= 0.0 {
            return Err(FathomError::query(format!(
                "recency half-life must be positive, got {}",
                self.half_life_days
            )));
        }
        if !self.exponent.is_finite() || self.exponent < 0.0 {
            return Err(FathomError::query(format!(
                "recency exponent must be non-negative, got {}",
                self.exponent
            )));
        }
        if !(0.0..=1.0).contains(&self.floor) {
            return Err(FathomError::query(format!(
                "recency floor must be within [0, 1], got {}",
                self.floor
            )));
        }
        Ok(())
    }

    /// Multiplier for a document of the given age in days.
    pub fn factor(&self, age_days: f64) -> f64 {
        let age = age_days.max(0.0);
        let decayed = (-self.exponent * age / self.half_life_days).exp2();
        self.floor + (1.0 - self.floor) * decayed
    }

    /// Multiplier for a document stamped `timestamp`, measured from `now`
    /// unless a reference time is configured.
    pub fn factor_at(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let reference = self.as_of.unwrap_or(now);
        let age = (reference - timestamp).num_seconds() as f64 / SECONDS_PER_DAY;
        self.factor(age)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_half_life() {
        let decay = RecencyDecay::new(10.0);
        assert_eq!(decay.factor(0.0), 1.0);
        assert!((decay.factor(10.0) - 0.5).abs() < 1e-12);
        assert!((decay.factor(20.0) - 0.25).abs() < 1e-12);
        assert_eq!(decay.factor(-5.0), 1.0);
    }

    #[test]
    fn test_floor_and_exponent() {
        let decay = RecencyDecay::new(10.0).with_floor(0.2).with_exponent(2.0);
        assert!((decay.factor(10.0) - (0.2 + 0.8 * 0.25)).abs() < 1e-12);
        assert!(decay.factor(10_000.0) >= 0.2);
    }

    #[test]
    fn test_factor_at_uses_reference() {
        let now = Utc::now();
        let decay = RecencyDecay::new(1.0).as_of(now);
        let stamp = now - Duration::days(1);
        assert!((decay.factor_at(stamp, now + Duration::days(30)) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_validate() {
        assert!(RecencyDecay::new(0.0).validate().is_err());
        assert!(RecencyDecay::new(7.0).with_floor(1.5).validate().is_err());
        assert!(RecencyDecay::new(7.0).validate().is_ok());
    }
}
