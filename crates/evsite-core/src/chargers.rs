//! Charger mix configuration and power sizing.

use serde::Serialize;

use crate::CoreError;

/// Assumed power factor relating installed charger kW to connection kVA.
pub const POWER_FACTOR: f64 = 0.9;

/// Counts of charging points by class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChargerMix {
    pub fast: u32,
    pub rapid: u32,
    pub ultra: u32,
}

impl ChargerMix {
    /// Validates signed counts as they arrive from user input (CLI flags,
    /// spreadsheet cells) and converts them to unsigned counts.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NegativeChargerCount`] naming the first class
    /// with a negative count.
    pub fn new(fast: i64, rapid: i64, ultra: i64) -> Result<Self, CoreError> {
        let check = |class: &'static str, count: i64| -> Result<u32, CoreError> {
            u32::try_from(count).map_err(|_| CoreError::NegativeChargerCount { class, count })
        };
        Ok(Self {
            fast: check("fast", fast)?,
            rapid: check("rapid", rapid)?,
            ultra: check("ultra", ultra)?,
        })
    }

    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.fast + self.rapid + self.ultra
    }
}

/// Per-class charger power ratings in kW.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerRatings {
    pub fast_kw: f64,
    pub rapid_kw: f64,
    pub ultra_kw: f64,
}

impl PowerRatings {
    /// Validates caller-supplied ratings.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPowerRating`] if any rating is not a
    /// positive finite number.
    pub fn new(fast_kw: f64, rapid_kw: f64, ultra_kw: f64) -> Result<Self, CoreError> {
        let check = |class: &'static str, value: f64| -> Result<f64, CoreError> {
            if value.is_finite() && value > 0.0 {
                Ok(value)
            } else {
                Err(CoreError::InvalidPowerRating { class, value })
            }
        };
        Ok(Self {
            fast_kw: check("fast", fast_kw)?,
            rapid_kw: check("rapid", rapid_kw)?,
            ultra_kw: check("ultra", ultra_kw)?,
        })
    }
}

impl Default for PowerRatings {
    fn default() -> Self {
        Self {
            fast_kw: 22.0,
            rapid_kw: 60.0,
            ultra_kw: 150.0,
        }
    }
}

/// Full charger configuration for one site: the mix of points, their power
/// ratings, and an optional capacity margin applied on top of the computed
/// figure (1.0 means no margin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChargerConfig {
    pub mix: ChargerMix,
    pub ratings: PowerRatings,
    margin: f64,
}

impl ChargerConfig {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidMargin`] if `margin` is not a positive
    /// finite factor.
    pub fn new(mix: ChargerMix, ratings: PowerRatings, margin: f64) -> Result<Self, CoreError> {
        if !margin.is_finite() || margin <= 0.0 {
            return Err(CoreError::InvalidMargin(margin));
        }
        Ok(Self {
            mix,
            ratings,
            margin,
        })
    }

    /// Default ratings (22/60/150 kW) and no capacity margin.
    #[must_use]
    pub fn with_defaults(mix: ChargerMix) -> Self {
        Self {
            mix,
            ratings: PowerRatings::default(),
            margin: 1.0,
        }
    }

    #[must_use]
    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Total installed charger power in kW.
    #[must_use]
    pub fn total_kw(&self) -> f64 {
        f64::from(self.mix.fast) * self.ratings.fast_kw
            + f64::from(self.mix.rapid) * self.ratings.rapid_kw
            + f64::from(self.mix.ultra) * self.ratings.ultra_kw
    }

    /// Required connection capacity in kVA, rounded to two decimal places:
    /// `total_kw * margin / POWER_FACTOR`.
    ///
    /// Pure local computation with no failure mode — invalid inputs are
    /// unrepresentable by construction.
    #[must_use]
    pub fn required_kva(&self) -> f64 {
        let kva = self.total_kw() * self.margin / POWER_FACTOR;
        (kva * 100.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_rejects_negative_counts() {
        assert!(matches!(
            ChargerMix::new(-1, 0, 0),
            Err(CoreError::NegativeChargerCount { class: "fast", .. })
        ));
        assert!(matches!(
            ChargerMix::new(0, -3, 0),
            Err(CoreError::NegativeChargerCount { class: "rapid", .. })
        ));
        assert!(matches!(
            ChargerMix::new(0, 0, -1),
            Err(CoreError::NegativeChargerCount { class: "ultra", .. })
        ));
    }

    #[test]
    fn mix_accepts_zero_counts() {
        let mix = ChargerMix::new(0, 0, 0).unwrap();
        assert_eq!(mix.total_points(), 0);
    }

    #[test]
    fn ratings_reject_non_positive_values() {
        assert!(PowerRatings::new(0.0, 60.0, 150.0).is_err());
        assert!(PowerRatings::new(22.0, -60.0, 150.0).is_err());
        assert!(PowerRatings::new(22.0, 60.0, f64::NAN).is_err());
    }

    #[test]
    fn config_rejects_invalid_margin() {
        let mix = ChargerMix::new(1, 0, 0).unwrap();
        assert!(matches!(
            ChargerConfig::new(mix, PowerRatings::default(), 0.0),
            Err(CoreError::InvalidMargin(_))
        ));
        assert!(ChargerConfig::new(mix, PowerRatings::default(), f64::NAN).is_err());
    }

    #[test]
    fn required_kva_matches_worked_example() {
        // 2 fast + 1 rapid + 1 ultra at default ratings:
        // 2*22 + 60 + 150 = 254 kW, 254 / 0.9 = 282.222... -> 282.22
        let mix = ChargerMix::new(2, 1, 1).unwrap();
        let config = ChargerConfig::with_defaults(mix);
        assert!((config.total_kw() - 254.0).abs() < 1e-9);
        assert!((config.required_kva() - 282.22).abs() < 1e-9);
    }

    #[test]
    fn required_kva_is_zero_for_empty_site() {
        let config = ChargerConfig::with_defaults(ChargerMix::new(0, 0, 0).unwrap());
        assert!((config.required_kva() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn margin_scales_required_kva() {
        let mix = ChargerMix::new(2, 1, 1).unwrap();
        let with_margin = ChargerConfig::new(mix, PowerRatings::default(), 1.1).unwrap();
        // 254 * 1.1 / 0.9 = 310.444... -> 310.44
        assert!((with_margin.required_kva() - 310.44).abs() < 1e-9);
    }

    #[test]
    fn custom_ratings_feed_the_formula() {
        let mix = ChargerMix::new(4, 0, 0).unwrap();
        let ratings = PowerRatings::new(7.4, 50.0, 350.0).unwrap();
        let config = ChargerConfig::new(mix, ratings, 1.0).unwrap();
        // 4 * 7.4 = 29.6 kW, / 0.9 = 32.888... -> 32.89
        assert!((config.required_kva() - 32.89).abs() < 1e-9);
    }
}
