//! Power-consumption formulas for edges and antennas.
//!
//! These functions do no bound checking: callers pass non-negative finite
//! values. The editor session runs user input through
//! [`sanitize_parameter`] first.

use crate::model::AntennaSettings;

/// `base × capacity × distance`.
pub fn edge_consumption(base: f64, capacity: f64, distance: f64) -> f64 {
    base * capacity * distance
}

/// Consumption of one antenna of the given radius under `settings`.
///
/// - disabled: `0`
/// - radius-scaled: `consumptionBase × radius`
/// - otherwise: `consumptionBase`
pub fn antenna_consumption(settings: &AntennaSettings, radius: f64) -> f64 {
    if !settings.consumption_enabled {
        return 0.0;
    }
    if settings.consumption_radius_enabled {
        settings.consumption_base * radius
    } else {
        settings.consumption_base
    }
}

/// Coerce an editable numeric parameter: non-finite or negative input falls
/// back to `default`.
pub fn sanitize_parameter(value: f64, default: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(enabled: bool, radius_enabled: bool, base: f64) -> AntennaSettings {
        AntennaSettings {
            consumption_enabled: enabled,
            consumption_radius_enabled: radius_enabled,
            consumption_base: base,
        }
    }

    #[test]
    fn edge_formula() {
        assert_eq!(edge_consumption(100.0, 2.0, 3.0), 600.0);
        assert_eq!(edge_consumption(100.0, 0.0, 3.0), 0.0);
    }

    #[test]
    fn antenna_formula() {
        assert_eq!(antenna_consumption(&settings(false, true, 5.0), 10.0), 0.0);
        assert_eq!(antenna_consumption(&settings(true, true, 5.0), 10.0), 50.0);
        assert_eq!(antenna_consumption(&settings(true, false, 5.0), 10.0), 5.0);
    }

    #[test]
    fn sanitize_rejects_garbage() {
        assert_eq!(sanitize_parameter(f64::NAN, 1.0), 1.0);
        assert_eq!(sanitize_parameter(-3.0, 1.0), 1.0);
        assert_eq!(sanitize_parameter(f64::INFINITY, 100.0), 100.0);
        assert_eq!(sanitize_parameter(0.0, 1.0), 0.0);
        assert_eq!(sanitize_parameter(2.5, 1.0), 2.5);
    }
}
