//! Angle, grid and scale helpers shared by the geometry primitives

use std::f64::consts::PI;

/// Convert degrees to radians, wrapping the input into (-360, 360) first
pub fn to_rad(deg: f64) -> f64 {
    (deg % 360.0) * PI / 180.0
}

/// Convert degrees to radians without wrapping
pub fn to_rad_unbounded(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// Convert radians to degrees, wrapped into (-360, 360)
pub fn to_deg(rad: f64) -> f64 {
    (180.0 * rad / PI) % 360.0
}

/// Wrap an angle in degrees into [0, 360]
///
/// Negative multiples of 360 map to 360 rather than 0.
pub fn normalize_angle(angle: f64) -> f64 {
    (angle % 360.0) + if angle < 0.0 { 360.0 } else { 0.0 }
}

/// Snap a value to the nearest multiple of `grid_size`
pub fn snap_to_grid(value: f64, grid_size: f64) -> f64 {
    grid_size * round_half_up(value / grid_size)
}

/// Map `value` from the `domain` interval onto the `range` interval
///
/// A degenerate domain yields 0.
pub fn linear_scale(domain: (f64, f64), range: (f64, f64), value: f64) -> f64 {
    let domain_span = domain.1 - domain.0;
    if domain_span == 0.0 {
        return 0.0;
    }
    let range_span = range.1 - range.0;
    ((value - domain.0) / domain_span) * range_span + range.0
}

/// Round to the nearest integer with ties going towards positive infinity
pub(crate) fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Rounding factor for a decimal precision (number of fractional digits)
pub(crate) fn precision_factor(precision: u32) -> f64 {
    match precision {
        0 => 1.0,
        1 => 10.0,
        2 => 100.0,
        3 => 1000.0,
        p => 10f64.powi(p as i32),
    }
}

/// Round a value to `precision` fractional digits
pub(crate) fn round_to(value: f64, precision: u32) -> f64 {
    let f = precision_factor(precision);
    round_half_up(value * f) / f
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_normalize_angle() {
        assert_eq!(normalize_angle(90.0), 90.0);
        assert_eq!(normalize_angle(-90.0), 270.0);
        assert_eq!(normalize_angle(450.0), 90.0);
        assert_eq!(normalize_angle(-360.0), 360.0);
    }

    #[test]
    fn test_to_rad_wraps_full_turns() {
        assert!(approx_eq(to_rad(180.0), PI));
        assert!(approx_eq(to_rad(540.0), PI));
        assert!(approx_eq(to_rad_unbounded(540.0), 3.0 * PI));
    }

    #[test]
    fn test_to_deg() {
        assert!(approx_eq(to_deg(PI / 2.0), 90.0));
        assert!(approx_eq(to_deg(-PI / 2.0), -90.0));
    }

    #[test]
    fn test_snap_to_grid() {
        assert_eq!(snap_to_grid(14.0, 10.0), 10.0);
        assert_eq!(snap_to_grid(15.0, 10.0), 20.0);
        assert_eq!(snap_to_grid(-15.0, 10.0), -10.0);
    }

    #[test]
    fn test_linear_scale() {
        assert_eq!(linear_scale((0.0, 10.0), (0.0, 100.0), 5.0), 50.0);
        assert_eq!(linear_scale((0.0, 10.0), (100.0, 0.0), 2.5), 75.0);
    }

    #[test]
    fn test_linear_scale_degenerate_domain() {
        // the value sits off the single-point domain, so the quotient is not NaN
        assert_eq!(linear_scale((0.0, 0.0), (0.0, 100.0), 5.0), 0.0);
        assert_eq!(linear_scale((3.0, 3.0), (0.0, 100.0), 3.0), 0.0);
        assert_eq!(linear_scale((3.0, 3.0), (10.0, 20.0), -7.0), 0.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.2345, 2), 1.23);
        assert_eq!(round_to(-2.5, 0), -2.0);
        assert_eq!(round_to(2.5, 0), 3.0);
    }
}
