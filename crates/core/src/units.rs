//! Unit names used by archive tables and the conversions between them.
//!
//! Only the handful of dimensions that exoplanet tables actually carry are
//! known here (time, angle, mass, radius). Anything else is treated as
//! opaque: equal names convert with factor 1, different names do not convert.

/// Legacy unit spellings found in older archive exports and their fixes.
const LEGACY_UNITS: &[(&str, &str)] = &[
    ("degrees", "deg"),
    ("days", "day"),
    ("hours", "hour"),
    ("jovMass", "jupiterMass"),
    ("mags", "mag"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    Time,
    Angle,
    Mass,
    Radius,
}

/// (name, dimension, size in the dimension's base unit)
const KNOWN_UNITS: &[(&str, Dimension, f64)] = &[
    // time, base = day
    ("d", Dimension::Time, 1.0),
    ("day", Dimension::Time, 1.0),
    ("h", Dimension::Time, 1.0 / 24.0),
    ("hour", Dimension::Time, 1.0 / 24.0),
    ("hr", Dimension::Time, 1.0 / 24.0),
    ("min", Dimension::Time, 1.0 / 1440.0),
    ("s", Dimension::Time, 1.0 / 86400.0),
    ("yr", Dimension::Time, 365.25),
    ("year", Dimension::Time, 365.25),
    // angle, base = degree
    ("deg", Dimension::Angle, 1.0),
    ("degree", Dimension::Angle, 1.0),
    ("arcmin", Dimension::Angle, 1.0 / 60.0),
    ("arcsec", Dimension::Angle, 1.0 / 3600.0),
    ("mas", Dimension::Angle, 1.0 / 3_600_000.0),
    ("rad", Dimension::Angle, 57.295_779_513_082_32),
    // mass, base = Jupiter mass
    ("jupiterMass", Dimension::Mass, 1.0),
    ("Mjup", Dimension::Mass, 1.0),
    ("earthMass", Dimension::Mass, 1.0 / 317.828),
    ("Mearth", Dimension::Mass, 1.0 / 317.828),
    ("solMass", Dimension::Mass, 1047.348_644),
    ("Msun", Dimension::Mass, 1047.348_644),
    // radius, base = Jupiter radius
    ("jupiterRad", Dimension::Radius, 1.0),
    ("Rjup", Dimension::Radius, 1.0),
    ("earthRad", Dimension::Radius, 1.0 / 11.209),
    ("Rearth", Dimension::Radius, 1.0 / 11.209),
    ("solRad", Dimension::Radius, 9.731),
    ("Rsun", Dimension::Radius, 9.731),
];

/// Replacement for a legacy unit spelling, if `unit` is one.
pub fn correct_unit(unit: &str) -> Option<&'static str> {
    LEGACY_UNITS
        .iter()
        .find(|(bad, _)| *bad == unit)
        .map(|(_, good)| *good)
}

fn lookup(unit: &str) -> Option<(Dimension, f64)> {
    let unit = correct_unit(unit).unwrap_or(unit);
    KNOWN_UNITS
        .iter()
        .find(|(name, _, _)| *name == unit)
        .map(|(_, dim, size)| (*dim, *size))
}

/// Factor that converts a value in `from` into `to`.
///
/// `None` when the units are unknown or of different dimensions.
pub fn conversion_factor(from: &str, to: &str) -> Option<f64> {
    if from == to {
        return Some(1.0);
    }
    let (from_dim, from_size) = lookup(from)?;
    let (to_dim, to_size) = lookup(to)?;
    if from_dim != to_dim {
        return None;
    }
    Some(from_size / to_size)
}

/// Whether two unit names denote the same unit.
pub fn same_unit(a: &str, b: &str) -> bool {
    a == b || conversion_factor(a, b) == Some(1.0)
}
