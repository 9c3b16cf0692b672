// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Unit conversion table backing the `convert.unit(from, to)` helper (spec.md
//! §4.2). Every unit converts to a base unit per dimension; the factor
//! between two units is the ratio of their base factors. An unknown unit, or
//! a pair spanning two dimensions, has no defined conversion and falls back
//! to a factor of `1.0`.

/// Returns the multiplier to convert a quantity from `from` to `to`.
/// Unknown units or cross-dimension pairs yield `1.0`.
pub fn unit_factor(from: &str, to: &str) -> f64 {
    if from.eq_ignore_ascii_case(to) {
        return 1.0;
    }
    match (base_factor(from), base_factor(to)) {
        (Some((from_dim, from_factor)), Some((to_dim, to_factor))) if from_dim == to_dim => {
            from_factor / to_factor
        }
        _ => 1.0,
    }
}

/// `(dimension, factor-to-base-unit)` for each known unit.
fn base_factor(unit: &str) -> Option<(&'static str, f64)> {
    Some(match unit.to_ascii_lowercase().as_str() {
        // Length, base = meters.
        "mm" | "millimeter" | "millimeters" => ("length", 0.001),
        "cm" | "centimeter" | "centimeters" => ("length", 0.01),
        "m" | "meter" | "meters" => ("length", 1.0),
        "km" | "kilometer" | "kilometers" => ("length", 1_000.0),
        "in" | "inch" | "inches" => ("length", 0.0254),
        "ft" | "foot" | "feet" => ("length", 0.3048),
        "yd" | "yard" | "yards" => ("length", 0.9144),
        "mi" | "mile" | "miles" => ("length", 1_609.344),

        // Mass, base = grams.
        "mg" | "milligram" | "milligrams" => ("mass", 0.001),
        "g" | "gram" | "grams" => ("mass", 1.0),
        "kg" | "kilogram" | "kilograms" => ("mass", 1_000.0),
        "lb" | "lbs" | "pound" | "pounds" => ("mass", 453.592_37),
        "oz" | "ounce" | "ounces" => ("mass", 28.349_523_125),

        // Volume, base = liters.
        "ml" | "milliliter" | "milliliters" => ("volume", 0.001),
        "l" | "liter" | "liters" => ("volume", 1.0),
        "gal" | "gallon" | "gallons" => ("volume", 3.785_411_784),

        // Time, base = seconds.
        "ms" | "millisecond" | "milliseconds" => ("time", 0.001),
        "s" | "sec" | "second" | "seconds" => ("time", 1.0),
        "min" | "minute" | "minutes" => ("time", 60.0),
        "h" | "hr" | "hour" | "hours" => ("time", 3_600.0),
        "d" | "day" | "days" => ("time", 86_400.0),

        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_unit_is_identity() {
        assert_eq!(unit_factor("kg", "kg"), 1.0);
    }

    #[test]
    fn converts_within_dimension() {
        assert!((unit_factor("km", "m") - 1000.0).abs() < 1e-9);
        assert!((unit_factor("kg", "g") - 1000.0).abs() < 1e-9);
        assert!((unit_factor("h", "min") - 60.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_pair_defaults_to_one() {
        assert_eq!(unit_factor("kg", "m"), 1.0);
        assert_eq!(unit_factor("parsecs", "m"), 1.0);
    }
}
