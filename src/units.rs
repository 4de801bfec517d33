use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

pub type Category = (&'static str, &'static [(&'static str, f64)]);

// Each factor is how many of the unit make up one base unit of its category.
// Order matters: a unit name is resolved in the first category that lists it.
pub static CONVERSIONS: [Category; 4] = [
    ("length", &[("m", 1.0), ("km", 0.001), ("cm", 100.0), ("mm", 1000.0), ("mi", 0.000621371), ("yd", 1.09361), ("ft", 3.28084), ("in", 39.3701)]),
    ("weight", &[("kg", 1.0), ("g", 1000.0), ("mg", 1000000.0), ("lb", 2.20462), ("oz", 35.274)]),
    ("volume", &[("l", 1.0), ("ml", 1000.0), ("gal", 0.264172), ("qt", 1.05669), ("pt", 2.11338), ("cup", 4.22675), ("fl oz", 33.814)]),
    ("data", &[("b", 1.0), ("B", 0.125), ("KB", 0.000125), ("MB", 1.25e-7), ("GB", 1.25e-10), ("TB", 1.25e-13), ("Kib", 0.00012207), ("Mib", 1.19209e-7), ("Gib", 1.16415e-10)]),
];

pub fn factor_of(category: &str, unit: &str) -> Option<f64> {
    CONVERSIONS.iter()
        .find(|(name, _)| *name == category)
        .and_then(|(_, units)| units.iter().find(|(u, _)| *u == unit))
        .map(|(_, factor)| *factor)
}

// First category, in declared order, that knows the unit
pub fn category_of(unit: &str) -> Option<&'static str> {
    CONVERSIONS.iter()
        .find(|(_, units)| units.iter().any(|(u, _)| *u == unit))
        .map(|(name, _)| *name)
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnsupportedConversion {
    pub from: String,
    pub to: String
}

impl fmt::Display for UnsupportedConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: Conversion from '{}' to '{}' not supported.", self.from, self.to)
    }
}
impl std::error::Error for UnsupportedConversion {}

static CONVERSION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([0-9.]+)\s*([A-Za-z]+(?:\s*[A-Za-z]+)*)\s+to\s+([A-Za-z]+(?:\s*[A-Za-z]+)*)\s*$").unwrap()
});

// Recognize a whole line `<number> <unit> to <unit>`.
// None if the line has a different shape; otherwise the converted value, or the unit pair that
// could not be resolved.
pub fn convert(line: &str) -> Option<Result<f64, UnsupportedConversion>> {
    let caps = CONVERSION_LINE.captures(line)?;
    let value: f64 = caps[1].parse().ok()?;
    let (from, to) = (&caps[2], &caps[3]);
    let factors = category_of(from).and_then(|category| Some((factor_of(category, from)?, factor_of(category, to)?)));
    Some(match factors {
        Some((from_factor, to_factor)) => Ok(value / from_factor * to_factor),
        None => Err(UnsupportedConversion { from: from.to_string(), to: to.to_string() })
    })
}

#[cfg(test)]
mod test {
    use super::{convert, factor_of, UnsupportedConversion, CONVERSIONS};
    use crate::util::format_fixed;

    fn converted(line: &str) -> String {
        format_fixed(convert(line).unwrap().unwrap())
    }

    #[test]
    fn conversions() {
        let test_cases = [
            ("1 km to m", "1000"),
            ("10 km to m", "10000"),
            ("  10 km to m  ", "10000"),
            ("1 GB to MB", "1000"),
            ("8 b to B", "1"),
            ("1 m to ft", "3.28084"),
            ("2.5 kg to g", "2500"),
            ("1 l to fl oz", "33.814"),
            ("33.814 fl oz to l", "1"),
            ("1 lb to kg", "0.453593"),
        ];
        for (input, expected) in test_cases {
            assert_eq!(converted(input), expected, "converting {}", input);
        }
    }

    #[test]
    fn unsupported() {
        let test_cases = [
            ("1 km to kg", "km", "kg"),
            ("5 parsecs to m", "parsecs", "m"),
            ("5 minutes to go", "minutes", "go"),
            ("1 KM to m", "KM", "m"),
        ];
        for (input, from, to) in test_cases {
            assert_eq!(convert(input), Some(Err(UnsupportedConversion { from: from.into(), to: to.into() })));
        }
        assert_eq!(
            convert("1 km to kg").unwrap().unwrap_err().to_string(),
            "Error: Conversion from 'km' to 'kg' not supported."
        );
    }

    #[test]
    fn not_conversions() {
        for input in ["km to m", "10 km", "1.2.3 km to m", "10 km into m", "x = 10 km to m", "10 km to m ="] {
            assert_eq!(convert(input), None, "{} is not a conversion", input);
        }
    }

    #[test]
    fn round_trips_within_category() {
        for (category, units) in CONVERSIONS.iter() {
            for (a, _) in units.iter() {
                for (b, _) in units.iter() {
                    let there = 7.25 / factor_of(category, a).unwrap() * factor_of(category, b).unwrap();
                    let back = there / factor_of(category, b).unwrap() * factor_of(category, a).unwrap();
                    assert_eq!(format_fixed(back), "7.25", "{} -> {} -> {}", a, b, a);
                }
            }
        }
    }
}
