//! Measurement detection and same-category conversion
//!
//! Every category has a canonical unit; linear units carry a factor to it.
//! Temperature is the one affine category and is handled separately.

use regex::Regex;
use serde_json::{Map, Value};

use super::{is_standalone, metadata, round_to, Detector};
use crate::types::{PatternMatch, PatternType};

const BASE_CONFIDENCE: f64 = 0.85;
/// "5 m" or "2 l" is easier to misread than "5 km".
const SINGLE_LETTER_CONFIDENCE: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum System {
    Metric,
    Imperial,
    Neutral,
}

impl System {
    /// Parses the `preferredUnits` preference; anything but "imperial" is metric.
    pub fn from_preference(value: &str) -> Self {
        if value.eq_ignore_ascii_case("imperial") {
            System::Imperial
        } else {
            System::Metric
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Scale {
    /// Multiply to reach the canonical unit.
    Linear(f64),
    Celsius,
    Fahrenheit,
    Kelvin,
}

pub struct UnitSpec {
    pub symbol: &'static str,
    aliases: &'static [&'static str],
    scale: Scale,
    pub system: System,
    /// Unit this one is usually converted to.
    pub counterpart: &'static str,
}

pub struct CategorySpec {
    pub name: &'static str,
    pub canonical: &'static str,
    pub units: &'static [UnitSpec],
}

macro_rules! unit {
    ($symbol:literal, [$($alias:literal),*], $scale:expr, $system:ident, $counterpart:literal) => {
        UnitSpec {
            symbol: $symbol,
            aliases: &[$($alias),*],
            scale: $scale,
            system: System::$system,
            counterpart: $counterpart,
        }
    };
}

#[rustfmt::skip]
pub const CATEGORIES: &[CategorySpec] = &[
    CategorySpec {
        name: "weight",
        canonical: "kg",
        units: &[
            unit!("mg", ["mg", "milligram", "milligrams"], Scale::Linear(1e-6), Metric, "oz"),
            unit!("g", ["g", "gram", "grams"], Scale::Linear(1e-3), Metric, "oz"),
            unit!("kg", ["kg", "kgs", "kilo", "kilos", "kilogram", "kilograms"], Scale::Linear(1.0), Metric, "lb"),
            unit!("t", ["tonne", "tonnes", "metric ton", "metric tons"], Scale::Linear(1000.0), Metric, "lb"),
            unit!("oz", ["oz", "ounce", "ounces"], Scale::Linear(0.028_349_523_125), Imperial, "g"),
            unit!("lb", ["lb", "lbs", "pound", "pounds"], Scale::Linear(0.453_592_37), Imperial, "kg"),
            unit!("st", ["stone", "stones"], Scale::Linear(6.350_293_18), Imperial, "kg"),
        ],
    },
    CategorySpec {
        name: "distance",
        canonical: "m",
        units: &[
            unit!("mm", ["mm", "millimeter", "millimeters", "millimetre", "millimetres"], Scale::Linear(1e-3), Metric, "in"),
            unit!("cm", ["cm", "centimeter", "centimeters", "centimetre", "centimetres"], Scale::Linear(1e-2), Metric, "in"),
            unit!("m", ["m", "meter", "meters", "metre", "metres"], Scale::Linear(1.0), Metric, "ft"),
            unit!("km", ["km", "kms", "kilometer", "kilometers", "kilometre", "kilometres"], Scale::Linear(1000.0), Metric, "mi"),
            unit!("in", ["inch", "inches"], Scale::Linear(0.0254), Imperial, "cm"),
            unit!("ft", ["ft", "foot", "feet"], Scale::Linear(0.3048), Imperial, "m"),
            unit!("yd", ["yd", "yds", "yard", "yards"], Scale::Linear(0.9144), Imperial, "m"),
            unit!("mi", ["mi", "mile", "miles"], Scale::Linear(1609.344), Imperial, "km"),
        ],
    },
    CategorySpec {
        name: "volume",
        canonical: "l",
        units: &[
            unit!("ml", ["ml", "milliliter", "milliliters", "millilitre", "millilitres"], Scale::Linear(1e-3), Metric, "fl oz"),
            unit!("l", ["l", "liter", "liters", "litre", "litres"], Scale::Linear(1.0), Metric, "gal"),
            unit!("fl oz", ["fl oz", "fluid ounce", "fluid ounces"], Scale::Linear(0.029_573_529_6), Imperial, "ml"),
            unit!("cup", ["cup", "cups"], Scale::Linear(0.236_588_236_5), Imperial, "ml"),
            unit!("pt", ["pt", "pint", "pints"], Scale::Linear(0.473_176_473), Imperial, "l"),
            unit!("qt", ["qt", "quart", "quarts"], Scale::Linear(0.946_352_946), Imperial, "l"),
            unit!("gal", ["gal", "gallon", "gallons"], Scale::Linear(3.785_411_784), Imperial, "l"),
        ],
    },
    CategorySpec {
        name: "temperature",
        canonical: "°C",
        units: &[
            unit!("°C", ["°c", "ºc", "celsius", "degrees celsius", "degrees c"], Scale::Celsius, Metric, "°F"),
            unit!("°F", ["°f", "ºf", "fahrenheit", "degrees fahrenheit", "degrees f"], Scale::Fahrenheit, Imperial, "°C"),
            unit!("K", ["kelvin", "kelvins"], Scale::Kelvin, Neutral, "°C"),
        ],
    },
    CategorySpec {
        name: "area",
        canonical: "m²",
        units: &[
            unit!("m²", ["m²", "m2", "sq m", "square meter", "square meters", "square metre", "square metres"], Scale::Linear(1.0), Metric, "ft²"),
            unit!("km²", ["km²", "km2", "sq km", "square kilometer", "square kilometers"], Scale::Linear(1e6), Metric, "mi²"),
            unit!("ha", ["ha", "hectare", "hectares"], Scale::Linear(1e4), Metric, "acre"),
            unit!("ft²", ["ft²", "ft2", "sq ft", "square foot", "square feet"], Scale::Linear(0.092_903_04), Imperial, "m²"),
            unit!("acre", ["acre", "acres"], Scale::Linear(4_046.856_422_4), Imperial, "ha"),
            unit!("mi²", ["mi²", "sq mi", "square mile", "square miles"], Scale::Linear(2_589_988.110_336), Imperial, "km²"),
        ],
    },
    CategorySpec {
        name: "speed",
        canonical: "m/s",
        units: &[
            unit!("m/s", ["m/s", "meters per second", "metres per second"], Scale::Linear(1.0), Metric, "mph"),
            unit!("km/h", ["km/h", "kmh", "kph", "kilometers per hour", "kilometres per hour"], Scale::Linear(1.0 / 3.6), Metric, "mph"),
            unit!("mph", ["mph", "miles per hour"], Scale::Linear(0.447_04), Imperial, "km/h"),
            unit!("kn", ["knot", "knots", "kn"], Scale::Linear(0.514_444), Neutral, "km/h"),
        ],
    },
    CategorySpec {
        name: "digital",
        canonical: "B",
        units: &[
            unit!("B", ["byte", "bytes"], Scale::Linear(1.0), Neutral, "KB"),
            unit!("KB", ["kb", "kilobyte", "kilobytes"], Scale::Linear(1e3), Neutral, "B"),
            unit!("MB", ["mb", "megabyte", "megabytes"], Scale::Linear(1e6), Neutral, "KB"),
            unit!("GB", ["gb", "gigabyte", "gigabytes"], Scale::Linear(1e9), Neutral, "MB"),
            unit!("TB", ["tb", "terabyte", "terabytes"], Scale::Linear(1e12), Neutral, "GB"),
        ],
    },
    CategorySpec {
        name: "time",
        canonical: "s",
        units: &[
            unit!("ms", ["ms", "millisecond", "milliseconds"], Scale::Linear(1e-3), Neutral, "s"),
            unit!("s", ["sec", "secs", "second", "seconds"], Scale::Linear(1.0), Neutral, "min"),
            unit!("min", ["min", "mins", "minute", "minutes"], Scale::Linear(60.0), Neutral, "s"),
            unit!("h", ["hr", "hrs", "hour", "hours"], Scale::Linear(3600.0), Neutral, "min"),
            unit!("day", ["day", "days"], Scale::Linear(86_400.0), Neutral, "h"),
            unit!("week", ["week", "weeks", "wk", "wks"], Scale::Linear(604_800.0), Neutral, "day"),
        ],
    },
];

fn to_canonical(value: f64, scale: Scale) -> f64 {
    match scale {
        Scale::Linear(factor) => value * factor,
        Scale::Celsius => value,
        Scale::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
        Scale::Kelvin => value - 273.15,
    }
}

fn from_canonical(value: f64, scale: Scale) -> f64 {
    match scale {
        Scale::Linear(factor) => value / factor,
        Scale::Celsius => value,
        Scale::Fahrenheit => value * 9.0 / 5.0 + 32.0,
        Scale::Kelvin => value + 273.15,
    }
}

/// Category and unit spec for a canonical unit symbol.
pub fn lookup(symbol: &str) -> Option<(&'static CategorySpec, &'static UnitSpec)> {
    CATEGORIES.iter().find_map(|cat| {
        cat.units
            .iter()
            .find(|u| u.symbol == symbol)
            .map(|u| (cat, u))
    })
}

fn lookup_alias(alias: &str) -> Option<(&'static CategorySpec, &'static UnitSpec)> {
    let alias = alias.to_lowercase();
    CATEGORIES.iter().find_map(|cat| {
        cat.units
            .iter()
            .find(|u| u.aliases.contains(&alias.as_str()))
            .map(|u| (cat, u))
    })
}

/// Convert `value` between two units of the same category.
pub fn convert(value: f64, from: &str, to: &str) -> Option<f64> {
    let (from_cat, from_unit) = lookup(from)?;
    let (to_cat, to_unit) = lookup(to)?;
    if from_cat.name != to_cat.name {
        return None;
    }
    Some(from_canonical(to_canonical(value, from_unit.scale), to_unit.scale))
}

/// Converts `quantity` into the unit of its category that a user of `system` expects.
///
/// A quantity already in `system` goes to its counterpart so the conversion
/// is never a no-op.
pub fn to_system(quantity: &Quantity, system: System) -> Option<(&'static str, f64)> {
    let (category, spec) = lookup(quantity.unit)?;
    let target = if spec.system == system {
        spec.counterpart
    } else {
        match lookup(spec.counterpart) {
            Some((_, counterpart)) if counterpart.system == system => spec.counterpart,
            _ => category
                .units
                .iter()
                .find(|u| u.system == system)
                .map(|u| u.symbol)
                .unwrap_or(spec.counterpart),
        }
    };
    convert(quantity.value, quantity.unit, target).map(|value| (target, value))
}

/// A parsed measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: &'static str,
    pub category: &'static str,
}

pub struct UnitDetector {
    pattern: Regex,
    threshold: f64,
}

impl UnitDetector {
    pub fn new(threshold: f64) -> Result<Self, regex::Error> {
        let mut aliases: Vec<&str> = CATEGORIES
            .iter()
            .flat_map(|c| c.units.iter())
            .flat_map(|u| u.aliases.iter().copied())
            .collect();
        // Longest first so "km/h" wins over "km" and "mph" over "m".
        aliases.sort_by_key(|a| std::cmp::Reverse(a.len()));
        let alternation = aliases
            .iter()
            .map(|a| regex::escape(a).replace(' ', r"\s+"))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = Regex::new(&format!(
            r"(?i)(?P<value>-?\d{{1,3}}(?:,\d{{3}})+(?:\.\d+)?|-?\d+(?:\.\d+)?)\s?(?P<unit>{alternation})"
        ))?;

        Ok(Self { pattern, threshold })
    }

    fn quantities<'a>(
        &'a self,
        text: &'a str,
    ) -> impl Iterator<Item = (regex::Match<'a>, Quantity, &'static UnitSpec, bool)> + 'a {
        self.pattern.captures_iter(text).filter_map(move |caps| {
            let whole = caps.get(0)?;
            let number_start = caps.name("value")?.start();
            let lead = if text[number_start..].starts_with('-') {
                number_start + 1
            } else {
                number_start
            };
            if !is_standalone(text, lead, whole.end()) {
                return None;
            }
            if text[..whole.start()].ends_with('.') {
                return None;
            }

            let value: f64 = caps.name("value")?.as_str().replace(',', "").parse().ok()?;
            let unit_text = caps.name("unit")?.as_str();
            let normalized: String = unit_text.split_whitespace().collect::<Vec<_>>().join(" ");
            let (category, spec) = lookup_alias(&normalized)?;
            let single_letter = normalized.chars().count() == 1;

            Some((
                whole,
                Quantity {
                    value,
                    unit: spec.symbol,
                    category: category.name,
                },
                spec,
                single_letter,
            ))
        })
    }

    /// First measurement in `text`, ignoring thresholds.
    pub fn first_quantity(&self, text: &str) -> Option<Quantity> {
        self.quantities(text).next().map(|(_, q, _, _)| q)
    }
}

impl Detector for UnitDetector {
    fn name(&self) -> &'static str {
        "unit"
    }

    fn pattern_type(&self) -> PatternType {
        PatternType::Unit
    }

    fn detect(&self, text: &str) -> Vec<PatternMatch> {
        let mut matches = Vec::new();

        for (m, quantity, spec, single_letter) in self.quantities(text) {
            let confidence = if single_letter {
                SINGLE_LETTER_CONFIDENCE
            } else {
                BASE_CONFIDENCE
            };
            if confidence < self.threshold {
                continue;
            }

            let Some((category, _)) = lookup(quantity.unit) else {
                continue;
            };
            let canonical_value = to_canonical(quantity.value, spec.scale);
            let conversions: Map<String, Value> = category
                .units
                .iter()
                .filter(|u| u.symbol != spec.symbol)
                .map(|u| {
                    let v = from_canonical(canonical_value, u.scale);
                    (u.symbol.to_string(), Value::from(round_to(v, 4)))
                })
                .collect();

            let meta = metadata([
                ("value", Value::from(quantity.value)),
                ("unit", Value::from(quantity.unit)),
                ("category", Value::from(quantity.category)),
                ("canonicalUnit", Value::from(category.canonical)),
                ("canonicalValue", Value::from(round_to(canonical_value, 6))),
                ("conversions", Value::Object(conversions)),
            ]);
            matches.push(PatternMatch::from_regex(PatternType::Unit, m, confidence, meta));
        }

        matches
    }
}
