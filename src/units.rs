//! Unit conversion for recipe and pantry quantities.
//!
//! Every known unit belongs to one measurement kind with a canonical base:
//! milliliters for volume, grams for weight and pieces for counts. Amounts
//! can only be compared within a kind; there is no density table, so a cup
//! of flour and a gram of flour are not comparable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliliters in one US cup.
pub const ML_PER_CUP: f64 = 236.588;
pub const ML_PER_TSP: f64 = 4.92892;
pub const ML_PER_TBSP: f64 = 14.7868;
pub const ML_PER_FL_OZ: f64 = 29.5735;
pub const ML_PER_PINT: f64 = 473.176;
pub const ML_PER_QUART: f64 = 946.353;
pub const ML_PER_GALLON: f64 = 3785.41;
pub const GRAMS_PER_OZ: f64 = 28.3495;
pub const GRAMS_PER_LB: f64 = 453.592;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureKind {
    Volume,
    Weight,
    Count,
}

impl fmt::Display for MeasureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureKind::Volume => write!(f, "volume"),
            MeasureKind::Weight => write!(f, "weight"),
            MeasureKind::Count => write!(f, "count"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Unit {
    Milliliter,
    Centiliter,
    Deciliter,
    Liter,
    Teaspoon,
    Tablespoon,
    FluidOunce,
    Cup,
    Pint,
    Quart,
    Gallon,
    Milligram,
    Gram,
    Kilogram,
    Ounce,
    Pound,
    Piece,
    /// A unit with no conversion entry ("clove", "can", "pinch").
    /// Only comparable with the same normalized text.
    Other(String),
}

impl Unit {
    /// Parses a unit string. Never fails: unknown units become `Unit::Other`.
    pub fn parse(text: &str) -> Self {
        let normalized = normalize_unit(text);
        match normalized.as_str() {
            "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" | "mls" => {
                Unit::Milliliter
            }
            "cl" | "centiliter" | "centiliters" | "centilitre" | "centilitres" => Unit::Centiliter,
            "dl" | "deciliter" | "deciliters" | "decilitre" | "decilitres" => Unit::Deciliter,
            "l" | "liter" | "liters" | "litre" | "litres" | "ltr" => Unit::Liter,
            "tsp" | "tsps" | "teaspoon" | "teaspoons" | "t" => Unit::Teaspoon,
            "tbsp" | "tbsps" | "tbs" | "tbl" | "tbls" | "tablespoon" | "tablespoons" | "T" => {
                Unit::Tablespoon
            }
            "fl oz" | "floz" | "fluid ounce" | "fluid ounces" | "fl. oz" => Unit::FluidOunce,
            "cup" | "cups" | "c" => Unit::Cup,
            "pint" | "pints" | "pt" => Unit::Pint,
            "quart" | "quarts" | "qt" => Unit::Quart,
            "gallon" | "gallons" | "gal" => Unit::Gallon,
            "mg" | "milligram" | "milligrams" => Unit::Milligram,
            "g" | "gr" | "gram" | "grams" | "gramme" | "grammes" => Unit::Gram,
            "kg" | "kilo" | "kilos" | "kilogram" | "kilograms" => Unit::Kilogram,
            "oz" | "ounce" | "ounces" => Unit::Ounce,
            "lb" | "lbs" | "pound" | "pounds" => Unit::Pound,
            "" | "piece" | "pieces" | "pc" | "pcs" | "whole" | "each" | "ea" | "item" | "items"
            | "unit" | "units" | "x" => Unit::Piece,
            _ => Unit::Other(normalized),
        }
    }

    /// Measurement kind, or `None` for units without a conversion entry.
    pub fn kind(&self) -> Option<MeasureKind> {
        match self {
            Unit::Milliliter
            | Unit::Centiliter
            | Unit::Deciliter
            | Unit::Liter
            | Unit::Teaspoon
            | Unit::Tablespoon
            | Unit::FluidOunce
            | Unit::Cup
            | Unit::Pint
            | Unit::Quart
            | Unit::Gallon => Some(MeasureKind::Volume),
            Unit::Milligram | Unit::Gram | Unit::Kilogram | Unit::Ounce | Unit::Pound => {
                Some(MeasureKind::Weight)
            }
            Unit::Piece => Some(MeasureKind::Count),
            Unit::Other(_) => None,
        }
    }

    /// How many base units (ml, g or pieces) one of this unit is.
    fn base_factor(&self) -> f64 {
        match self {
            Unit::Milliliter => 1.0,
            Unit::Centiliter => 10.0,
            Unit::Deciliter => 100.0,
            Unit::Liter => 1000.0,
            Unit::Teaspoon => ML_PER_TSP,
            Unit::Tablespoon => ML_PER_TBSP,
            Unit::FluidOunce => ML_PER_FL_OZ,
            Unit::Cup => ML_PER_CUP,
            Unit::Pint => ML_PER_PINT,
            Unit::Quart => ML_PER_QUART,
            Unit::Gallon => ML_PER_GALLON,
            Unit::Milligram => 0.001,
            Unit::Gram => 1.0,
            Unit::Kilogram => 1000.0,
            Unit::Ounce => GRAMS_PER_OZ,
            Unit::Pound => GRAMS_PER_LB,
            Unit::Piece | Unit::Other(_) => 1.0,
        }
    }

    pub fn abbreviation(&self) -> &str {
        match self {
            Unit::Milliliter => "ml",
            Unit::Centiliter => "cl",
            Unit::Deciliter => "dl",
            Unit::Liter => "l",
            Unit::Teaspoon => "tsp",
            Unit::Tablespoon => "tbsp",
            Unit::FluidOunce => "fl oz",
            Unit::Cup => "cup",
            Unit::Pint => "pint",
            Unit::Quart => "quart",
            Unit::Gallon => "gallon",
            Unit::Milligram => "mg",
            Unit::Gram => "g",
            Unit::Kilogram => "kg",
            Unit::Ounce => "oz",
            Unit::Pound => "lb",
            Unit::Piece => "",
            Unit::Other(text) => text,
        }
    }

    /// True when amounts in `self` and `other` can be converted into each other.
    pub fn is_comparable(&self, other: &Unit) -> bool {
        match (self.kind(), other.kind()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self == other,
            _ => false,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

fn normalize_unit(text: &str) -> String {
    let trimmed = text.trim().trim_end_matches('.');
    // A capital "T" is the conventional shorthand for tablespoon.
    if trimmed == "T" {
        return trimmed.to_string();
    }
    trimmed
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// The units measure different things (volume vs count, or unknown units).
    NotComparable { from: String, to: String },
    /// Negative, NaN or infinite amount.
    InvalidAmount(f64),
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::NotComparable { from, to } => {
                write!(f, "Units '{}' and '{}' are not comparable", from, to)
            }
            ConversionError::InvalidAmount(amount) => {
                write!(f, "Invalid amount {} (must be a non-negative number)", amount)
            }
        }
    }
}

impl std::error::Error for ConversionError {}

fn check_amount(amount: f64) -> Result<(), ConversionError> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        Err(ConversionError::InvalidAmount(amount))
    }
}

/// Converts `amount` into the kind's base unit (ml, g or pieces).
pub fn to_base(amount: f64, unit: &Unit) -> Result<(f64, MeasureKind), ConversionError> {
    check_amount(amount)?;
    let kind = unit.kind().ok_or_else(|| ConversionError::NotComparable {
        from: unit.to_string(),
        to: "base unit".to_string(),
    })?;
    Ok((amount * unit.base_factor(), kind))
}

pub fn convert(amount: f64, from: &Unit, to: &Unit) -> Result<f64, ConversionError> {
    check_amount(amount)?;
    if !from.is_comparable(to) {
        return Err(ConversionError::NotComparable {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    Ok(amount * from.base_factor() / to.base_factor())
}

/// Convenience wrapper over [`convert`] taking unit strings.
pub fn convert_str(amount: f64, from: &str, to: &str) -> Result<f64, ConversionError> {
    convert(amount, &Unit::parse(from), &Unit::parse(to))
}

/// An amount with its unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub amount: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(amount: f64, unit: &str) -> Self {
        Self {
            amount,
            unit: Unit::parse(unit),
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.unit.abbreviation();
        if unit.is_empty() {
            write!(f, "{}", self.amount)
        } else {
            write!(f, "{} {}", self.amount, unit)
        }
    }
}

/// Outcome of checking whether an available quantity covers a required one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Comparison {
    Sufficient,
    /// `shortfall` is expressed in the required quantity's unit.
    Insufficient { shortfall: f64 },
    NotComparable,
}

/// Checks "do I have enough?" across differing units.
pub fn compare(have: &Quantity, need: &Quantity) -> Comparison {
    let available = match convert(have.amount, &have.unit, &need.unit) {
        Ok(amount) => amount,
        Err(_) => return Comparison::NotComparable,
    };
    if need.amount.is_nan() || need.amount < 0.0 {
        return Comparison::NotComparable;
    }

    let tolerance = 1e-4 * need.amount.max(1.0);
    if available + tolerance >= need.amount {
        Comparison::Sufficient
    } else {
        Comparison::Insufficient {
            shortfall: need.amount - available,
        }
    }
}

/// Splits a free-text measure ("1 1/2 cups", "200g", "½ tsp", "Pinch") into
/// a quantity and the remaining unit text.
///
/// Text without a leading number is read as one of the whole text.
pub fn parse_measure(text: &str) -> (f64, String) {
    let expanded = expand_measure_text(text);
    let mut tokens = expanded.split_whitespace().peekable();

    let mut quantity = 0.0;
    let mut found = false;
    while let Some(token) = tokens.peek() {
        match parse_number(token) {
            Some(value) => {
                quantity += value;
                found = true;
                tokens.next();
            }
            None => break,
        }
    }

    let unit = tokens.collect::<Vec<_>>().join(" ");
    if found {
        (quantity, unit)
    } else {
        (1.0, unit)
    }
}

/// Replaces unicode vulgar fractions and separates numbers glued to units.
fn expand_measure_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut prev_digit = false;
    for c in text.trim().chars() {
        let fraction = match c {
            '½' => Some("1/2"),
            '⅓' => Some("1/3"),
            '⅔' => Some("2/3"),
            '¼' => Some("1/4"),
            '¾' => Some("3/4"),
            '⅛' => Some("1/8"),
            _ => None,
        };
        if let Some(fraction) = fraction {
            out.push(' ');
            out.push_str(fraction);
            out.push(' ');
            prev_digit = false;
            continue;
        }
        if prev_digit && c.is_alphabetic() {
            out.push(' ');
        }
        prev_digit = c.is_ascii_digit();
        out.push(c);
    }
    out
}

fn parse_number(token: &str) -> Option<f64> {
    // Ranges such as "2-3" use the lower bound.
    let token = token.split('-').next().unwrap_or(token);
    if let Some((num, den)) = token.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den == 0.0 {
            return None;
        }
        return Some(num / den);
    }
    let value: f64 = token.replace(',', ".").parse().ok()?;
    value.is_finite().then_some(value)
}
