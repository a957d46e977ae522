//! Core value kinds and typed values for tween interpolation/blending.
//!
//! Every value decomposes into a flat list of numbers plus a template:
//! - `Number`: one number, no template
//! - `Unit`: one number and a unit suffix (`%`, `px`, `deg`, ...)
//! - `Complex`: N numbers interleaved with N+1 literal strings
//!
//! Interpolation and additive summation run on the number lists only; the
//! template of the destination value is kept for rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AnimError;

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Unit,
    Complex,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum AnimValue {
    Number(f32),
    Unit {
        value: f32,
        unit: String,
    },
    /// `strings.len() == numbers.len() + 1`
    Complex {
        numbers: Vec<f32>,
        strings: Vec<String>,
    },
}

/// Authored value before parsing: a literal number or a string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f32),
    Text(String),
}

impl From<f32> for RawValue {
    fn from(v: f32) -> Self {
        RawValue::Number(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v as f32)
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        RawValue::Number(v as f32)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Text(v)
    }
}

impl RawValue {
    pub fn parse(&self) -> Result<AnimValue, AnimError> {
        match self {
            RawValue::Number(v) => Ok(AnimValue::Number(*v)),
            RawValue::Text(s) => AnimValue::parse(s),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(v) => write!(f, "{v}"),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

/// Scan a number starting at byte `i` of `s`, returning its end offset.
fn scan_number(s: &[u8], i: usize) -> Option<usize> {
    let mut j = i;
    if j < s.len() && (s[j] == b'-' || s[j] == b'+') {
        j += 1;
    }
    let int_start = j;
    while j < s.len() && s[j].is_ascii_digit() {
        j += 1;
    }
    let mut digits = j - int_start;
    if j + 1 < s.len() && s[j] == b'.' && s[j + 1].is_ascii_digit() {
        j += 1;
        let frac_start = j;
        while j < s.len() && s[j].is_ascii_digit() {
            j += 1;
        }
        digits += j - frac_start;
    } else if j < s.len() && s[j] == b'.' && digits > 0 {
        // "5." is still the number 5
        j += 1;
    }
    if digits == 0 {
        return None;
    }
    // Exponent only when digits follow, so "1em" stays a unit.
    if j < s.len() && (s[j] == b'e' || s[j] == b'E') {
        let mut k = j + 1;
        if k < s.len() && (s[k] == b'-' || s[k] == b'+') {
            k += 1;
        }
        if k < s.len() && s[k].is_ascii_digit() {
            while k < s.len() && s[k].is_ascii_digit() {
                k += 1;
            }
            j = k;
        }
    }
    Some(j)
}

fn starts_number(s: &[u8], i: usize) -> bool {
    let prev_ident = i > 0 && (s[i - 1].is_ascii_alphanumeric() || s[i - 1] == b'_');
    if prev_ident {
        return false;
    }
    let digit_at = |k: usize| k < s.len() && s[k].is_ascii_digit();
    match s[i] {
        b'0'..=b'9' => true,
        b'.' => digit_at(i + 1),
        b'-' | b'+' => digit_at(i + 1) || (i + 2 < s.len() && s[i + 1] == b'.' && digit_at(i + 2)),
        _ => false,
    }
}

fn invalid(input: &str, reason: &str) -> AnimError {
    AnimError::InvalidValue {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_hex_color(input: &str, hex: &str) -> Result<AnimValue, AnimError> {
    let digits: Vec<u8> = hex
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| invalid(input, "non-hex digit in color"))?;
    let channel = |hi: u8, lo: u8| (hi * 16 + lo) as f32;
    let (r, g, b, a) = match digits.as_slice() {
        [r, g, b] => (channel(*r, *r), channel(*g, *g), channel(*b, *b), 1.0),
        [r, g, b, a] => (
            channel(*r, *r),
            channel(*g, *g),
            channel(*b, *b),
            channel(*a, *a) / 255.0,
        ),
        [r1, r0, g1, g0, b1, b0] => (channel(*r1, *r0), channel(*g1, *g0), channel(*b1, *b0), 1.0),
        [r1, r0, g1, g0, b1, b0, a1, a0] => (
            channel(*r1, *r0),
            channel(*g1, *g0),
            channel(*b1, *b0),
            channel(*a1, *a0) / 255.0,
        ),
        _ => return Err(invalid(input, "hex color must have 3, 4, 6 or 8 digits")),
    };
    Ok(rgba(vec![r, g, b, a]))
}

fn rgba(numbers: Vec<f32>) -> AnimValue {
    AnimValue::Complex {
        numbers,
        strings: ["rgba(", ", ", ", ", ", ", ")"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

fn fmt_num(f: &mut fmt::Formatter<'_>, v: f32) -> fmt::Result {
    // Avoid printing "-0".
    let v = if v == 0.0 { 0.0 } else { v };
    write!(f, "{v}")
}

impl AnimValue {
    /// Parse an authored string into a typed value.
    pub fn parse(input: &str) -> Result<Self, AnimError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(invalid(input, "empty value"));
        }
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex_color(input, hex);
        }
        let bytes = s.as_bytes();
        if starts_number(bytes, 0) {
            if let Some(end) = scan_number(bytes, 0) {
                let rest = &s[end..];
                let value: f32 = s[..end]
                    .parse()
                    .map_err(|_| invalid(input, "malformed number"))?;
                if rest.is_empty() {
                    return Ok(AnimValue::Number(value));
                }
                if rest.chars().all(|c| c.is_ascii_alphabetic() || c == '%') {
                    return Ok(AnimValue::Unit {
                        value,
                        unit: rest.to_string(),
                    });
                }
            }
        }

        let mut numbers = Vec::new();
        let mut strings = Vec::new();
        let mut literal_start = 0;
        let mut i = 0;
        while i < bytes.len() {
            if starts_number(bytes, i) {
                if let Some(end) = scan_number(bytes, i) {
                    let n: f32 = s[i..end]
                        .parse()
                        .map_err(|_| invalid(input, "malformed number"))?;
                    strings.push(s[literal_start..i].to_string());
                    numbers.push(n);
                    literal_start = end;
                    i = end;
                    continue;
                }
            }
            i += 1;
        }
        strings.push(s[literal_start..].to_string());
        if numbers.is_empty() {
            return Err(invalid(input, "no numeric component"));
        }

        // rgb()/rgba() normalize to the same 4-channel template as hex colors.
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("rgb(") && numbers.len() == 3 {
            numbers.push(1.0);
            return Ok(rgba(numbers));
        }
        if lower.starts_with("rgba(") && numbers.len() == 4 {
            return Ok(rgba(numbers));
        }
        Ok(AnimValue::Complex { numbers, strings })
    }

    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            AnimValue::Number(_) => ValueKind::Number,
            AnimValue::Unit { .. } => ValueKind::Unit,
            AnimValue::Complex { .. } => ValueKind::Complex,
        }
    }

    /// Number of numeric components.
    fn len(&self) -> usize {
        match self {
            AnimValue::Number(_) | AnimValue::Unit { .. } => 1,
            AnimValue::Complex { numbers, .. } => numbers.len(),
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            AnimValue::Unit { unit, .. } => Some(unit),
            _ => None,
        }
    }

    /// Flat numeric components.
    pub fn numbers(&self) -> Vec<f32> {
        match self {
            AnimValue::Number(v) | AnimValue::Unit { value: v, .. } => vec![*v],
            AnimValue::Complex { numbers, .. } => numbers.clone(),
        }
    }

    /// Rebuild a value of the same shape around new numeric components.
    pub fn with_numbers(&self, numbers: &[f32]) -> AnimValue {
        let first = numbers.first().copied().unwrap_or(0.0);
        match self {
            AnimValue::Number(_) => AnimValue::Number(first),
            AnimValue::Unit { unit, .. } => AnimValue::Unit {
                value: first,
                unit: unit.clone(),
            },
            AnimValue::Complex { strings, .. } => AnimValue::Complex {
                numbers: numbers.to_vec(),
                strings: strings.clone(),
            },
        }
    }

    /// True when numbers of `self` and `other` can be summed component-wise.
    pub fn is_compatible(&self, other: &AnimValue) -> bool {
        self.kind() == other.kind() && self.len() == other.len() && self.unit() == other.unit()
    }

    /// Bring a from/to pair to one shape, or report why that is impossible.
    ///
    /// A bare number adopts the unit (or single-component template) of the
    /// other side; complex values must agree on component count and render
    /// with the destination's template.
    pub fn unify(
        property: &str,
        from: AnimValue,
        to: AnimValue,
    ) -> Result<(AnimValue, AnimValue), AnimError> {
        let mismatch = |from: &AnimValue, to: &AnimValue, reason: &str| AnimError::ValueMismatch {
            property: property.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.to_string(),
        };
        match (&from, &to) {
            (AnimValue::Number(_), AnimValue::Number(_)) => Ok((from, to)),
            (AnimValue::Unit { unit: a, .. }, AnimValue::Unit { unit: b, .. }) => {
                if a == b {
                    Ok((from, to))
                } else {
                    Err(mismatch(&from, &to, "units differ"))
                }
            }
            (AnimValue::Number(a), AnimValue::Unit { .. }) => Ok((to.with_numbers(&[*a]), to)),
            (AnimValue::Unit { .. }, AnimValue::Number(b)) => {
                let to = from.with_numbers(&[*b]);
                Ok((from, to))
            }
            (AnimValue::Complex { numbers: a, .. }, AnimValue::Complex { numbers: b, .. }) => {
                if a.len() == b.len() {
                    Ok((to.with_numbers(a), to))
                } else {
                    Err(mismatch(&from, &to, "component counts differ"))
                }
            }
            (AnimValue::Number(a), AnimValue::Complex { numbers, .. }) if numbers.len() == 1 => {
                Ok((to.with_numbers(&[*a]), to))
            }
            (AnimValue::Complex { numbers, .. }, AnimValue::Number(b)) if numbers.len() == 1 => {
                let to = from.with_numbers(&[*b]);
                Ok((from, to))
            }
            _ => Err(mismatch(&from, &to, "value shapes differ")),
        }
    }
}

impl fmt::Display for AnimValue {
    /// Render as a CSS-style string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnimValue::Number(v) => fmt_num(f, *v),
            AnimValue::Unit { value, unit } => {
                fmt_num(f, *value)?;
                f.write_str(unit)
            }
            AnimValue::Complex { numbers, strings } => {
                for (i, lit) in strings.iter().enumerate() {
                    f.write_str(lit)?;
                    if let Some(n) = numbers.get(i) {
                        fmt_num(f, *n)?;
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalars_and_units() {
        assert_eq!(AnimValue::parse("0.5").unwrap(), AnimValue::Number(0.5));
        assert_eq!(
            AnimValue::parse("-100%").unwrap(),
            AnimValue::Unit {
                value: -100.0,
                unit: "%".into()
            }
        );
        assert_eq!(
            AnimValue::parse("1.5em").unwrap(),
            AnimValue::Unit {
                value: 1.5,
                unit: "em".into()
            }
        );
        assert_eq!(AnimValue::parse("1e3").unwrap(), AnimValue::Number(1000.0));
    }

    #[test]
    fn parses_complex_transform_lists() {
        let v = AnimValue::parse("translate3d(10px, -5px, 0) rotate(45deg)").unwrap();
        assert_eq!(v.kind(), ValueKind::Complex);
        assert_eq!(v.numbers(), vec![10.0, -5.0, 0.0, 45.0]);
        assert_eq!(v.to_string(), "translate3d(10px, -5px, 0) rotate(45deg)");
    }

    #[test]
    fn colors_normalize_to_rgba() {
        let hex = AnimValue::parse("#ff8000").unwrap();
        assert_eq!(hex.numbers(), vec![255.0, 128.0, 0.0, 1.0]);
        assert_eq!(hex.to_string(), "rgba(255, 128, 0, 1)");
        let short = AnimValue::parse("#fff").unwrap();
        assert_eq!(short.numbers(), vec![255.0, 255.0, 255.0, 1.0]);
        let rgb = AnimValue::parse("rgb(1, 2, 3)").unwrap();
        assert!(rgb.is_compatible(&hex));
        assert!(AnimValue::parse("#ggg").is_err());
    }

    #[test]
    fn rejects_values_without_numbers() {
        assert!(AnimValue::parse("auto").is_err());
        assert!(AnimValue::parse("   ").is_err());
    }

    #[test]
    fn bare_number_adopts_unit() {
        let (from, to) = AnimValue::unify(
            "width",
            AnimValue::Number(0.0),
            AnimValue::parse("50%").unwrap(),
        )
        .unwrap();
        assert_eq!(from.to_string(), "0%");
        assert_eq!(to.to_string(), "50%");
    }

    #[test]
    fn unit_mismatch_is_reported() {
        let err = AnimValue::unify(
            "width",
            AnimValue::parse("10px").unwrap(),
            AnimValue::parse("50%").unwrap(),
        )
        .unwrap_err();
        assert!(
            matches!(err, AnimError::ValueMismatch { ref property, .. } if property == "width")
        );
    }

    #[test]
    fn complex_from_takes_destination_template() {
        let (from, _) = AnimValue::unify(
            "transform",
            AnimValue::parse("scale(0) rotate(0)").unwrap(),
            AnimValue::parse("scale(1) rotate(90deg)").unwrap(),
        )
        .unwrap();
        assert_eq!(from.to_string(), "scale(0) rotate(0deg)");
        assert!(AnimValue::unify(
            "transform",
            AnimValue::parse("scale(0)").unwrap(),
            AnimValue::parse("scale(1) rotate(90deg)").unwrap(),
        )
        .is_err());
    }

    #[test]
    fn serde_uses_tagged_shape() {
        let v = AnimValue::Unit {
            value: 50.0,
            unit: "%".into(),
        };
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["type"], "Unit");
        let back: AnimValue = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }
}
