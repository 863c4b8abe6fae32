//! Resource quantities in the textual form used by pod manifests
//! (`2`, `500m`, `1Gi`, `1.5G`, `3e6`).
//!
//! A quantity keeps the string it was parsed from and an exact
//! representation `mantissa * 2^exp2 * 10^exp10`, so integer conversion
//! can tell whether the value is really a whole number.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const RESOURCE_CPU: &str = "cpu";
pub const RESOURCE_MEMORY: &str = "memory";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("invalid quantity {0:?}")]
    InvalidFormat(String),
    #[error("quantity {0} has a fractional part")]
    NotAnInteger(String),
    #[error("quantity {0} does not fit in a 64-bit integer")]
    Overflow(String),
}

#[derive(Debug, Clone)]
pub struct Quantity {
    repr: String,
    mantissa: i128,
    exp2: u32,
    exp10: i32,
}

impl Quantity {
    pub fn parse(input: &str) -> Result<Self, QuantityError> {
        let invalid = || QuantityError::InvalidFormat(input.to_string());
        let s = input.trim();

        let (negative, rest) = match s.as_bytes().first().copied() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, suffix) = rest.split_at(number_len);

        let (int_part, frac_part) = match number.split_once('.') {
            Some((i, f)) => (i, f),
            None => (number, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if frac_part.contains('.') {
            return Err(invalid());
        }

        let mut mantissa: i128 = 0;
        for digit in int_part.bytes().chain(frac_part.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(i128::from(digit - b'0')))
                .ok_or_else(|| QuantityError::Overflow(input.to_string()))?;
        }
        if negative {
            mantissa = -mantissa;
        }

        let frac_len = i32::try_from(frac_part.len()).map_err(|_| invalid())?;
        let (exp2, suffix_exp10) = parse_suffix(suffix).ok_or_else(invalid)?;

        Ok(Quantity {
            repr: s.to_string(),
            mantissa,
            exp2,
            exp10: suffix_exp10.checked_sub(frac_len).ok_or_else(invalid)?,
        })
    }

    /// Exact integer value of the quantity.
    ///
    /// Fails when the value has a fractional part (`500m` cpu) or is
    /// outside the `i64` range.
    pub fn as_i64(&self) -> Result<i64, QuantityError> {
        let overflow = || QuantityError::Overflow(self.repr.clone());

        let mut value = self.mantissa;
        if value == 0 {
            return Ok(0);
        }
        if self.exp2 > 0 {
            let factor = 1i128.checked_shl(self.exp2).ok_or_else(overflow)?;
            value = value.checked_mul(factor).ok_or_else(overflow)?;
        }

        if self.exp10 >= 0 {
            for _ in 0..self.exp10 {
                value = value.checked_mul(10).ok_or_else(overflow)?;
            }
        } else {
            for _ in 0..self.exp10.unsigned_abs() {
                if value % 10 != 0 {
                    return Err(QuantityError::NotAnInteger(self.repr.clone()));
                }
                value /= 10;
            }
        }

        i64::try_from(value).map_err(|_| overflow())
    }

    pub fn as_str(&self) -> &str {
        &self.repr
    }
}

/// Returns `(binary exponent, decimal exponent)` for a suffix.
fn parse_suffix(suffix: &str) -> Option<(u32, i32)> {
    let parsed = match suffix {
        "" => (0, 0),
        "Ki" => (10, 0),
        "Mi" => (20, 0),
        "Gi" => (30, 0),
        "Ti" => (40, 0),
        "Pi" => (50, 0),
        "Ei" => (60, 0),
        "n" => (0, -9),
        "u" => (0, -6),
        "m" => (0, -3),
        "k" => (0, 3),
        "M" => (0, 6),
        "G" => (0, 9),
        "T" => (0, 12),
        "P" => (0, 15),
        "E" => (0, 18),
        _ => {
            let exponent = suffix
                .strip_prefix('e')
                .or_else(|| suffix.strip_prefix('E'))?;
            (0, exponent.parse::<i32>().ok()?)
        }
    };
    Some(parsed)
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quantity::parse(s)
    }
}

impl From<i64> for Quantity {
    fn from(value: i64) -> Self {
        Quantity {
            repr: value.to_string(),
            mantissa: i128::from(value),
            exp2: 0,
            exp10: 0,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repr)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.repr)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Manifests write `cpu: 2` as often as `cpu: "2"`
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
            Float(f64),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s,
            Raw::Int(i) => i.to_string(),
            Raw::Float(f) => f.to_string(),
        };
        Quantity::parse(&text).map_err(serde::de::Error::custom)
    }
}
