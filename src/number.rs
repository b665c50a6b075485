// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.
#![allow(clippy::arithmetic_side_effects, clippy::as_conversions)]

use core::cmp::Ordering;
use core::fmt::{self, Debug, Display, Formatter};
use core::str::FromStr;

use num_bigint::{BigInt, Sign};
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::ser::Serializer;
use serde::Serialize;

use crate::Rc;

// Literals with exponents beyond this are rejected rather than expanded.
const MAX_EXPONENT: i64 = 10_000;

// Plain notation is used up to this many trailing zeros.
const MAX_PLAIN_ZEROS: i64 = 21;

// No nonzero 64-bit integer has more trailing zeros than this.
const MAX_MACHINE_ZEROS: i64 = 20;

/// An exact decimal number: `mantissa * 10^-scale`.
///
/// The representation is normalized (the mantissa carries no trailing zeros
/// and zero always has scale 0), so structural equality is numeric equality.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Number {
    mantissa: Rc<BigInt>,
    scale: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid number literal `{0}`")]
pub struct ParseNumberError(pub String);

impl Number {
    fn new(mantissa: BigInt, scale: i64) -> Self {
        if mantissa.is_zero() {
            return Number {
                mantissa: Rc::new(mantissa),
                scale: 0,
            };
        }

        // An odd mantissa has no trailing decimal zeros.
        if mantissa.trailing_zeros() == Some(0) {
            return Number {
                mantissa: Rc::new(mantissa),
                scale,
            };
        }

        let text = mantissa.magnitude().to_string();
        let zeros = text.len() - text.trim_end_matches('0').len();
        let (mantissa, scale) = match u32::try_from(zeros) {
            Ok(exp) if exp > 0 => (mantissa / pow10_bigint(exp), scale - i64::from(exp)),
            _ => (mantissa, scale),
        };

        Number {
            mantissa: Rc::new(mantissa),
            scale,
        }
    }

    pub fn zero() -> Self {
        Number::new(BigInt::zero(), 0)
    }

    pub fn is_integer(&self) -> bool {
        self.scale <= 0
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa.is_negative()
    }

    /// The integral value, when the number has no fractional part.
    pub fn to_bigint(&self) -> Option<BigInt> {
        if !self.is_integer() {
            return None;
        }
        let exp = u32::try_from(-self.scale).ok()?;
        Some(&*self.mantissa * pow10_bigint(exp))
    }

    pub fn as_i64(&self) -> Option<i64> {
        if -self.scale > MAX_MACHINE_ZEROS {
            return None;
        }
        self.to_bigint()?.to_i64()
    }

    pub fn as_u64(&self) -> Option<u64> {
        if -self.scale > MAX_MACHINE_ZEROS {
            return None;
        }
        self.to_bigint()?.to_u64()
    }

    /// Nearest binary floating point value. Lossy.
    pub fn as_f64(&self) -> Option<f64> {
        self.format_decimal().parse::<f64>().ok()
    }

    /// Canonical decimal text. Parsing it yields the same number.
    pub fn format_decimal(&self) -> String {
        let digits = self.mantissa.abs().to_string();
        let sign = if self.is_negative() { "-" } else { "" };

        if self.scale <= 0 {
            let zeros = -self.scale;
            if zeros <= MAX_PLAIN_ZEROS {
                return format!("{sign}{digits}{}", "0".repeat(zeros as usize));
            }
            return format!("{sign}{digits}e{zeros}");
        }

        let scale = self.scale as usize;
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            format!("{sign}{int_part}.{frac_part}")
        } else if self.scale <= MAX_PLAIN_ZEROS + digits.len() as i64 {
            format!("{sign}0.{}{digits}", "0".repeat(scale - digits.len()))
        } else {
            format!("{sign}{digits}e-{scale}")
        }
    }

    // Both mantissas rescaled to a common scale.
    fn aligned(&self, other: &Self) -> (BigInt, BigInt) {
        let scale = self.scale.max(other.scale);
        let lhs = rescale(&self.mantissa, scale - self.scale);
        let rhs = rescale(&other.mantissa, scale - other.scale);
        (lhs, rhs)
    }
}

fn rescale(mantissa: &BigInt, by: i64) -> BigInt {
    match u32::try_from(by) {
        Ok(0) | Err(_) => mantissa.clone(),
        Ok(exp) => mantissa * pow10_bigint(exp),
    }
}

impl Debug for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_decimal())
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_decimal())
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // serde_json carries the exact literal. Other formats only know
        // machine numbers.
        if is_serde_json::<S>() {
            let v = serde_json::Number::from_str(&self.format_decimal())
                .map_err(|_| serde::ser::Error::custom("could not serialize number"))?;
            return v.serialize(serializer);
        }

        if let Some(i) = self.as_i64() {
            serializer.serialize_i64(i)
        } else if let Some(u) = self.as_u64() {
            serializer.serialize_u64(u)
        } else {
            match self.as_f64() {
                Some(f) if f.is_finite() => serializer.serialize_f64(f),
                _ => serializer.serialize_str(&self.format_decimal()),
            }
        }
    }
}

// With `arbitrary_precision`, `serde_json::Number` serializes as a private
// marker struct that only serde_json's own serializers understand.
fn is_serde_json<S>() -> bool {
    core::any::type_name::<S>().contains("serde_json::")
}

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Self {
        Number::new(value, 0)
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        Number::new(BigInt::from(value), 0)
    }
}

impl From<usize> for Number {
    fn from(value: usize) -> Self {
        Number::new(BigInt::from(value), 0)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::new(BigInt::from(value), 0)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::new(BigInt::from(value), 0)
    }
}

impl From<u128> for Number {
    fn from(value: u128) -> Self {
        Number::new(BigInt::from(value), 0)
    }
}

impl From<i128> for Number {
    fn from(value: i128) -> Self {
        Number::new(BigInt::from(value), 0)
    }
}

impl FromStr for Number {
    type Err = ParseNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseNumberError(s.to_string());
        let trimmed = s.trim();

        let (mantissa, exponent) = match split_scientific_parts(trimmed) {
            Some((mantissa, exponent)) => {
                let exponent = exponent.parse::<i64>().map_err(|_| err())?;
                if exponent.abs() > MAX_EXPONENT {
                    return Err(err());
                }
                (mantissa, exponent)
            }
            None => (trimmed, 0),
        };

        let (negative, unsigned) = if let Some(rest) = mantissa.strip_prefix('-') {
            (true, rest)
        } else if let Some(rest) = mantissa.strip_prefix('+') {
            (false, rest)
        } else {
            (false, mantissa)
        };

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (unsigned, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let digits = format!("{int_part}{frac_part}");
        let significant = digits.trim_end_matches('0');
        if significant.is_empty() {
            return Ok(Number::zero());
        }
        let zeros = (digits.len() - significant.len()) as i64;

        let mut value = BigInt::parse_bytes(significant.as_bytes(), 10).ok_or_else(err)?;
        if negative {
            value = -value;
        }

        Ok(Number::new(value, frac_part.len() as i64 - zeros - exponent))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.mantissa.sign(), other.mantissa.sign()) {
            (a, b) if a != b => sign_rank(a).cmp(&sign_rank(b)),
            _ => {
                let (lhs, rhs) = self.aligned(other);
                lhs.cmp(&rhs)
            }
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn sign_rank(sign: Sign) -> i8 {
    match sign {
        Sign::Minus => -1,
        Sign::NoSign => 0,
        Sign::Plus => 1,
    }
}

fn pow10_bigint(exp: u32) -> BigInt {
    if exp == 0 {
        return BigInt::one();
    }

    let mut result = BigInt::one();
    let mut base = BigInt::from(10u8);
    let mut e = exp;

    while e > 0 {
        if e & 1 == 1 {
            result *= &base;
        }
        if e > 1 {
            base = &base * &base;
        }
        e >>= 1;
    }

    result
}

fn split_scientific_parts(input: &str) -> Option<(&str, &str)> {
    let idx = input.find(['e', 'E'])?;
    let mantissa = &input[..idx];
    let exponent = &input[idx + 1..];
    Some((mantissa, exponent))
}
