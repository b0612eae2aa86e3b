use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use num_traits::{One, Signed, ToPrimitive, Zero};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::errors::{MortgageError, Result};

/// significant digits kept after a division
pub const DIVISION_PRECISION: u32 = 34;

/// rounding mode used when an exact value has to be cut to a fixed scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoundingMode {
    /// 2.345 -> 2.35, -2.345 -> -2.35
    #[default]
    HalfAwayFromZero,
    /// banker's rounding
    HalfEven,
    /// towards positive infinity
    Ceiling,
    /// towards negative infinity
    Floor,
    /// towards zero
    Down,
    /// away from zero
    Up,
}

impl RoundingMode {
    /// whether dropping `remainder / divisor` (both positive, remainder
    /// smaller) moves the magnitude `quotient` one unit away from zero
    fn rounds_away(self, negative: bool, quotient: &BigInt, remainder: &BigInt, divisor: &BigInt) -> bool {
        let twice = remainder + remainder;
        match self {
            RoundingMode::HalfAwayFromZero => twice >= *divisor,
            RoundingMode::HalfEven => match twice.cmp(divisor) {
                Ordering::Greater => true,
                Ordering::Less => false,
                Ordering::Equal => !(quotient % BigInt::from(2u8)).is_zero(),
            },
            RoundingMode::Ceiling => !negative,
            RoundingMode::Floor => negative,
            RoundingMode::Down => false,
            RoundingMode::Up => true,
        }
    }
}

fn ten_pow(exponent: u64) -> BigInt {
    num_traits::pow(BigInt::from(10u8), exponent as usize)
}

fn digit_count(value: &BigInt) -> u64 {
    if value.is_zero() {
        1
    } else {
        value.magnitude().to_string().len() as u64
    }
}

/// bounds on the decimal digits of a nonzero integer, from its bit length
fn digit_bounds(value: &BigInt) -> (i64, i64) {
    let bits = value.bits() as i64;
    ((bits - 1) * 30_103 / 100_000 + 1, bits * 30_103 / 100_000 + 1)
}

/// `numerator / divisor` rounded to an integer; `divisor` is positive
fn round_quotient(numerator: &BigInt, divisor: &BigInt, mode: RoundingMode) -> BigInt {
    let negative = numerator.sign() == Sign::Minus;
    let magnitude = numerator.abs();
    let mut quotient = &magnitude / divisor;
    let remainder = &magnitude % divisor;
    if !remainder.is_zero() && mode.rounds_away(negative, &quotient, &remainder, divisor) {
        quotient += BigInt::one();
    }
    if negative {
        -quotient
    } else {
        quotient
    }
}

/// round to `scale` fractional digits; values already that short are kept
fn round_to_scale(value: &BigDecimal, scale: i64, mode: RoundingMode) -> BigDecimal {
    let (digits, exponent) = value.as_bigint_and_exponent();
    if exponent <= scale {
        return value.clone();
    }
    let divisor = ten_pow((exponent - scale) as u64);
    BigDecimal::new(round_quotient(&digits, &divisor, mode), scale)
}

/// divide, keeping [`DIVISION_PRECISION`] significant digits, half away from zero
fn divide_decimal(numerator: &BigDecimal, denominator: &BigDecimal) -> Result<BigDecimal> {
    if denominator.is_zero() {
        return Err(MortgageError::DivisionByZero);
    }
    if numerator.is_zero() {
        return Ok(BigDecimal::zero());
    }

    let (n_digits, n_scale) = numerator.as_bigint_and_exponent();
    let (d_digits, d_scale) = denominator.as_bigint_and_exponent();

    // widen the numerator until the truncated quotient has more digits than kept
    let (n_lower, _) = digit_bounds(&n_digits);
    let (_, d_upper) = digit_bounds(&d_digits);
    let shift = (DIVISION_PRECISION as i64 + 1 + d_upper - n_lower).max(0);
    let widened = n_digits * ten_pow(shift as u64);

    let negative = (widened.sign() == Sign::Minus) != (d_digits.sign() == Sign::Minus);
    let magnitude = widened.abs() / d_digits.abs();
    let truncated = if negative { -magnitude } else { magnitude };

    // truncation never crosses the rounding midpoint: the dropped remainder
    // is below one unit of the last quotient digit
    let excess = digit_count(&truncated).saturating_sub(DIVISION_PRECISION as u64);
    let rounded = round_quotient(&truncated, &ten_pow(excess), RoundingMode::HalfAwayFromZero);
    Ok(BigDecimal::new(rounded, n_scale + shift - d_scale - excess as i64))
}

fn from_rust_decimal(d: Decimal) -> BigDecimal {
    BigDecimal::new(BigInt::from(d.mantissa()), i64::from(d.scale()))
}

fn from_integer(i: i64) -> BigDecimal {
    BigDecimal::new(BigInt::from(i), 0)
}

fn parse_decimal(s: &str) -> Result<BigDecimal> {
    BigDecimal::from_str(s.trim()).map_err(|e| MortgageError::InvalidInput {
        message: format!("invalid decimal {s:?}: {e}"),
    })
}

/// plain notation of `digits x 10^-scale`, never scientific
fn render(digits: &BigInt, scale: i64) -> String {
    if scale <= 0 {
        return (digits * ten_pow(scale.unsigned_abs())).to_string();
    }
    let scale = scale as usize;
    let magnitude = digits.magnitude().to_string();
    let padded = format!("{magnitude:0>width$}", width = scale + 1);
    let (whole, fraction) = padded.split_at(padded.len() - scale);
    let sign = if digits.sign() == Sign::Minus { "-" } else { "" };
    format!("{sign}{whole}.{fraction}")
}

fn plain(value: &BigDecimal) -> String {
    let (digits, scale) = value.as_bigint_and_exponent();
    render(&digits, scale)
}

fn trim_trailing_zeros(text: String) -> String {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// render with exactly `scale` fractional digits
fn format_decimal(value: &BigDecimal, scale: i32) -> Result<String> {
    if scale < 0 {
        return Err(MortgageError::InvalidScale { scale });
    }
    let scale = i64::from(scale);
    let (digits, exponent) = round_to_scale(value, scale, RoundingMode::HalfAwayFromZero).as_bigint_and_exponent();
    let padded = digits * ten_pow((scale - exponent) as u64);
    Ok(render(&padded, scale))
}

/// exact monetary amount in an unspecified currency
///
/// Addition, subtraction and multiplication are exact at any size. Division
/// rounds to [`DIVISION_PRECISION`] significant digits, half away from zero.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Amount(BigDecimal);

impl Amount {
    pub fn zero() -> Self {
        Amount(BigDecimal::zero())
    }

    /// create from decimal without any rounding
    pub fn from_decimal(d: Decimal) -> Self {
        Amount(from_rust_decimal(d))
    }

    /// create from whole currency units
    pub fn from_major(amount: i64) -> Self {
        Amount(from_integer(amount))
    }

    /// create from whole currency units beyond the i64 range
    pub fn from_i128(amount: i128) -> Self {
        Amount(BigDecimal::new(BigInt::from(amount), 0))
    }

    /// create from minor units, e.g. cents with `scale` 2
    pub fn from_minor(amount: i64, scale: u32) -> Self {
        Amount(BigDecimal::new(BigInt::from(amount), i64::from(scale)))
    }

    /// parse a decimal literal exactly
    pub fn from_str_exact(s: &str) -> Result<Self> {
        parse_decimal(s).map(Amount)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > BigDecimal::zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0 < BigDecimal::zero()
    }

    pub fn abs(&self) -> Self {
        if self.is_negative() {
            -self
        } else {
            self.clone()
        }
    }

    /// divide by another amount, keeping the result as an amount
    pub fn divide(&self, divisor: &Amount) -> Result<Amount> {
        divide_decimal(&self.0, &divisor.0).map(Amount)
    }

    /// divide by an integer count, e.g. remaining months
    pub fn divide_by(&self, divisor: i64) -> Result<Amount> {
        divide_decimal(&self.0, &from_integer(divisor)).map(Amount)
    }

    /// divide by a ratio, e.g. an annuity growth factor
    pub fn divide_by_fraction(&self, divisor: &Fraction) -> Result<Amount> {
        divide_decimal(&self.0, &divisor.0).map(Amount)
    }

    /// ratio of two amounts, e.g. a loan-to-value ratio
    pub fn ratio(&self, denominator: &Amount) -> Result<Fraction> {
        divide_decimal(&self.0, &denominator.0).map(Fraction)
    }

    /// round to the given number of fractional digits
    pub fn round_dp(&self, dp: u32, mode: RoundingMode) -> Self {
        Amount(round_to_scale(&self.0, i64::from(dp), mode))
    }

    pub fn rounded_to_the_cent(&self) -> Self {
        self.rounded_to_the_cent_with(RoundingMode::HalfAwayFromZero)
    }

    pub fn rounded_to_the_cent_with(&self, mode: RoundingMode) -> Self {
        self.round_dp(2, mode)
    }

    /// whole units, fraction dropped; `None` outside the i64 range
    pub fn to_i64(&self) -> Option<i64> {
        let (digits, exponent) = round_to_scale(&self.0, 0, RoundingMode::Down).as_bigint_and_exponent();
        // exponent is zero or negative once the fraction is gone
        (digits * ten_pow(exponent.unsigned_abs())).to_i64()
    }

    /// render with exactly `scale` fractional digits, half away from zero
    pub fn format(&self, scale: i32) -> Result<String> {
        format_decimal(&self.0, scale)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&plain(&self.0))
    }
}

impl FromStr for Amount {
    type Err = MortgageError;

    fn from_str(s: &str) -> Result<Self> {
        Amount::from_str_exact(s)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&plain(&self.0))
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_decimal(&text).map(Amount).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(d: Decimal) -> Self {
        Amount::from_decimal(d)
    }
}

impl From<i64> for Amount {
    fn from(i: i64) -> Self {
        Amount::from_major(i)
    }
}

impl From<i32> for Amount {
    fn from(i: i32) -> Self {
        Amount::from_major(i64::from(i))
    }
}

/// owned and mixed operand forms, all forwarding to the `&a op &b` impl
macro_rules! forward_binop {
    ($imp:ident, $method:ident, $lhs:ty, $rhs:ty, $out:ty) => {
        impl $imp<$rhs> for $lhs {
            type Output = $out;

            fn $method(self, other: $rhs) -> $out {
                $imp::$method(&self, &other)
            }
        }

        impl $imp<&$rhs> for $lhs {
            type Output = $out;

            fn $method(self, other: &$rhs) -> $out {
                $imp::$method(&self, other)
            }
        }

        impl $imp<$rhs> for &$lhs {
            type Output = $out;

            fn $method(self, other: $rhs) -> $out {
                $imp::$method(self, &other)
            }
        }
    };
}

impl Add<&Amount> for &Amount {
    type Output = Amount;

    fn add(self, other: &Amount) -> Amount {
        Amount(&self.0 + &other.0)
    }
}

impl Sub<&Amount> for &Amount {
    type Output = Amount;

    fn sub(self, other: &Amount) -> Amount {
        Amount(&self.0 - &other.0)
    }
}

impl Mul<&Fraction> for &Amount {
    type Output = Amount;

    fn mul(self, other: &Fraction) -> Amount {
        Amount(&self.0 * &other.0)
    }
}

forward_binop!(Add, add, Amount, Amount, Amount);
forward_binop!(Sub, sub, Amount, Amount, Amount);
forward_binop!(Mul, mul, Amount, Fraction, Amount);

impl AddAssign for Amount {
    fn add_assign(&mut self, other: Amount) {
        *self = &*self + &other;
    }
}

impl AddAssign<&Amount> for Amount {
    fn add_assign(&mut self, other: &Amount) {
        *self = &*self + other;
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, other: Amount) {
        *self = &*self - &other;
    }
}

impl SubAssign<&Amount> for Amount {
    fn sub_assign(&mut self, other: &Amount) {
        *self = &*self - other;
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        Amount(-self.0)
    }
}

impl Neg for &Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        Amount(-self.0.clone())
    }
}

impl Mul<i64> for &Amount {
    type Output = Amount;

    fn mul(self, other: i64) -> Amount {
        Amount(&self.0 * &from_integer(other))
    }
}

impl Mul<i64> for Amount {
    type Output = Amount;

    fn mul(self, other: i64) -> Amount {
        &self * other
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::zero(), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
        iter.fold(Amount::zero(), |acc, x| acc + x)
    }
}

/// exact ratio for interest rates, percentages and day-count factors
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Fraction(BigDecimal);

impl Fraction {
    pub fn zero() -> Self {
        Fraction(BigDecimal::zero())
    }

    pub fn one() -> Self {
        Fraction(BigDecimal::one())
    }

    /// create from decimal (e.g., 0.0358 for 3.58%)
    pub fn from_decimal(d: Decimal) -> Self {
        Fraction(from_rust_decimal(d))
    }

    /// create from a percentage literal (e.g., 3.58 for 3.58%)
    pub fn from_percentage(p: Decimal) -> Self {
        Fraction(BigDecimal::new(BigInt::from(p.mantissa()), i64::from(p.scale()) + 2))
    }

    /// create from an integer ratio, e.g. 31/365
    pub fn from_ratio(numerator: i64, denominator: i64) -> Result<Self> {
        divide_decimal(&from_integer(numerator), &from_integer(denominator)).map(Fraction)
    }

    /// parse a decimal literal exactly, e.g. "0.0358"
    pub fn from_str_exact(s: &str) -> Result<Self> {
        parse_decimal(s).map(Fraction)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn divide_by(&self, divisor: i64) -> Result<Fraction> {
        divide_decimal(&self.0, &from_integer(divisor)).map(Fraction)
    }

    pub fn divide(&self, divisor: &Fraction) -> Result<Fraction> {
        divide_decimal(&self.0, &divisor.0).map(Fraction)
    }

    /// integer power by repeated squaring, exact
    pub fn pow(&self, exponent: u32) -> Fraction {
        let mut result = BigDecimal::one();
        let mut base = self.0.clone();
        let mut remaining = exponent;
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = &result * &base;
            }
            remaining >>= 1;
            if remaining > 0 {
                base = &base * &base;
            }
        }
        Fraction(result)
    }

    fn percentage(&self) -> BigDecimal {
        let (digits, scale) = self.0.as_bigint_and_exponent();
        BigDecimal::new(digits, scale - 2)
    }

    /// render as a percentage with exactly `scale` fractional digits
    pub fn format_percentage(&self, scale: i32) -> Result<String> {
        format_decimal(&self.percentage(), scale)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", trim_trailing_zeros(plain(&self.percentage())))
    }
}

impl FromStr for Fraction {
    type Err = MortgageError;

    fn from_str(s: &str) -> Result<Self> {
        Fraction::from_str_exact(s)
    }
}

impl Serialize for Fraction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&plain(&self.0))
    }
}

impl<'de> Deserialize<'de> for Fraction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_decimal(&text).map(Fraction).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Fraction {
    fn from(d: Decimal) -> Self {
        Fraction::from_decimal(d)
    }
}

impl Add<&Fraction> for &Fraction {
    type Output = Fraction;

    fn add(self, other: &Fraction) -> Fraction {
        Fraction(&self.0 + &other.0)
    }
}

impl Sub<&Fraction> for &Fraction {
    type Output = Fraction;

    fn sub(self, other: &Fraction) -> Fraction {
        Fraction(&self.0 - &other.0)
    }
}

impl Mul<&Fraction> for &Fraction {
    type Output = Fraction;

    fn mul(self, other: &Fraction) -> Fraction {
        Fraction(&self.0 * &other.0)
    }
}

forward_binop!(Add, add, Fraction, Fraction, Fraction);
forward_binop!(Sub, sub, Fraction, Fraction, Fraction);
forward_binop!(Mul, mul, Fraction, Fraction, Fraction);

impl Mul<i64> for &Fraction {
    type Output = Fraction;

    fn mul(self, other: i64) -> Fraction {
        Fraction(&self.0 * &from_integer(other))
    }
}

impl Mul<i64> for Fraction {
    type Output = Fraction;

    fn mul(self, other: i64) -> Fraction {
        &self * other
    }
}
