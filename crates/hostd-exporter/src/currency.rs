// Copyright 2026 Boundless Foundation, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Fixed-point currency handling.
//!
//! The node reports every amount as an integer number of hastings, the smallest currency unit.
//! A whole siacoin is 10^24 hastings, so realistic balances overflow the 53 bit integer range of
//! an `f64` long before they overflow a `u128`. Conversion to a human-scale decimal is therefore
//! done on big integers and only rounded to floating point once, at the end.

use std::{fmt, str::FromStr};

use num_bigint::BigUint;
use num_traits::{Float, ToPrimitive, Zero};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Number of hastings in one siacoin.
pub const HASTINGS_PER_SIACOIN: u128 = 1_000_000_000_000_000_000_000_000;

/// Bits of precision kept in the quotient before the final rounding to `f64`.
const QUOTIENT_BITS: u64 = 64;

/// An amount of hastings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Currency(u128);

impl Currency {
    pub const ZERO: Currency = Currency(0);

    pub const fn new(hastings: u128) -> Self {
        Self(hastings)
    }

    /// Whole siacoins expressed in hastings.
    pub const fn siacoins(coins: u64) -> Self {
        Self(coins as u128 * HASTINGS_PER_SIACOIN)
    }

    pub const fn hastings(&self) -> u128 {
        self.0
    }

    pub fn to_biguint(self) -> BigUint {
        BigUint::from(self.0)
    }

    /// Converts to siacoins as a floating point value.
    pub fn to_siacoins(self) -> f64 {
        ratio_to_f64(&self.to_biguint(), &BigUint::from(HASTINGS_PER_SIACOIN))
    }

    /// Converts `self * multiplier` to siacoins, multiplying before any rounding takes place.
    ///
    /// Used for unit prices such as hastings per byte, where the interesting quantity is the price
    /// of a terabyte.
    pub fn to_siacoins_scaled(self, multiplier: u64) -> f64 {
        ratio_to_f64(&(self.to_biguint() * multiplier), &BigUint::from(HASTINGS_PER_SIACOIN))
    }

    /// Converts a siacoin value back to hastings, rounding to the nearest hasting.
    ///
    /// Returns `None` for negative, non-finite or out of range values.
    pub fn from_siacoins(coins: f64) -> Option<Self> {
        if !coins.is_finite() || coins < 0.0 {
            return None;
        }
        let (mantissa, exponent, _) = coins.integer_decode();
        let scaled = BigUint::from(mantissa) * HASTINGS_PER_SIACOIN;
        let hastings = if exponent >= 0 {
            scaled << exponent as u64
        } else {
            let shift = exponent.unsigned_abs() as u64;
            let half = BigUint::from(1u8) << (shift - 1);
            (scaled + half) >> shift
        };
        hastings.to_u128().map(Currency)
    }
}

/// Divides `numerator` by `denominator` and rounds the exact quotient to the nearest `f64`.
///
/// The numerator is shifted left until the integer quotient carries at least 64 significant bits,
/// so the only rounding is the final conversion of that quotient. Returns `0.0` for a zero
/// denominator.
pub fn ratio_to_f64(numerator: &BigUint, denominator: &BigUint) -> f64 {
    if numerator.is_zero() || denominator.is_zero() {
        return 0.0;
    }
    let shift = (QUOTIENT_BITS + denominator.bits()).saturating_sub(numerator.bits());
    let quotient = (numerator << shift) / denominator;
    let Some(value) = quotient.to_f64() else {
        return f64::INFINITY;
    };
    if shift == 0 {
        value
    } else {
        value * 2f64.powi(-(shift as i32))
    }
}

impl From<u128> for Currency {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Currency {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u128>().map(Currency)
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CurrencyVisitor;

        impl de::Visitor<'_> for CurrencyVisitor {
            type Value = Currency;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a non-negative integer amount of hastings, as a string or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Currency, E> {
                v.parse().map_err(|e| E::custom(format!("invalid currency {v:?}: {e}")))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Currency, E> {
                Ok(Currency(v as u128))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<Currency, E> {
                Ok(Currency(v))
            }
        }

        deserializer.deserialize_any(CurrencyVisitor)
    }
}
