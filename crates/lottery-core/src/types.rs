//! Ledger value types — account addresses and wei amounts

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Decimal places between wei and ether
const ETHER_DECIMALS: u32 = 18;
const GWEI_DECIMALS: u32 = 9;
const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

// ── Address ───────────────────────────────────────────────

/// A 20-byte account reference, rendered as `0x`-prefixed lowercase hex
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Derive an address from arbitrary seed material: the last 20 bytes
    /// of its SHA-256 digest.
    pub fn derive(seed: &[u8]) -> Self {
        let digest = Sha256::digest(seed);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.len() != 40 {
            return Err(Error::InvalidAddress(format!(
                "'{}' must be 40 hex digits",
                s
            )));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| Error::InvalidAddress(format!("'{}': {}", s, e)))?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// ── Amount ────────────────────────────────────────────────

/// A non-negative value in wei (10^18 wei = 1 ether)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_wei(wei: u128) -> Self {
        Amount(wei)
    }

    /// Whole ether
    pub const fn ether(ether: u64) -> Self {
        Amount(ether as u128 * WEI_PER_ETHER)
    }

    pub const fn as_wei(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Result<Amount> {
        self.0
            .checked_add(other.0)
            .map(Amount)
            .ok_or(Error::AmountOverflow)
    }

    pub fn checked_sub(self, other: Amount) -> Result<Amount> {
        self.0
            .checked_sub(other.0)
            .map(Amount)
            .ok_or(Error::AmountUnderflow)
    }

    /// Parse a decimal string scaled by `10^decimals` (the `toWei` rule)
    fn parse_units(text: &str, decimals: u32) -> Result<u128> {
        let invalid = || Error::InvalidAmount(format!("'{}'", text));
        let (whole, fraction) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        if fraction.len() > decimals as usize {
            return Err(Error::InvalidAmount(format!(
                "'{}' has more than {} decimal places",
                text, decimals
            )));
        }

        let scale = 10u128.pow(decimals);
        let whole_value = if whole.is_empty() {
            0
        } else {
            whole.parse::<u128>().map_err(|_| Error::AmountOverflow)?
        };
        let fraction_value = if fraction.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", fraction, width = decimals as usize);
            padded.parse::<u128>().map_err(|_| invalid())?
        };

        whole_value
            .checked_mul(scale)
            .and_then(|v| v.checked_add(fraction_value))
            .ok_or(Error::AmountOverflow)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / WEI_PER_ETHER;
        let fraction = self.0 % WEI_PER_ETHER;
        if fraction == 0 {
            write!(f, "{} ether", whole)
        } else {
            let digits = format!("{:018}", fraction);
            write!(f, "{}.{} ether", whole, digits.trim_end_matches('0'))
        }
    }
}

impl FromStr for Amount {
    type Err = Error;

    /// Accepts `"<decimal> ether"`, `"<decimal> gwei"`, `"<integer> wei"`,
    /// or a bare integer in wei.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let number = parts
            .next()
            .ok_or_else(|| Error::InvalidAmount("empty amount".into()))?;
        let unit = parts.next().unwrap_or("wei");
        if parts.next().is_some() {
            return Err(Error::InvalidAmount(format!("'{}'", s)));
        }

        let decimals = match unit.to_ascii_lowercase().as_str() {
            "ether" | "eth" => ETHER_DECIMALS,
            "gwei" => GWEI_DECIMALS,
            "wei" => 0,
            other => {
                return Err(Error::InvalidAmount(format!("unknown unit '{}'", other)));
            }
        };
        Amount::parse_units(number, decimals).map(Amount)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Accepts an amount string or an integer in wei.
///
/// JSON integers above `u64::MAX` reach the visitor as floats and are
/// rejected; such amounts must be written as strings.
struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an amount string like \"0.02 ether\" or an integer in wei")
    }

    fn visit_str<E: de::Error>(self, text: &str) -> std::result::Result<Amount, E> {
        text.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, wei: u64) -> std::result::Result<Amount, E> {
        Ok(Amount::from_wei(wei as u128))
    }

    fn visit_u128<E: de::Error>(self, wei: u128) -> std::result::Result<Amount, E> {
        Ok(Amount::from_wei(wei))
    }

    fn visit_i64<E: de::Error>(self, wei: i64) -> std::result::Result<Amount, E> {
        u64::try_from(wei)
            .map(|wei| Amount::from_wei(wei as u128))
            .map_err(|_| E::custom(Error::InvalidAmount(format!("'{}' is negative", wei))))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<Amount, E> {
        Err(E::custom(Error::InvalidAmount(format!(
            "'{}' is not an integer up to {}; write large amounts as a string",
            value,
            u64::MAX
        ))))
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}
