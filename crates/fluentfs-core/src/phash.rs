//! Perceptual-hash fingerprints and their comparison.
//!
//! A [`PhashString`] is a 64-bit fingerprint, written as 16 lowercase hex
//! digits. Two fingerprints are compared by Hamming distance against a
//! [`PhashThreshold`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of bits in a fingerprint.
pub const PHASH_BITS: u32 = 64;

/// A malformed fingerprint string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhashParseError {
    #[error("expected 1 to 16 hex digits, got {0:?}")]
    Hex(String),
    #[error("expected exactly 64 binary digits, got {0:?}")]
    Binary(String),
}

/// A 64-bit perceptual fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhashString(u64);

impl PhashString {
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Parses up to 16 hex digits, either case. Shorter input is
    /// left-padded with zeros.
    pub fn from_hex(hex: &str) -> Result<Self, PhashParseError> {
        let valid = !hex.is_empty() && hex.len() <= 16 && hex.bytes().all(|b| b.is_ascii_hexdigit());
        if !valid {
            return Err(PhashParseError::Hex(hex.to_owned()));
        }
        u64::from_str_radix(hex, 16)
            .map(Self)
            .map_err(|_| PhashParseError::Hex(hex.to_owned()))
    }

    /// 16 lowercase hex digits.
    pub fn to_hex(self) -> String {
        format!("{:016x}", self.0)
    }

    pub fn from_binary(binary: &str) -> Result<Self, PhashParseError> {
        let valid = binary.len() == PHASH_BITS as usize && binary.bytes().all(|b| b == b'0' || b == b'1');
        if !valid {
            return Err(PhashParseError::Binary(binary.to_owned()));
        }
        u64::from_str_radix(binary, 2)
            .map(Self)
            .map_err(|_| PhashParseError::Binary(binary.to_owned()))
    }

    /// 64 characters of `0` and `1`, most significant bit first.
    pub fn to_binary(self) -> String {
        format!("{:064b}", self.0)
    }

    /// Number of differing bits.
    pub fn distance(self, other: Self) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

impl fmt::Display for PhashString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for PhashString {
    type Err = PhashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for PhashString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PhashString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

/// A threshold outside `0..=64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("phash threshold must be between 0 and 64, got {0}")]
pub struct ThresholdError(pub u32);

/// Hamming distance below which two fingerprints count as similar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PhashThreshold(u32);

impl PhashThreshold {
    pub const DEFAULT: Self = Self(6);

    pub fn new(value: u32) -> Result<Self, ThresholdError> {
        if value > PHASH_BITS {
            return Err(ThresholdError(value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for PhashThreshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for PhashThreshold {
    type Error = ThresholdError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PhashThreshold> for u32 {
    fn from(threshold: PhashThreshold) -> Self {
        threshold.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Similarity {
    Same,
    Similar,
    Different,
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Same => "same",
            Self::Similar => "similar",
            Self::Different => "different",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhashComparison {
    pub level: Similarity,
    pub diff: u32,
}

/// Classifies two fingerprints.
///
/// Identical fingerprints are [`Similarity::Same`] with a `diff` of 0.
/// Otherwise they are [`Similarity::Similar`] when fewer than `threshold`
/// bits differ.
pub fn compare_phashes(a: PhashString, b: PhashString, threshold: PhashThreshold) -> PhashComparison {
    if a == b {
        return PhashComparison {
            level: Similarity::Same,
            diff: 0,
        };
    }
    let diff = a.distance(b);
    let level = if diff < threshold.get() {
        Similarity::Similar
    } else {
        Similarity::Different
    };
    PhashComparison { level, diff }
}

/// `true` unless [`compare_phashes`] would say [`Similarity::Different`].
///
/// Stops counting as soon as the threshold is reached.
pub fn phashes_match(a: PhashString, b: PhashString, threshold: PhashThreshold) -> bool {
    if a == b {
        return true;
    }
    let mut differing = a.0 ^ b.0;
    let mut diff = 0;
    while differing != 0 {
        differing &= differing - 1;
        diff += 1;
        if diff >= threshold.get() {
            return false;
        }
    }
    true
}
