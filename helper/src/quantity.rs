use core::fmt;
use std::str::FromStr;

use lazy_regex::regex;
use serde::de::Visitor;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unable to parse the quantity: {0}")]
    QuantityParsing(String),
}

/// A resource quantity following the suffix convention of the cluster
/// node status, e.g. "500m", "2", "4Gi", "128e6".
///
/// Suffixes are the decimal SI prefixes (k, M, G, T, P, E), the binary
/// prefixes (Ki, Mi, Gi, Ti, Pi, Ei) and m for milli.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    value: f64,
}

impl Quantity {
    pub fn new(value: f64) -> Self { Self { value } }

    /// The quantity in integer milli-units, rounded away from zero at
    /// the milli scale.
    pub fn milli_value(&self) -> i64 { scale_integer(self.value * 1000.0) }

    /// The quantity in integer units, rounded away from zero.
    pub fn value(&self) -> i64 { scale_integer(self.value) }

    /// The quantity truncated toward zero, the reading used for count
    /// dimensions.
    pub fn as_i64(&self) -> i64 { self.value.trunc() as i64 }
}

/// Rounds away from zero, except when `value` sits within float noise
/// of an integer. The noise comes from decimal inputs such as "0.1"
/// that have no exact binary representation.
fn scale_integer(value: f64) -> i64 {
    let nearest = value.round();
    if (value - nearest).abs() < 1e-9 * nearest.abs().max(1.0) {
        return nearest as i64;
    }
    if value > 0.0 {
        value.ceil() as i64
    } else {
        value.floor() as i64
    }
}

fn suffix_multiplier(suffix: &str) -> Option<f64> {
    match suffix {
        "" => Some(1.0),
        "m" => Some(1e-3),
        "k" => Some(1e3),
        "M" => Some(1e6),
        "G" => Some(1e9),
        "T" => Some(1e12),
        "P" => Some(1e15),
        "E" => Some(1e18),
        "Ki" => Some(f64::powi(1024.0, 1)),
        "Mi" => Some(f64::powi(1024.0, 2)),
        "Gi" => Some(f64::powi(1024.0, 3)),
        "Ti" => Some(f64::powi(1024.0, 4)),
        "Pi" => Some(f64::powi(1024.0, 5)),
        "Ei" => Some(f64::powi(1024.0, 6)),
        _ => None,
    }
}

impl FromStr for Quantity {
    type Err = Error;

    fn from_str(quantity: &str) -> Result<Self, Self::Err> {
        let re = regex!(
            r"^([0-9]+(?:\.[0-9]+)?(?:[eE][-+]?[0-9]+)?)\s*([A-Za-z]*)$"
        );

        let captures = re
            .captures(quantity.trim())
            .ok_or_else(|| Error::QuantityParsing(quantity.to_string()))?;
        let measure = captures
            .get(1)
            .ok_or_else(|| Error::QuantityParsing(quantity.to_string()))?
            .as_str()
            .parse::<f64>()
            .map_err(|_| Error::QuantityParsing(quantity.to_string()))?;
        let suffix = captures.get(2).map(|cap| cap.as_str()).unwrap_or("");
        let multiplier = suffix_multiplier(suffix)
            .ok_or_else(|| Error::QuantityParsing(quantity.to_string()))?;

        Ok(Quantity { value: measure * multiplier })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.fract() == 0.0 {
            write!(f, "{}", self.value as i64)
        } else {
            write!(f, "{}m", self.milli_value())
        }
    }
}

impl Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct QuantityVisitor;

        impl<'de> Visitor<'de> for QuantityVisitor {
            type Value = Quantity;

            fn expecting(
                &self,
                formatter: &mut fmt::Formatter,
            ) -> fmt::Result {
                formatter.write_str(
                    "a quantity resembling '<value><suffix>', e.g. '500m'",
                )
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(QuantityVisitor)
    }
}
