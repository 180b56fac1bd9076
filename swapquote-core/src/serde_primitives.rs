//! `#[serde(with = ...)]` helpers for big integers.
//!
//! Snapshot amounts routinely exceed `u64`, and JSON numbers lose precision long before that, so
//! big integers travel as decimal strings. Plain JSON integers are still accepted on input for
//! hand-written fixtures.

use std::str::FromStr;

use num_bigint::{BigInt, BigUint};
use serde::{de, Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum UintRepr {
    Text(String),
    Number(u64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntRepr {
    Text(String),
    Number(i64),
}

fn parse_uint<E: de::Error>(repr: UintRepr) -> Result<BigUint, E> {
    match repr {
        UintRepr::Text(text) => BigUint::from_str(text.trim())
            .map_err(|err| E::custom(format!("invalid unsigned integer {text:?}: {err}"))),
        UintRepr::Number(n) => Ok(BigUint::from(n)),
    }
}

pub mod biguint_string {
    use super::*;

    pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
    where
        D: Deserializer<'de>,
    {
        parse_uint(UintRepr::deserialize(deserializer)?)
    }
}

pub mod bigint_string {
    use super::*;

    pub fn serialize<S>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigInt, D::Error>
    where
        D: Deserializer<'de>,
    {
        match IntRepr::deserialize(deserializer)? {
            IntRepr::Text(text) => BigInt::from_str(text.trim()).map_err(|err| {
                de::Error::custom(format!("invalid signed integer {text:?}: {err}"))
            }),
            IntRepr::Number(n) => Ok(BigInt::from(n)),
        }
    }
}

pub mod biguint_vec_string {
    use serde::ser::SerializeSeq;

    use super::*;

    pub fn serialize<S>(values: &[BigUint], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&value.to_str_radix(10))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<BigUint>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<UintRepr>::deserialize(deserializer)?
            .into_iter()
            .map(parse_uint)
            .collect()
    }
}

/// Integer keyed maps as JSON/YAML objects with string keys.
///
/// Keys are parsed by hand since integer keys do not survive the buffering serde performs for
/// internally tagged enums.
pub mod tick_map {
    use std::collections::BTreeMap;

    use serde::Serialize;

    use super::*;

    pub fn serialize<S, V>(map: &BTreeMap<i32, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        serializer.collect_map(map.iter().map(|(k, v)| (k.to_string(), v)))
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<BTreeMap<i32, V>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        BTreeMap::<String, V>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, value)| {
                key.trim()
                    .parse::<i32>()
                    .map(|idx| (idx, value))
                    .map_err(|err| de::Error::custom(format!("invalid tick index {key:?}: {err}")))
            })
            .collect()
    }
}
