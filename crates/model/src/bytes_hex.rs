//! Serialization of `Vec<u8>` to 0x prefixed hex string.

use serde::{de, Deserializer, Serializer};
use std::fmt;

pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut buffer = vec![0u8; 2 + bytes.len() * 2];
    buffer[..2].copy_from_slice(b"0x");
    // Unwrap because the buffer is the exact right size.
    hex::encode_to_slice(bytes, &mut buffer[2..]).unwrap();
    // Unwrap because hex encoding is always valid utf8.
    serializer.serialize_str(std::str::from_utf8(&buffer).unwrap())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor {}
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Vec<u8>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            write!(formatter, "a hex encoded string with a 0x prefix")
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let s = s.strip_prefix("0x").ok_or_else(|| {
                de::Error::custom(format!(
                    "{s:?} can't be decoded as hex bytes because it does not start with '0x'"
                ))
            })?;
            hex::decode(s)
                .map_err(|err| de::Error::custom(format!("failed to decode {s:?} as hex: {err}")))
        }
    }

    deserializer.deserialize_str(Visitor {})
}
