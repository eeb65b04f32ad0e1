//! serde helpers that keep floats bit-exact across a save and reload

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize_f64_bits<S: Serializer>(v: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    // Convert f64 values to u64 bits for precise serialization
    v.to_bits().serialize(serializer)
}

pub fn deserialize_f64_bits<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    u64::deserialize(deserializer).map(f64::from_bits)
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Holder {
        #[serde(
            serialize_with = "serialize_f64_bits",
            deserialize_with = "deserialize_f64_bits"
        )]
        v: f64,
    }

    #[test]
    fn test_bits_survive_json() {
        for v in [0.1 + 0.2, -1e-308, f64::MAX, 1. / 3., -0.] {
            let json = serde_json::to_string(&Holder { v }).unwrap();
            let back: Holder = serde_json::from_str(&json).unwrap();
            assert_eq!(v.to_bits(), back.v.to_bits());
        }
    }
}
