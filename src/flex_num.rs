use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A catalog number that may arrive as a JSON number, a numeric string, or null.
/// The catalog is inconsistent between its legacy and v1 endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlexNum(pub Option<u64>);

impl FlexNum {
    pub fn new(n: u64) -> Self {
        FlexNum(Some(n))
    }

    /// Value or zero
    pub fn get(&self) -> u64 {
        self.0.unwrap_or(0)
    }

    pub fn is_known(&self) -> bool {
        self.0.is_some()
    }
}

impl From<u64> for FlexNum {
    fn from(n: u64) -> Self {
        FlexNum(Some(n))
    }
}

impl fmt::Display for FlexNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(n) => write!(f, "{}", n),
            None => write!(f, "?"),
        }
    }
}

impl Serialize for FlexNum {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0 {
            Some(n) => serializer.serialize_u64(n),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for FlexNum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct FlexNumVisitor;

        impl<'de> Visitor<'de> for FlexNumVisitor {
            type Value = FlexNum;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a number, numeric string, or null")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(FlexNum(Some(v)))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                // Negative counts are garbage from the provider
                Ok(FlexNum(u64::try_from(v).ok()))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if v.is_finite() && v >= 0.0 {
                    Ok(FlexNum(Some(v as u64)))
                } else {
                    Ok(FlexNum(None))
                }
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(FlexNum(v.trim().parse::<u64>().ok()))
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(FlexNum(None))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(FlexNum(None))
            }
        }

        deserializer.deserialize_any(FlexNumVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_deserialize() {
        let n: FlexNum = serde_json::from_str("2024").unwrap();
        assert_eq!(n, FlexNum::new(2024));
    }

    #[test]
    fn test_numeric_string_deserialize() {
        let n: FlexNum = serde_json::from_str(r#"" 24 ""#).unwrap();
        assert_eq!(n.get(), 24);
    }

    #[test]
    fn test_garbage_string_is_unknown() {
        let n: FlexNum = serde_json::from_str(r#""Full""#).unwrap();
        assert!(!n.is_known());
        assert_eq!(n.to_string(), "?");
    }

    #[test]
    fn test_null_and_negative() {
        let n: FlexNum = serde_json::from_str("null").unwrap();
        assert_eq!(n, FlexNum(None));
        let n: FlexNum = serde_json::from_str("-3").unwrap();
        assert_eq!(n, FlexNum(None));
    }
}
