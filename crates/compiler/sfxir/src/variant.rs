use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const FALSE: &str = "False";
pub const TRUE: &str = "True";

/// A compile-time switch declared by a module, e.g. `variant Quality : Low, Medium, High;`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct VariantAxis {
    pub name: String,
    pub values: Vec<String>,
}

impl VariantAxis {
    pub fn new(name: &str, values: &[&str]) -> Self {
        VariantAxis {
            name: name.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn boolean(name: &str) -> Self {
        VariantAxis::new(name, &[FALSE, TRUE])
    }

    /// The values this axis can take.
    ///
    /// A declaration with fewer than two values is a boolean switch.
    pub fn value_set(&self) -> Vec<String> {
        if self.values.len() < 2 {
            vec![FALSE.to_string(), TRUE.to_string()]
        } else {
            self.values.clone()
        }
    }
}

/// The value chosen for each axis of a concrete variant, in axis declaration order.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize, Debug)]
pub struct VariantValues(IndexMap<String, String>);

impl VariantValues {
    pub fn new() -> Self {
        VariantValues(IndexMap::new())
    }

    pub fn insert(&mut self, axis: &str, value: &str) {
        self.0.insert(axis.to_string(), value.to_string());
    }

    pub fn get(&self, axis: &str) -> Option<&str> {
        self.0.get(axis).map(|v| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn id(&self) -> VariantId {
        VariantId::of(self)
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for VariantValues {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        VariantValues(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// Identifies a set of [VariantValues] independent of the order in which the values were
/// inserted.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct VariantId(u32);

impl VariantId {
    pub fn of(values: &VariantValues) -> Self {
        let id = values.iter().fold(0i32, |acc, (axis, value)| {
            acc.wrapping_add(combine(hash_str(axis), hash_str(value)))
        });

        VariantId(id as u32)
    }

    pub fn from_u32(id: u32) -> Self {
        VariantId(id)
    }

    pub fn to_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

impl fmt::Debug for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VariantId({:X})", self.0)
    }
}

const HASH_SEED: i32 = 352654597;

fn combine(h1: i32, h2: i32) -> i32 {
    (h1 << 5).wrapping_add(h1).wrapping_add(h1 >> 27) ^ h2
}

fn hash_str(s: &str) -> i32 {
    s.encode_utf16()
        .fold(HASH_SEED, |h, unit| combine(h, unit as i32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_normalization() {
        assert_eq!(
            VariantAxis::new("Shadows", &[]).value_set(),
            vec!["False".to_string(), "True".to_string()]
        );
        assert_eq!(
            VariantAxis::new("Shadows", &["On"]).value_set(),
            vec!["False".to_string(), "True".to_string()]
        );
        assert_eq!(
            VariantAxis::new("Quality", &["Low", "High"]).value_set(),
            vec!["Low".to_string(), "High".to_string()]
        );
    }

    #[test]
    fn test_empty_values_have_zero_id() {
        assert_eq!(VariantValues::new().id(), VariantId::from_u32(0));
        assert_eq!(VariantValues::new().id().to_string(), "0");
    }

    #[test]
    fn test_id_independent_of_insertion_order() {
        let a: VariantValues = [("Quality", "High"), ("Shadows", "True"), ("Fog", "False")]
            .into_iter()
            .collect();
        let b: VariantValues = [("Fog", "False"), ("Quality", "High"), ("Shadows", "True")]
            .into_iter()
            .collect();

        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_id_distinguishes_values() {
        let low: VariantValues = [("Quality", "Low")].into_iter().collect();
        let high: VariantValues = [("Quality", "High")].into_iter().collect();

        assert_ne!(low.id(), high.id());
    }

    #[test]
    fn test_known_ids() {
        let single: VariantValues = [("Quality", "High")].into_iter().collect();
        let pair: VariantValues = [("Quality", "High"), ("Fog", "True")].into_iter().collect();

        assert_eq!(single.id(), VariantId::from_u32(0x82588C16));
        assert_eq!(pair.id().to_string(), "8265D7FE");
    }

    #[test]
    fn test_id_formats_as_upper_hex() {
        let id = VariantId::from_u32(0xDEADBEEF);

        assert_eq!(id.to_string(), "DEADBEEF");
    }
}
