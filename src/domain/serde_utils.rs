//! Serde helpers for payloads from the countries API.

/// Deserializes a string map whose values may be `null`, dropping the nulls.
pub mod nullable_string_map {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    /// Serializes the map unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the serializer fails.
    pub fn serialize<S>(value: &HashMap<String, String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.serialize(serializer)
    }

    /// Deserializes a map of optional strings, keeping only present values.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a map of strings or nulls.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = HashMap::<String, Option<String>>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key, value)))
            .collect())
    }
}
