//! Country entity persisted in the local store.

use std::collections::HashMap;

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// A country as shown in the list and details screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    /// ISO 3166-1 alpha-3 code, unique per country.
    pub alpha3_code: String,
    /// English name.
    pub name: String,
    /// Population count.
    pub population: u64,
    /// Flag image URL.
    #[serde(default)]
    pub flag: Option<String>,
    /// Localized names keyed by locale code.
    #[serde(default, with = "crate::domain::serde_utils::nullable_string_map")]
    pub translations: HashMap<String, String>,
}

impl Country {
    /// Creates a country without flag or translations.
    #[must_use]
    pub fn new(alpha3_code: impl Into<String>, name: impl Into<String>, population: u64) -> Self {
        Self {
            alpha3_code: alpha3_code.into(),
            name: name.into(),
            population,
            flag: None,
            translations: HashMap::new(),
        }
    }

    /// Sets the flag URL.
    #[must_use]
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = Some(flag.into());
        self
    }

    /// Adds a localized name.
    #[must_use]
    pub fn with_translation(mut self, locale: impl Into<String>, name: impl Into<String>) -> Self {
        self.translations.insert(locale.into(), name.into());
        self
    }

    /// Returns the flag URL if present and well formed.
    #[must_use]
    pub fn flag_url(&self) -> Option<Url> {
        self.flag.as_deref().and_then(|flag| Url::parse(flag).ok())
    }

    /// Returns the name for the locale, falling back to the English name.
    #[must_use]
    pub fn localized_name(&self, locale: &str) -> &str {
        self.translations
            .get(locale)
            .map_or(self.name.as_str(), String::as_str)
    }
}
