//! Store versions and the schema they describe.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const MODEL_NAME: &str = "db_model_v1";
const FILE_NAME: &str = "db.sql";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS countries (
    alpha3_code TEXT PRIMARY KEY NOT NULL,
    name        TEXT NOT NULL,
    population  INTEGER NOT NULL,
    flag_url    TEXT
);
CREATE TABLE IF NOT EXISTS name_translations (
    alpha3_code TEXT NOT NULL REFERENCES countries(alpha3_code) ON DELETE CASCADE,
    locale      TEXT NOT NULL,
    name        TEXT NOT NULL,
    PRIMARY KEY (alpha3_code, locale)
);
CREATE INDEX IF NOT EXISTS idx_countries_name ON countries(name);
";

/// Named, versioned store layout.
///
/// Every version currently maps to the same model and file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreVersion(u32);

impl Default for StoreVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl StoreVersion {
    /// First store layout.
    pub const V1: Self = Self(1);
    /// Layout used by new stores.
    pub const CURRENT: Self = Self::V1;

    /// Wraps a raw version number.
    #[must_use]
    pub const fn new(version: u32) -> Self {
        Self(version)
    }

    /// Returns the raw version number.
    #[must_use]
    pub const fn number(self) -> u32 {
        self.0
    }

    /// Name of the data model, `db_model_v1` for every version.
    #[must_use]
    pub const fn model_name(self) -> &'static str {
        MODEL_NAME
    }

    /// Database file name, `db.sql` for every version.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        FILE_NAME
    }

    /// Database file path inside `directory`.
    #[must_use]
    pub fn db_path(self, directory: &Path) -> PathBuf {
        directory.join(self.file_name())
    }

    pub(crate) const fn schema(self) -> &'static str {
        SCHEMA
    }
}

impl fmt::Display for StoreVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (v{})", self.model_name(), self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(StoreVersion::V1 ; "first version")]
    #[test_case(StoreVersion::new(7) ; "future version")]
    fn test_names_are_stable(version: StoreVersion) {
        assert_eq!(version.model_name(), "db_model_v1");
        assert_eq!(version.file_name(), "db.sql");
    }

    #[test]
    fn test_db_path() {
        let path = StoreVersion::CURRENT.db_path(Path::new("/data/countries"));
        assert_eq!(path, PathBuf::from("/data/countries/db.sql"));
    }
}
