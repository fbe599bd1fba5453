//! Country persistence on top of the local store.

use std::sync::Arc;

use rusqlite::{Row, Transaction, params};
use tracing::{debug, info};

use crate::domain::entities::Country;
use crate::domain::errors::StoreError;
use crate::domain::lazy_list::LazyList;
use crate::domain::ports::{FetchRequest, PersistentStore};

const ALL_COUNTRIES_SQL: &str = "SELECT alpha3_code FROM countries";

const COUNTRIES_SQL: &str = r"
SELECT c.alpha3_code, c.name, c.population, c.flag_url, t.name
FROM countries c
LEFT JOIN name_translations t ON t.alpha3_code = c.alpha3_code AND t.locale = ?1
WHERE ?2 = ''
   OR c.name LIKE '%' || ?2 || '%' ESCAPE '\'
   OR t.name LIKE '%' || ?2 || '%' ESCAPE '\'
ORDER BY COALESCE(t.name, c.name)";

const COUNTRY_SQL: &str = "
SELECT alpha3_code, name, population, flag_url, NULL
FROM countries
WHERE alpha3_code = ?1";

const TRANSLATIONS_SQL: &str = "
SELECT locale, name FROM name_translations WHERE alpha3_code = ?1 ORDER BY locale";

/// Raw `countries` row, optionally joined with one translation.
#[derive(Debug, Clone)]
struct CountryRow {
    alpha3_code: String,
    name: String,
    population: i64,
    flag: Option<String>,
    localized_name: Option<String>,
}

impl CountryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            alpha3_code: row.get(0)?,
            name: row.get(1)?,
            population: row.get(2)?,
            flag: row.get(3)?,
            localized_name: row.get(4)?,
        })
    }

    /// Rows with a negative population are treated as corrupt.
    fn to_country(&self, locale: &str) -> Option<Country> {
        let population = u64::try_from(self.population).ok()?;
        let mut country = Country::new(&self.alpha3_code, &self.name, population);
        country.flag.clone_from(&self.flag);
        if let Some(localized) = &self.localized_name {
            country = country.with_translation(locale, localized);
        }
        Some(country)
    }
}

/// Escapes `LIKE` metacharacters so the search matches literally.
fn escape_like(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len());
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn translation_from_row(row: &Row<'_>) -> rusqlite::Result<(String, String)> {
    Ok((row.get(0)?, row.get(1)?))
}

fn write_country(tx: &Transaction<'_>, country: &Country) -> Result<(), StoreError> {
    let population = i64::try_from(country.population).map_err(|_| {
        StoreError::operation(format!(
            "population of {} out of range",
            country.alpha3_code
        ))
    })?;
    tx.execute(
        "INSERT INTO countries (alpha3_code, name, population, flag_url)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(alpha3_code) DO UPDATE SET
             name = excluded.name,
             population = excluded.population,
             flag_url = excluded.flag_url",
        params![country.alpha3_code, country.name, population, country.flag],
    )?;
    tx.execute(
        "DELETE FROM name_translations WHERE alpha3_code = ?1",
        params![country.alpha3_code],
    )?;
    for (locale, name) in &country.translations {
        tx.execute(
            "INSERT INTO name_translations (alpha3_code, locale, name) VALUES (?1, ?2, ?3)",
            params![country.alpha3_code, locale, name],
        )?;
    }
    Ok(())
}

/// Reads and writes countries through a [`PersistentStore`].
pub struct CountriesDbRepository<S> {
    store: Arc<S>,
}

impl<S> Clone for CountriesDbRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: PersistentStore> CountriesDbRepository<S> {
    /// Creates a repository over `store`.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns true if at least one country is stored. False while the
    /// store is still opening.
    #[must_use]
    pub fn has_loaded_countries(&self) -> bool {
        let request = FetchRequest::new(ALL_COUNTRIES_SQL, |row| row.get::<_, String>(0));
        self.store.count(&request) > 0
    }

    /// Inserts or replaces `countries` and their translations in one
    /// transaction. Returns the number of countries written.
    pub async fn store(&self, countries: Vec<Country>) -> Result<usize, StoreError> {
        debug!(count = countries.len(), "Storing countries");
        let written = self
            .store
            .update(move |tx| {
                for country in &countries {
                    write_country(tx, country)?;
                }
                Ok(countries.len())
            })
            .await?;
        info!(count = written, "Stored countries");
        Ok(written)
    }

    /// Lists countries ordered by display name.
    ///
    /// `search` matches the English or the localized name, ignoring ASCII
    /// case. An empty search lists everything.
    pub async fn countries(
        &self,
        search: &str,
        locale: &str,
    ) -> Result<LazyList<Country>, StoreError> {
        let request = FetchRequest::new(COUNTRIES_SQL, CountryRow::from_row)
            .bind(locale.to_string())
            .bind(escape_like(search.trim()));
        let locale = locale.to_string();
        self.store
            .fetch(request, move |row: &CountryRow| row.to_country(&locale))
            .await
    }

    /// Looks up one country with all its translations.
    pub async fn country(&self, alpha3_code: &str) -> Result<Option<Country>, StoreError> {
        let details = self.store.fetch(
            FetchRequest::new(COUNTRY_SQL, CountryRow::from_row).bind(alpha3_code.to_string()),
            |row: &CountryRow| row.to_country(""),
        );
        let translations = self.store.fetch(
            FetchRequest::new(TRANSLATIONS_SQL, translation_from_row)
                .bind(alpha3_code.to_string()),
            |pair: &(String, String)| Some(pair.clone()),
        );

        let Some(country) = details.await?.iter().next() else {
            return Ok(None);
        };
        let country = translations
            .await?
            .iter()
            .fold(country, |country, (locale, name)| {
                country.with_translation(locale, name)
            });
        Ok(Some(country))
    }
}
