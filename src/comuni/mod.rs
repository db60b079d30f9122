//! Italian municipality lookup for address entry.
//!
//! A [`ComuniTable`] maps municipality names to their province code and postal
//! codes. It starts from a small built-in sample and can be replaced by a full
//! JSON table loaded on a background thread:
//!
//! ```json
//! { "Roma": { "provincia": "RM", "cap": ["00118", "00119"] } }
//! ```

use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use crate::core::FatturaError;

/// Upper bound on returned suggestions.
pub const MAX_SUGGESTIONS: usize = 100;

/// Substring matches are added until there are this many suggestions.
pub const MIN_SUGGESTIONS: usize = 10;

/// Province and postal codes of one municipality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comune {
    #[serde(rename = "provincia", default)]
    pub province: String,
    #[serde(rename = "cap", default)]
    pub postal_codes: Vec<String>,
}

/// Address fields filled in when a municipality is picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub province: String,
    /// First listed postal code, if any.
    pub postal_code: Option<String>,
}

/// Shared municipality table. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct ComuniTable {
    inner: Arc<Mutex<BTreeMap<String, Comune>>>,
}

impl ComuniTable {
    /// Table holding the ten largest cities.
    pub fn sample() -> Self {
        let entries = [
            ("Roma", "RM", "00100"),
            ("Milano", "MI", "20121"),
            ("Napoli", "NA", "80100"),
            ("Torino", "TO", "10121"),
            ("Palermo", "PA", "90121"),
            ("Genova", "GE", "16121"),
            ("Bologna", "BO", "40121"),
            ("Firenze", "FI", "50121"),
            ("Bari", "BA", "70121"),
            ("Catania", "CT", "95121"),
        ];
        let data = entries
            .into_iter()
            .map(|(name, province, cap)| {
                (
                    name.to_string(),
                    Comune {
                        province: province.to_string(),
                        postal_codes: vec![cap.to_string()],
                    },
                )
            })
            .collect();
        Self {
            inner: Arc::new(Mutex::new(data)),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, FatturaError> {
        let data = parse_table(json)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(data)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Comune>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Replace the table with the contents of a JSON file. Returns the number of entries.
    ///
    /// On failure the current table is kept.
    pub fn load_from(&self, path: impl AsRef<Path>) -> Result<usize, FatturaError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let data = parse_table(&raw)?;
        let count = data.len();
        *self.lock() = data;
        info!("loaded {count} municipalities from {}", path.as_ref().display());
        Ok(count)
    }

    /// Load a JSON file on a background thread.
    ///
    /// Readers keep seeing the previous table until the load completes.
    /// There is no cancellation.
    pub fn spawn_load(&self, path: impl Into<PathBuf>) -> JoinHandle<Result<usize, FatturaError>> {
        let table = self.clone();
        let path = path.into();
        std::thread::spawn(move || {
            table
                .load_from(&path)
                .inspect_err(|e| error!("cannot load municipalities from {}: {e}", path.display()))
        })
    }

    /// Municipality names matching typed text.
    ///
    /// Empty text lists every name. Otherwise names starting with the text
    /// (ignoring case) come first; when fewer than [`MIN_SUGGESTIONS`] match,
    /// names containing the text fill up to that count. The result is sorted
    /// and capped at [`MAX_SUGGESTIONS`].
    pub fn suggestions(&self, text: &str) -> Vec<String> {
        let data = self.lock();
        if text.is_empty() {
            return data.keys().take(MAX_SUGGESTIONS).cloned().collect();
        }

        let needle = text.to_lowercase();
        let mut found: Vec<String> = data
            .keys()
            .filter(|name| name.to_lowercase().starts_with(&needle))
            .cloned()
            .collect();

        if found.len() < MIN_SUGGESTIONS {
            let missing = MIN_SUGGESTIONS - found.len();
            let extra: Vec<String> = data
                .keys()
                .filter(|name| {
                    let lower = name.to_lowercase();
                    !lower.starts_with(&needle) && lower.contains(&needle)
                })
                .take(missing)
                .cloned()
                .collect();
            found.extend(extra);
        }

        found.sort();
        found.truncate(MAX_SUGGESTIONS);
        found
    }

    /// Province and first postal code of an exactly named municipality.
    pub fn lookup(&self, name: &str) -> Option<Location> {
        self.lock().get(name).map(|c| Location {
            province: c.province.clone(),
            postal_code: c.postal_codes.first().cloned(),
        })
    }
}

fn parse_table(json: &str) -> Result<BTreeMap<String, Comune>, FatturaError> {
    serde_json::from_str(json).map_err(|e| FatturaError::Config(format!("municipality table: {e}")))
}
