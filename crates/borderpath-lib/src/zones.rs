//! Named border zones used as route starting points.
//!
//! Zones are loaded from a CSV file with `name`, `latitude` and `longitude`
//! columns. Header matching is case-insensitive and accepts the usual
//! abbreviations (`lat`, `lon`, `lng`).

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use serde::Serialize;
use tracing::debug;

use crate::coordinate::Coordinate;
use crate::error::{Error, Result};

/// Similarity a name needs to be offered as a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;
const MAX_SUGGESTIONS: usize = 3;

/// A named starting point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone {
    pub name: String,
    pub coordinate: Coordinate,
}

/// Collection of zones keyed by case-insensitive name.
#[derive(Debug, Clone, Default)]
pub struct ZoneCatalog {
    zones: HashMap<String, Zone>,
    source: Option<PathBuf>,
}

impl ZoneCatalog {
    /// Load a catalog from a CSV file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut catalog = Self::from_reader(file)?;
        catalog.source = Some(path.to_path_buf());
        debug!(path = %path.display(), zones = catalog.len(), "loaded zone catalog");
        Ok(catalog)
    }

    /// Load a catalog from CSV text provided by any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new().trim(Trim::Fields).from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|err| Error::ZoneDataValidation {
                message: format!("failed to read zone headers: {err}"),
            })?
            .clone();

        let normalize = |s: &str| {
            s.to_ascii_lowercase()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect::<String>()
        };
        let normalized_headers: Vec<String> = headers.iter().map(&normalize).collect();

        let synonyms: &[(&str, &[&str])] = &[
            ("name", &["name", "zone", "zone_name", "location"]),
            ("latitude", &["latitude", "lat"]),
            ("longitude", &["longitude", "lon", "lng", "long"]),
        ];

        let mut index_map: BTreeMap<&str, usize> = BTreeMap::new();
        for (canon, alts) in synonyms {
            if let Some(i) = alts
                .iter()
                .find_map(|alt| normalized_headers.iter().position(|h| h == alt))
            {
                index_map.insert(*canon, i);
            }
        }

        let missing: Vec<&str> = synonyms
            .iter()
            .map(|(canon, _)| *canon)
            .filter(|canon| !index_map.contains_key(canon))
            .collect();
        if !missing.is_empty() {
            return Err(Error::ZoneDataValidation {
                message: format!(
                    "zone data missing required columns: {}. Available: {}",
                    missing.join(", "),
                    headers.iter().collect::<Vec<_>>().join(", ")
                ),
            });
        }

        let mut zones = HashMap::new();
        for (offset, result) in csv_reader.records().enumerate() {
            // header is line 1
            let row = offset + 2;
            let record = result.map_err(|e| Error::ZoneDataValidation {
                message: e.to_string(),
            })?;
            let get = |field: &str| {
                index_map
                    .get(field)
                    .and_then(|&i| record.get(i))
                    .unwrap_or_default()
            };

            let name = get("name");
            if name.is_empty() {
                return Err(Error::ZoneDataValidation {
                    message: format!("missing zone name at row {row}"),
                });
            }
            let parse = |field: &str| -> Result<f64> {
                get(field).parse::<f64>().map_err(|e| Error::ZoneDataValidation {
                    message: format!("invalid {field} for zone '{name}' at row {row}: {e}"),
                })
            };
            let coordinate = Coordinate::new(parse("latitude")?, parse("longitude")?).map_err(
                |e| Error::ZoneDataValidation {
                    message: format!("zone '{name}' at row {row}: {e}"),
                },
            )?;

            let key = normalize_name(name);
            if zones.contains_key(&key) {
                return Err(Error::DuplicateZone {
                    name: name.to_string(),
                });
            }
            zones.insert(
                key,
                Zone {
                    name: name.to_string(),
                    coordinate,
                },
            );
        }

        Ok(Self {
            zones,
            source: None,
        })
    }

    /// Look up a zone by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&Zone> {
        self.zones.get(&normalize_name(name))
    }

    /// Coordinate of the named zone, with suggestions when it is unknown.
    pub fn resolve(&self, name: &str) -> Result<Coordinate> {
        self.get(name)
            .map(|zone| zone.coordinate)
            .ok_or_else(|| Error::UnknownZone {
                name: name.to_string(),
                suggestions: self.fuzzy_matches(name, MAX_SUGGESTIONS),
            })
    }

    /// Zone names ranked by Jaro-Winkler similarity to `name`.
    pub fn fuzzy_matches(&self, name: &str, limit: usize) -> Vec<String> {
        let needle = normalize_name(name);
        let mut scored: Vec<(f64, &str)> = self
            .zones
            .iter()
            .filter_map(|(key, zone)| {
                let score = strsim::jaro_winkler(&needle, key);
                (score >= SUGGESTION_THRESHOLD || key.contains(&needle))
                    .then_some((score, zone.name.as_str()))
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, name)| name.to_string())
            .collect()
    }

    /// Sorted list of zone names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.zones.values().map(|z| z.name.clone()).collect();
        names.sort();
        names
    }

    /// All zones sorted by name.
    pub fn zones_sorted(&self) -> Vec<&Zone> {
        let mut zones: Vec<&Zone> = self.zones.values().collect();
        zones.sort_by(|a, b| a.name.cmp(&b.name));
        zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
