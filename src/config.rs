use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::TradeError;
use crate::reference::{ColorKey, ReferenceTables};
use crate::transform::NonPositivePolicy;

#[derive(Debug, Deserialize)]
struct SectorEntry {
    code: i64,
    label: String,
}

#[derive(Debug, Deserialize)]
struct ColorEntry {
    economy: String,
    sector: i64,
    color: String,
}

/// On-disk TOML layout. Omitted tables fall back to the defaults.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    non_positive: NonPositivePolicy,
    countries: Option<Vec<String>>,
    sectors: Option<Vec<SectorEntry>>,
    colors: Option<Vec<ColorEntry>>,
}

/// Transformer configuration: reference tables plus the log policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeConfig {
    pub reference: ReferenceTables,
    pub non_positive: NonPositivePolicy,
}

impl TradeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, TradeError> {
        let file: ConfigFile = toml::from_str(text)?;
        let defaults = ReferenceTables::default();

        let countries = file
            .countries
            .unwrap_or_else(|| defaults.countries().to_vec());

        let sector_labels = match file.sectors {
            Some(entries) => {
                let mut labels = BTreeMap::new();
                for entry in entries {
                    if labels.insert(entry.code, entry.label).is_some() {
                        return Err(TradeError::Config(format!(
                            "duplicate sector code {}",
                            entry.code
                        )));
                    }
                }
                labels
            }
            None => defaults.sector_labels().clone(),
        };

        let colors = match file.colors {
            Some(entries) => {
                let mut colors = HashMap::new();
                for entry in entries {
                    let key = ColorKey::new(entry.economy, entry.sector);
                    if colors.contains_key(&key) {
                        return Err(TradeError::Config(format!(
                            "duplicate colour for ({}, {})",
                            key.economy, key.sector
                        )));
                    }
                    colors.insert(key, entry.color);
                }
                colors
            }
            None => defaults.colors().clone(),
        };

        let reference = ReferenceTables::new(countries, sector_labels, colors);
        for key in reference.missing_colors() {
            warn!(
                economy = %key.economy,
                sector = key.sector,
                "no display colour configured"
            );
        }

        Ok(Self {
            reference,
            non_positive: file.non_positive,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TradeError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = TradeConfig::from_toml_str("").unwrap();
        assert_eq!(config, TradeConfig::default());
        assert_eq!(config.non_positive, NonPositivePolicy::Reject);
    }

    #[test]
    fn overrides_replace_defaults() {
        let config = TradeConfig::from_toml_str(
            r#"
non_positive = "nan"
countries = ["Chile"]

[[sectors]]
code = 7
label = "Services"

[[colors]]
economy = "Chile"
sector = 7
color = "teal"
"#,
        )
        .unwrap();

        assert_eq!(config.non_positive, NonPositivePolicy::Nan);
        assert_eq!(config.reference.countries(), ["Chile"]);
        assert_eq!(config.reference.sector_label("Chile", 7).unwrap(), "Services");
        assert_eq!(config.reference.display_color("Chile", 7).unwrap(), "teal");
        assert!(config.reference.sector_label("Chile", 1).is_err());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = TradeConfig::from_toml_str(r#"countries = ["France"]"#).unwrap();
        assert_eq!(config.reference.countries(), ["France"]);
        assert_eq!(
            config.reference.display_color("France", 3).unwrap(),
            "darkblue"
        );
    }

    #[test]
    fn duplicate_entries_are_rejected() {
        let err = TradeConfig::from_toml_str(
            r#"
[[sectors]]
code = 1
label = "A"

[[sectors]]
code = 1
label = "B"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, TradeError::Config(_)));

        let err = TradeConfig::from_toml_str(
            r#"
[[colors]]
economy = "France"
sector = 1
color = "a"

[[colors]]
economy = "France"
sector = 1
color = "b"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, TradeError::Config(_)));
    }

    #[test]
    fn malformed_toml_is_reported() {
        let err = TradeConfig::from_toml_str("non_positive = \"sometimes\"").unwrap_err();
        assert!(matches!(err, TradeError::Toml(_)));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trade.toml");
        std::fs::write(&path, "non_positive = \"nan\"\n").unwrap();
        let config = TradeConfig::from_path(&path).unwrap();
        assert_eq!(config.non_positive, NonPositivePolicy::Nan);
    }
}
