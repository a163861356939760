use std::collections::{BTreeMap, HashMap};

use crate::error::TradeError;

/// Composite key of the display-colour table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorKey {
    pub economy: String,
    pub sector: i64,
}

impl ColorKey {
    pub fn new(economy: impl Into<String>, sector: i64) -> Self {
        Self {
            economy: economy.into(),
            sector,
        }
    }
}

/// Read-only reference data consulted by the transformer.
///
/// Countries keep their configured order; it drives legend and series
/// order in the charts.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTables {
    countries: Vec<String>,
    sector_labels: BTreeMap<i64, String>,
    colors: HashMap<ColorKey, String>,
}

const DEFAULT_COUNTRIES: [&str; 5] = [
    "France",
    "Germany",
    "Japan",
    "United Kingdom",
    "United States of America",
];

const DEFAULT_SECTORS: [(i64, &str); 3] = [
    (1, "Light Industry"),
    (2, "Basic Industry"),
    (3, "Raw Materials"),
];

const DEFAULT_COLORS: [(&str, i64, &str); 15] = [
    ("France", 1, "lightblue"),
    ("France", 2, "blue"),
    ("France", 3, "darkblue"),
    ("Germany", 1, "salmon"),
    ("Germany", 2, "red"),
    ("Germany", 3, "darkred"),
    ("Japan", 1, "lightgreen"),
    ("Japan", 2, "green"),
    ("Japan", 3, "darkgreen"),
    ("United Kingdom", 1, "lavender"),
    ("United Kingdom", 2, "purple"),
    ("United Kingdom", 3, "darkviolet"),
    ("United States of America", 1, "lightcoral"),
    ("United States of America", 2, "orange"),
    ("United States of America", 3, "darkorange"),
];

impl Default for ReferenceTables {
    fn default() -> Self {
        Self::new(
            DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            DEFAULT_SECTORS
                .iter()
                .map(|(code, label)| (*code, label.to_string()))
                .collect(),
            DEFAULT_COLORS
                .iter()
                .map(|(economy, sector, color)| (ColorKey::new(*economy, *sector), color.to_string()))
                .collect(),
        )
    }
}

impl ReferenceTables {
    pub fn new(
        countries: Vec<String>,
        sector_labels: BTreeMap<i64, String>,
        colors: HashMap<ColorKey, String>,
    ) -> Self {
        let mut unique = Vec::with_capacity(countries.len());
        for country in countries {
            if !unique.contains(&country) {
                unique.push(country);
            }
        }
        Self {
            countries: unique,
            sector_labels,
            colors,
        }
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    /// Exact, case-sensitive membership.
    pub fn is_of_interest(&self, economy: &str) -> bool {
        self.countries.iter().any(|c| c == economy)
    }

    pub fn sector_labels(&self) -> &BTreeMap<i64, String> {
        &self.sector_labels
    }

    pub fn colors(&self) -> &HashMap<ColorKey, String> {
        &self.colors
    }

    pub fn sector_codes(&self) -> impl Iterator<Item = i64> + '_ {
        self.sector_labels.keys().copied()
    }

    pub fn sector_label(&self, economy: &str, code: i64) -> Result<&str, TradeError> {
        self.sector_labels
            .get(&code)
            .map(String::as_str)
            .ok_or_else(|| TradeError::UnknownSectorCode {
                economy: economy.to_string(),
                code,
            })
    }

    pub fn display_color(&self, economy: &str, sector: i64) -> Result<&str, TradeError> {
        self.colors
            .get(&ColorKey::new(economy, sector))
            .map(String::as_str)
            .ok_or_else(|| TradeError::UnknownColorKey {
                economy: economy.to_string(),
                sector,
            })
    }

    /// Country × sector combinations that have no display colour.
    pub fn missing_colors(&self) -> Vec<ColorKey> {
        let mut missing = Vec::new();
        for country in &self.countries {
            for code in self.sector_codes() {
                let key = ColorKey::new(country.as_str(), code);
                if !self.colors.contains_key(&key) {
                    missing.push(key);
                }
            }
        }
        missing
    }
}
