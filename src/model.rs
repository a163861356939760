use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::info;

use crate::config::TradeConfig;
use crate::error::TradeError;
use crate::schema::{files, value};
use crate::transform::{records_to_frame, TradeFlowTransformer, TradeRecord};
use crate::visualization::{self, ChartConfig, DashboardConfig};

/// A reshaped table together with the name of its value column.
#[derive(Debug, Clone)]
pub struct TradeTable {
    pub value_column: String,
    pub records: Vec<TradeRecord>,
}

impl TradeTable {
    pub fn to_frame(&self) -> Result<DataFrame, TradeError> {
        records_to_frame(&self.records, &self.value_column)
    }
}

/// Loads the export and import tables from a base directory and keeps
/// their reshaped form for rendering.
pub struct TradeModel {
    base_path: PathBuf,
    transformer: TradeFlowTransformer,
    exports: Option<TradeTable>,
    imports: Option<TradeTable>,
}

impl TradeModel {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self::with_config(base_path, &TradeConfig::default())
    }

    pub fn with_config(base_path: impl Into<PathBuf>, config: &TradeConfig) -> Self {
        Self {
            base_path: base_path.into(),
            transformer: TradeFlowTransformer::from_config(config),
            exports: None,
            imports: None,
        }
    }

    pub fn transformer(&self) -> &TradeFlowTransformer {
        &self.transformer
    }

    // ── Data loading ────────────────────────────────────────────────────────

    /// Load a wide table relative to the base path.
    ///
    /// `.csv` files are read with every column as a string and trimmed
    /// header names; `.parquet` files keep their own dtypes.
    pub fn load_table(
        &self,
        filename: &str,
        rename: Option<HashMap<String, String>>,
    ) -> Result<DataFrame, TradeError> {
        let path = self.base_path.join(filename);
        let mut df = match extension(&path).as_deref() {
            Some("csv") => read_csv_as_strings(&path)?,
            Some("parquet") => ParquetReader::new(File::open(&path)?).finish()?,
            _ => return Err(TradeError::UnsupportedFormat(filename.to_string())),
        };

        if let Some(map) = rename {
            let old: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
            let new: Vec<&str> = map.values().map(|s| s.as_str()).collect();
            df = df.lazy().rename(old, new, true).collect()?;
        }

        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded trade table"
        );
        Ok(df)
    }

    /// Load and reshape the export table (default `export_sum.csv`).
    pub fn load_exports(&mut self, filename: Option<&str>) -> Result<&TradeTable, TradeError> {
        let table = self.load_reshaped(filename.unwrap_or(files::EXPORTS), value::EXPORT_VALUE)?;
        Ok(&*self.exports.insert(table))
    }

    /// Load and reshape the import table (default `import_sum.csv`).
    pub fn load_imports(&mut self, filename: Option<&str>) -> Result<&TradeTable, TradeError> {
        let table = self.load_reshaped(filename.unwrap_or(files::IMPORTS), value::IMPORT_VALUE)?;
        Ok(&*self.imports.insert(table))
    }

    pub fn exports(&self) -> Result<&TradeTable, TradeError> {
        self.exports
            .as_ref()
            .ok_or_else(|| TradeError::NotLoaded("exports".into()))
    }

    pub fn imports(&self) -> Result<&TradeTable, TradeError> {
        self.imports
            .as_ref()
            .ok_or_else(|| TradeError::NotLoaded("imports".into()))
    }

    // ── Visualization ───────────────────────────────────────────────────────

    pub fn exports_html(&self, config: &ChartConfig) -> Result<String, TradeError> {
        visualization::generate_scatter_html(&self.exports()?.records, config)
    }

    pub fn imports_html(&self, config: &ChartConfig) -> Result<String, TradeError> {
        visualization::generate_line_html(&self.imports()?.records, config)
    }

    pub fn dashboard_html(&self, config: &DashboardConfig) -> Result<String, TradeError> {
        visualization::generate_dashboard_html(
            &self.exports()?.records,
            &self.imports()?.records,
            config,
        )
    }

    fn load_reshaped(&self, filename: &str, value_column: &str) -> Result<TradeTable, TradeError> {
        let wide = self.load_table(filename, None)?;
        let records = self.transformer.reshape(&wide, value_column)?;
        info!(value_column, records = records.len(), "reshaped trade table");
        Ok(TradeTable {
            value_column: value_column.to_string(),
            records,
        })
    }
}

// ── Private helpers ─────────────────────────────────────────────────────────

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Read a CSV file with all columns as String dtype and trimmed header names.
fn read_csv_as_strings(path: &Path) -> Result<DataFrame, TradeError> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;
    Ok(df)
}
