use std::collections::HashMap;

use pyo3::prelude::*;
use pyo3_polars::PyDataFrame;

use crate::config::TradeConfig;
use crate::model::TradeModel;
use crate::visualization::{ChartConfig, DashboardConfig};

#[pyclass(name = "TradeModel")]
pub struct PyTradeModel {
    inner: TradeModel,
}

#[pymethods]
impl PyTradeModel {
    /// `config_path` points at an optional TOML file with reference tables
    /// and the non-positive value policy.
    #[new]
    #[pyo3(signature = (base_path, config_path=None))]
    fn new(base_path: String, config_path: Option<String>) -> PyResult<Self> {
        let config = match config_path {
            Some(path) => TradeConfig::from_path(path)?,
            None => TradeConfig::default(),
        };
        Ok(Self {
            inner: TradeModel::with_config(base_path, &config),
        })
    }

    // ── Data loading ────────────────────────────────────────────────────────

    /// Load a wide CSV (all columns as strings) or Parquet table.
    /// Optionally rename columns via a map.
    #[pyo3(signature = (filename, rename=None))]
    fn load_table(
        &self,
        filename: &str,
        rename: Option<HashMap<String, String>>,
    ) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.inner.load_table(filename, rename)?))
    }

    /// Load and reshape the exports table (default: export_sum.csv).
    #[pyo3(signature = (filename=None))]
    fn load_exports(&mut self, filename: Option<&str>) -> PyResult<PyDataFrame> {
        let table = self.inner.load_exports(filename)?;
        Ok(PyDataFrame(table.to_frame()?))
    }

    /// Load and reshape the imports table (default: import_sum.csv).
    #[pyo3(signature = (filename=None))]
    fn load_imports(&mut self, filename: Option<&str>) -> PyResult<PyDataFrame> {
        let table = self.inner.load_imports(filename)?;
        Ok(PyDataFrame(table.to_frame()?))
    }

    // ── Transform ───────────────────────────────────────────────────────────

    /// Reshape a wide DataFrame read by the host (e.g. `pl.read_excel`).
    ///
    /// Data-quality problems raise ValueError naming the offending
    /// row, column or value.
    fn reshape(&self, df: PyDataFrame, value_column: &str) -> PyResult<PyDataFrame> {
        let long = self.inner.transformer().reshape_frame(&df.0, value_column)?;
        Ok(PyDataFrame(long))
    }

    /// (economy, sector) pairs of interest that have no display colour.
    fn missing_colors(&self) -> Vec<(String, i64)> {
        self.inner
            .transformer()
            .reference()
            .missing_colors()
            .into_iter()
            .map(|key| (key.economy, key.sector))
            .collect()
    }

    // ── Properties ──────────────────────────────────────────────────────────

    #[getter]
    fn exports_df(&self) -> PyResult<Option<PyDataFrame>> {
        match self.inner.exports() {
            Ok(table) => Ok(Some(PyDataFrame(table.to_frame()?))),
            Err(_) => Ok(None),
        }
    }

    #[getter]
    fn imports_df(&self) -> PyResult<Option<PyDataFrame>> {
        match self.inner.imports() {
            Ok(table) => Ok(Some(PyDataFrame(table.to_frame()?))),
            Err(_) => Ok(None),
        }
    }

    // ── Visualization ───────────────────────────────────────────────────────

    /// Animated exports scatter as a self-contained HTML string.
    /// Use with `streamlit.components.v1.html(...)` or `IPython.display.HTML(...)`.
    #[pyo3(signature = (title=None, height_px=None))]
    fn visualize_exports(&self, title: Option<String>, height_px: Option<u32>) -> PyResult<String> {
        let config = chart_config(ChartConfig::exports(), title, height_px);
        Ok(self.inner.exports_html(&config)?)
    }

    /// Imports line chart as a self-contained HTML string.
    #[pyo3(signature = (title=None, height_px=None))]
    fn visualize_imports(&self, title: Option<String>, height_px: Option<u32>) -> PyResult<String> {
        let config = chart_config(ChartConfig::imports(), title, height_px);
        Ok(self.inner.imports_html(&config)?)
    }

    /// Full dashboard page with both charts.
    fn render_dashboard(&self) -> PyResult<String> {
        Ok(self.inner.dashboard_html(&DashboardConfig::default())?)
    }
}

fn chart_config(mut config: ChartConfig, title: Option<String>, height_px: Option<u32>) -> ChartConfig {
    if let Some(title) = title {
        config.title = title;
    }
    if let Some(height_px) = height_px {
        config.height_px = height_px;
    }
    config
}
