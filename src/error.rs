use thiserror::Error;

#[derive(Error, Debug)]
pub enum TradeError {
    #[error("Malformed year label: column '{column}' is not an integer year")]
    MalformedYearLabel { column: String },

    #[error("Non-positive value {value} for {economy} / sector {sector} / {year}: logarithm undefined")]
    NonPositiveValue {
        economy: String,
        sector: i64,
        year: i32,
        value: f64,
    },

    #[error("Unknown sector code {code} for {economy}")]
    UnknownSectorCode { economy: String, code: i64 },

    #[error("No display colour for ({economy}, {sector})")]
    UnknownColorKey { economy: String, sector: i64 },

    #[error("Invalid value '{raw}' for {economy} / sector {sector} in column '{column}'")]
    InvalidValue {
        economy: String,
        sector: i64,
        column: String,
        raw: String,
    },

    #[error("Invalid sector code '{raw}' at row {row}")]
    InvalidSectorCode { row: usize, raw: String },

    #[error("Missing reporting economy at row {row}")]
    MissingEconomy { row: usize },

    #[error("Duplicate row for ({economy}, {sector})")]
    DuplicateKey { economy: String, sector: i64 },

    #[error("Year {year} appears in more than one column")]
    DuplicateYear { year: i32 },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Data not loaded: {0}")]
    NotLoaded(String),

    #[error("Unsupported table format: {0}")]
    UnsupportedFormat(String),

    #[error("Config: {0}")]
    Config(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TradeError {
    /// True for errors caused by the content of an input table.
    pub fn is_data_quality(&self) -> bool {
        matches!(
            self,
            Self::MalformedYearLabel { .. }
                | Self::NonPositiveValue { .. }
                | Self::UnknownSectorCode { .. }
                | Self::UnknownColorKey { .. }
                | Self::InvalidValue { .. }
                | Self::InvalidSectorCode { .. }
                | Self::MissingEconomy { .. }
                | Self::DuplicateKey { .. }
                | Self::DuplicateYear { .. }
                | Self::MissingColumn(_)
        )
    }
}

#[cfg(feature = "python")]
impl From<TradeError> for pyo3::PyErr {
    fn from(err: TradeError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyRuntimeError, PyValueError};

        if err.is_data_quality() {
            PyValueError::new_err(err.to_string())
        } else {
            PyRuntimeError::new_err(err.to_string())
        }
    }
}
