pub mod config;
pub mod error;
pub mod model;
pub mod reference;
pub mod schema;
pub mod transform;
pub mod visualization;

#[cfg(feature = "python")]
mod python;

pub use config::TradeConfig;
pub use error::TradeError;
pub use model::{TradeModel, TradeTable};
pub use reference::{ColorKey, ReferenceTables};
pub use transform::{NonPositivePolicy, TradeFlowTransformer, TradeRecord};

#[cfg(feature = "python")]
use pyo3::prelude::*;
#[cfg(feature = "python")]
use pyo3::types::PyModule;

/// Export schema constants as Python submodules
#[cfg(feature = "python")]
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Wide input
    let wide = PyModule::new(m.py(), "wide")?;
    wide.add("REPORTING_ECONOMY", schema::wide::REPORTING_ECONOMY)?;
    wide.add("PRODUCT_SECTOR", schema::wide::PRODUCT_SECTOR)?;
    m.add_submodule(&wide)?;

    // Long output
    let long = PyModule::new(m.py(), "long")?;
    long.add("REPORTING_ECONOMY", schema::long::REPORTING_ECONOMY)?;
    long.add("PRODUCT_SECTOR", schema::long::PRODUCT_SECTOR)?;
    long.add("YEAR", schema::long::YEAR)?;
    long.add("SECTOR_DESCRIPTION", schema::long::SECTOR_DESCRIPTION)?;
    long.add("CUSTOM_COLOR", schema::long::CUSTOM_COLOR)?;
    m.add_submodule(&long)?;

    // Value columns
    let value = PyModule::new(m.py(), "value")?;
    value.add("EXPORT_VALUE", schema::value::EXPORT_VALUE)?;
    value.add("IMPORT_VALUE", schema::value::IMPORT_VALUE)?;
    value.add(
        "LOG_EXPORT_VALUE",
        schema::long::log_column(schema::value::EXPORT_VALUE),
    )?;
    value.add(
        "LOG_IMPORT_VALUE",
        schema::long::log_column(schema::value::IMPORT_VALUE),
    )?;
    m.add_submodule(&value)?;

    Ok(())
}

#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PyTradeModel>()?;
    add_schema_exports(m)?;
    Ok(())
}
