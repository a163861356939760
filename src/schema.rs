/// Column-name constants for trade tables.
/// Single source of truth - exported to Python via PyO3.

// ── Wide input columns ──────────────────────────────────────────────────────
pub mod wide {
    pub const REPORTING_ECONOMY: &str = "Reporting Economy";
    pub const PRODUCT_SECTOR: &str = "Product/Sector";

    pub const ID_COLUMNS: [&str; 2] = [REPORTING_ECONOMY, PRODUCT_SECTOR];
}

// ── Long output columns ─────────────────────────────────────────────────────
pub mod long {
    pub const REPORTING_ECONOMY: &str = "Reporting Economy";
    pub const PRODUCT_SECTOR: &str = "Product/Sector";
    pub const YEAR: &str = "Year";
    pub const SECTOR_DESCRIPTION: &str = "SectorDescription";
    pub const CUSTOM_COLOR: &str = "CustomColor";

    /// Name of the log column derived from a value column.
    pub fn log_column(value_column: &str) -> String {
        format!("Log{value_column}")
    }
}

// ── Value column names ──────────────────────────────────────────────────────
pub mod value {
    pub const EXPORT_VALUE: &str = "ExportValue";
    pub const IMPORT_VALUE: &str = "ImportValue";
}

// ── Default input files ─────────────────────────────────────────────────────
pub mod files {
    pub const EXPORTS: &str = "export_sum.csv";
    pub const IMPORTS: &str = "import_sum.csv";
}
