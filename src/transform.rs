//! Wide-to-long reshape of trade tables.
//!
//! A wide table has one row per (reporting economy, sector) and one column
//! per year. The transformer keeps the economies of interest, emits one
//! record per (economy, sector, year) and annotates each record with its
//! log value, sector label and display colour.
use std::collections::HashSet;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TradeConfig;
use crate::error::TradeError;
use crate::reference::ReferenceTables;
use crate::schema::{long, wide};

const ROW_INDEX: &str = "__row";

/// What to do when a value has no logarithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonPositivePolicy {
    /// Abort the transform with `NonPositiveValue`.
    #[default]
    Reject,
    /// Keep the record and store NaN as its log value.
    Nan,
}

/// One long-form trade observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub reporting_economy: String,
    pub product_sector: i64,
    pub year: i32,
    pub value: f64,
    pub log_value: f64,
    pub sector_label: String,
    pub display_color: String,
}

#[derive(Debug, Clone, Default)]
pub struct TradeFlowTransformer {
    reference: ReferenceTables,
    non_positive: NonPositivePolicy,
}

impl TradeFlowTransformer {
    pub fn new(reference: ReferenceTables, non_positive: NonPositivePolicy) -> Self {
        Self {
            reference,
            non_positive,
        }
    }

    pub fn from_config(config: &TradeConfig) -> Self {
        Self::new(config.reference.clone(), config.non_positive)
    }

    pub fn reference(&self) -> &ReferenceTables {
        &self.reference
    }

    pub fn non_positive(&self) -> NonPositivePolicy {
        self.non_positive
    }

    /// Reshape a wide table into annotated long-form records.
    ///
    /// Records come out row-major: input row order, then year-column order.
    /// Any data-quality problem aborts the whole table.
    pub fn reshape(
        &self,
        table: &DataFrame,
        value_column: &str,
    ) -> Result<Vec<TradeRecord>, TradeError> {
        require_columns(table, &wide::ID_COLUMNS)?;
        let years = year_columns(table)?;
        require_economies(table)?;

        let filtered = self.filter_countries(table)?;
        let normalized = normalize_numeric(&filtered, &years)?;

        debug!(
            value_column,
            rows = table.height(),
            kept = filtered.height(),
            years = years.len(),
            "reshaping trade table"
        );

        let row_index = filtered
            .column(ROW_INDEX)?
            .as_materialized_series()
            .idx()?;
        let economies = filtered
            .column(wide::REPORTING_ECONOMY)?
            .cast(&DataType::String)?;
        let economies = economies.str()?;
        let raw_sectors = filtered.column(wide::PRODUCT_SECTOR)?;
        let sectors = sector_codes(normalized.column(wide::PRODUCT_SECTOR)?)?;

        let raw_values = years
            .iter()
            .map(|(label, _)| filtered.column(label))
            .collect::<PolarsResult<Vec<_>>>()?;
        let values = years
            .iter()
            .map(|(label, _)| normalized.column(label).and_then(|c| c.f64()))
            .collect::<PolarsResult<Vec<_>>>()?;

        let mut seen: HashSet<(&str, i64)> = HashSet::with_capacity(filtered.height());
        let mut records = Vec::with_capacity(filtered.height() * years.len());

        for i in 0..filtered.height() {
            let row = row_index.get(i).map(|r| r as usize).unwrap_or(i);
            let economy = economies
                .get(i)
                .ok_or(TradeError::MissingEconomy { row })?;
            let sector = sectors[i].ok_or_else(|| TradeError::InvalidSectorCode {
                row,
                raw: raw_cell(raw_sectors, i),
            })?;

            if !seen.insert((economy, sector)) {
                return Err(TradeError::DuplicateKey {
                    economy: economy.to_string(),
                    sector,
                });
            }

            for (j, (label, year)) in years.iter().enumerate() {
                let value = values[j]
                    .get(i)
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| TradeError::InvalidValue {
                        economy: economy.to_string(),
                        sector,
                        column: label.clone(),
                        raw: raw_cell(raw_values[j], i),
                    })?;

                let log_value = self.log_value(economy, sector, *year, value)?;
                let sector_label = self.reference.sector_label(economy, sector)?;
                let display_color = self.reference.display_color(economy, sector)?;

                records.push(TradeRecord {
                    reporting_economy: economy.to_string(),
                    product_sector: sector,
                    year: *year,
                    value,
                    log_value,
                    sector_label: sector_label.to_string(),
                    display_color: display_color.to_string(),
                });
            }
        }

        Ok(records)
    }

    /// Same as [`reshape`](Self::reshape), returned as a long-form DataFrame.
    pub fn reshape_frame(
        &self,
        table: &DataFrame,
        value_column: &str,
    ) -> Result<DataFrame, TradeError> {
        let records = self.reshape(table, value_column)?;
        records_to_frame(&records, value_column)
    }

    fn filter_countries(&self, table: &DataFrame) -> Result<DataFrame, TradeError> {
        let countries: Vec<&str> = self.reference.countries().iter().map(String::as_str).collect();
        let countries = Series::new("countries".into(), &countries);

        let df = table
            .clone()
            .lazy()
            .with_row_index(ROW_INDEX, None)
            .filter(
                col(wide::REPORTING_ECONOMY)
                    .cast(DataType::String)
                    .is_in(lit(countries), false),
            )
            .collect()?;
        Ok(df)
    }

    fn log_value(
        &self,
        economy: &str,
        sector: i64,
        year: i32,
        value: f64,
    ) -> Result<f64, TradeError> {
        if value > 0.0 {
            return Ok(value.ln());
        }
        match self.non_positive {
            NonPositivePolicy::Reject => Err(TradeError::NonPositiveValue {
                economy: economy.to_string(),
                sector,
                year,
                value,
            }),
            NonPositivePolicy::Nan => Ok(f64::NAN),
        }
    }
}

/// Build the long-form DataFrame for a set of records.
///
/// Columns: Reporting Economy, Product/Sector, Year, `value_column`,
/// Log`value_column`, SectorDescription, CustomColor.
pub fn records_to_frame(
    records: &[TradeRecord],
    value_column: &str,
) -> Result<DataFrame, TradeError> {
    let economies: Vec<&str> = records.iter().map(|r| r.reporting_economy.as_str()).collect();
    let sectors: Vec<i64> = records.iter().map(|r| r.product_sector).collect();
    let years: Vec<i32> = records.iter().map(|r| r.year).collect();
    let values: Vec<f64> = records.iter().map(|r| r.value).collect();
    let logs: Vec<f64> = records.iter().map(|r| r.log_value).collect();
    let labels: Vec<&str> = records.iter().map(|r| r.sector_label.as_str()).collect();
    let colors: Vec<&str> = records.iter().map(|r| r.display_color.as_str()).collect();

    let df = DataFrame::new(vec![
        Column::new(long::REPORTING_ECONOMY.into(), &economies),
        Column::new(long::PRODUCT_SECTOR.into(), &sectors),
        Column::new(long::YEAR.into(), &years),
        Column::new(value_column.into(), &values),
        Column::new(long::log_column(value_column).into(), &logs),
        Column::new(long::SECTOR_DESCRIPTION.into(), &labels),
        Column::new(long::CUSTOM_COLOR.into(), &colors),
    ])?;
    Ok(df)
}

pub(crate) fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), TradeError> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(TradeError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

/// Every non-id column is a year column; its label must parse as an integer.
fn year_columns(table: &DataFrame) -> Result<Vec<(String, i32)>, TradeError> {
    let mut seen = HashSet::new();
    let mut years = Vec::new();
    for name in table.get_column_names_str() {
        if wide::ID_COLUMNS.contains(&name) {
            continue;
        }
        let year = name
            .trim()
            .parse::<i32>()
            .map_err(|_| TradeError::MalformedYearLabel {
                column: name.to_string(),
            })?;
        if !seen.insert(year) {
            return Err(TradeError::DuplicateYear { year });
        }
        years.push((name.to_string(), year));
    }
    Ok(years)
}

/// Null economies are rejected before filtering, reporting the first one.
fn require_economies(table: &DataFrame) -> Result<(), TradeError> {
    let economies = table.column(wide::REPORTING_ECONOMY)?;
    if economies.null_count() == 0 {
        return Ok(());
    }
    let nulls = economies.is_null();
    let row = (&nulls)
        .into_iter()
        .position(|null| null == Some(true))
        .unwrap_or_default();
    Err(TradeError::MissingEconomy { row })
}

/// Cast the year columns to Float64, trimming string cells first.
/// Integer sector columns become Int64; other sector columns go through
/// the same Float64 path as the years.
/// Unparsable cells become null and are reported per record.
fn normalize_numeric(df: &DataFrame, years: &[(String, i32)]) -> Result<DataFrame, TradeError> {
    let mut exprs = Vec::with_capacity(years.len() + 1);
    if df.column(wide::PRODUCT_SECTOR)?.dtype().is_integer() {
        exprs.push(col(wide::PRODUCT_SECTOR).cast(DataType::Int64));
    } else {
        exprs.push(numeric_expr(df, wide::PRODUCT_SECTOR)?);
    }
    for (label, _) in years {
        exprs.push(numeric_expr(df, label)?);
    }
    Ok(df.clone().lazy().with_columns(exprs).collect()?)
}

fn numeric_expr(df: &DataFrame, name: &str) -> Result<Expr, TradeError> {
    let expr = match df.column(name)?.dtype() {
        DataType::String => col(name)
            .str()
            .strip_chars(lit(" \t\r\n"))
            .cast(DataType::Float64),
        _ => col(name).cast(DataType::Float64),
    };
    Ok(expr)
}

/// Sector codes per row; `None` for missing or non-integral cells.
fn sector_codes(column: &Column) -> Result<Vec<Option<i64>>, TradeError> {
    if column.dtype() == &DataType::Int64 {
        return Ok(column.i64()?.into_iter().collect());
    }
    Ok(column
        .f64()?
        .into_iter()
        .map(|code| {
            code.filter(|c| c.is_finite() && c.fract() == 0.0)
                .map(|c| c as i64)
        })
        .collect())
}

fn raw_cell(column: &Column, row: usize) -> String {
    match column.get(row) {
        Ok(AnyValue::Null) | Err(_) => String::new(),
        Ok(AnyValue::String(s)) => s.to_string(),
        Ok(AnyValue::StringOwned(s)) => s.to_string(),
        Ok(other) => format!("{other}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use super::*;
    use crate::reference::ColorKey;

    fn france_table() -> DataFrame {
        df!(
            "Reporting Economy" => ["France"],
            "Product/Sector" => [1i64],
            "2018" => [100.0],
            "2019" => [200.0]
        )
        .unwrap()
    }

    #[test]
    fn france_scenario() {
        let records = TradeFlowTransformer::default()
            .reshape(&france_table(), "ExportValue")
            .unwrap();

        assert_eq!(
            records,
            vec![
                TradeRecord {
                    reporting_economy: "France".into(),
                    product_sector: 1,
                    year: 2018,
                    value: 100.0,
                    log_value: 100f64.ln(),
                    sector_label: "Light Industry".into(),
                    display_color: "lightblue".into(),
                },
                TradeRecord {
                    reporting_economy: "France".into(),
                    product_sector: 1,
                    year: 2019,
                    value: 200.0,
                    log_value: 200f64.ln(),
                    sector_label: "Light Industry".into(),
                    display_color: "lightblue".into(),
                },
            ]
        );
    }

    #[test]
    fn drops_economies_outside_the_filter() {
        let table = df!(
            "Reporting Economy" => ["Brazil", "france", "Japan"],
            "Product/Sector" => [1i64, 1, 3],
            "2020" => [5.0, 6.0, 7.0]
        )
        .unwrap();

        let records = TradeFlowTransformer::default()
            .reshape(&table, "ImportValue")
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].reporting_economy, "Japan");
        assert_eq!(records[0].display_color, "darkgreen");
        assert_eq!(records[0].sector_label, "Raw Materials");
    }

    #[test]
    fn records_are_row_major() {
        let table = df!(
            "Reporting Economy" => ["Germany", "France"],
            "Product/Sector" => [2i64, 3],
            "2001" => [1.0, 3.0],
            "2000" => [2.0, 4.0]
        )
        .unwrap();

        let records = TradeFlowTransformer::default()
            .reshape(&table, "ExportValue")
            .unwrap();
        let keys: Vec<(&str, i32)> = records
            .iter()
            .map(|r| (r.reporting_economy.as_str(), r.year))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Germany", 2001),
                ("Germany", 2000),
                ("France", 2001),
                ("France", 2000)
            ]
        );
    }

    #[test]
    fn non_positive_value_is_rejected_by_default() {
        let table = df!(
            "Reporting Economy" => ["France"],
            "Product/Sector" => [2i64],
            "2018" => [0.0]
        )
        .unwrap();

        let err = TradeFlowTransformer::default()
            .reshape(&table, "ExportValue")
            .unwrap_err();
        match err {
            TradeError::NonPositiveValue {
                economy,
                sector,
                year,
                value,
            } => {
                assert_eq!(economy, "France");
                assert_eq!(sector, 2);
                assert_eq!(year, 2018);
                assert_eq!(value, 0.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn nan_policy_keeps_non_positive_records() {
        let table = df!(
            "Reporting Economy" => ["France"],
            "Product/Sector" => [2i64],
            "2018" => [-3.0],
            "2019" => [10.0]
        )
        .unwrap();

        let transformer =
            TradeFlowTransformer::new(ReferenceTables::default(), NonPositivePolicy::Nan);
        let records = transformer.reshape(&table, "ExportValue").unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].log_value.is_nan());
        assert_eq!(records[1].log_value, 10f64.ln());
    }

    #[test]
    fn unknown_sector_code() {
        let table = df!(
            "Reporting Economy" => ["Germany"],
            "Product/Sector" => [4i64],
            "2018" => [1.0]
        )
        .unwrap();

        let err = TradeFlowTransformer::default()
            .reshape(&table, "ExportValue")
            .unwrap_err();
        assert!(matches!(err, TradeError::UnknownSectorCode { code: 4, .. }));
    }

    #[test]
    fn unknown_color_key_with_injected_tables() {
        let reference = ReferenceTables::new(
            vec!["Chile".into()],
            BTreeMap::from([(1, "Light Industry".to_string())]),
            HashMap::from([(ColorKey::new("France", 1), "lightblue".to_string())]),
        );
        let table = df!(
            "Reporting Economy" => ["Chile"],
            "Product/Sector" => [1i64],
            "2018" => [1.0]
        )
        .unwrap();

        let err = TradeFlowTransformer::new(reference, NonPositivePolicy::Reject)
            .reshape(&table, "ExportValue")
            .unwrap_err();
        assert!(matches!(
            err,
            TradeError::UnknownColorKey { ref economy, sector: 1 } if economy == "Chile"
        ));
    }

    #[test]
    fn malformed_year_label_fails_even_without_rows() {
        let table = df!(
            "Reporting Economy" => ["Brazil"],
            "Product/Sector" => [1i64],
            "FY2019" => [1.0]
        )
        .unwrap();

        let err = TradeFlowTransformer::default()
            .reshape(&table, "ExportValue")
            .unwrap_err();
        assert!(
            matches!(err, TradeError::MalformedYearLabel { ref column } if column == "FY2019")
        );
    }

    #[test]
    fn padded_year_labels_parse() {
        let table = df!(
            "Reporting Economy" => ["France"],
            "Product/Sector" => [1i64],
            " 2018 " => [1.0]
        )
        .unwrap();

        let records = TradeFlowTransformer::default()
            .reshape(&table, "ExportValue")
            .unwrap();
        assert_eq!(records[0].year, 2018);
    }

    #[test]
    fn duplicate_year_after_trim() {
        let table = df!(
            "Reporting Economy" => ["France"],
            "Product/Sector" => [1i64],
            "2018" => [1.0],
            "2018 " => [2.0]
        )
        .unwrap();

        let err = TradeFlowTransformer::default()
            .reshape(&table, "ExportValue")
            .unwrap_err();
        assert!(matches!(err, TradeError::DuplicateYear { year: 2018 }));
        assert!(err.is_data_quality());
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let table = df!(
            "Reporting Economy" => ["France", "France"],
            "Product/Sector" => [1i64, 1],
            "2018" => [1.0, 2.0]
        )
        .unwrap();

        let err = TradeFlowTransformer::default()
            .reshape(&table, "ExportValue")
            .unwrap_err();
        assert!(matches!(err, TradeError::DuplicateKey { sector: 1, .. }));
    }

    #[test]
    fn string_cells_are_trimmed_and_parsed() {
        let table = df!(
            "Reporting Economy" => ["Brazil", "Japan"],
            "Product/Sector" => ["x", " 2.0 "],
            "2018" => ["nope", " 1500.5"]
        )
        .unwrap();

        let records = TradeFlowTransformer::default()
            .reshape(&table, "ExportValue")
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].product_sector, 2);
        assert_eq!(records[0].value, 1500.5);
    }

    #[test]
    fn invalid_cells_name_the_offending_data() {
        let table = df!(
            "Reporting Economy" => ["Brazil", "Japan"],
            "Product/Sector" => ["1", "2"],
            "2018" => ["1", "n/a"]
        )
        .unwrap();

        let err = TradeFlowTransformer::default()
            .reshape(&table, "ExportValue")
            .unwrap_err();
        match err {
            TradeError::InvalidValue {
                economy,
                sector,
                column,
                raw,
            } => {
                assert_eq!(economy, "Japan");
                assert_eq!(sector, 2);
                assert_eq!(column, "2018");
                assert_eq!(raw, "n/a");
            }
            other => panic!("unexpected error: {other}"),
        }

        let table = df!(
            "Reporting Economy" => ["Brazil", "Japan"],
            "Product/Sector" => ["1", "two"],
            "2018" => ["1", "2"]
        )
        .unwrap();
        let err = TradeFlowTransformer::default()
            .reshape(&table, "ExportValue")
            .unwrap_err();
        assert!(matches!(
            err,
            TradeError::InvalidSectorCode { row: 1, ref raw } if raw == "two"
        ));
    }

    #[test]
    fn null_economy_is_reported_with_its_row() {
        let table = df!(
            "Reporting Economy" => [Some("France"), None],
            "Product/Sector" => [1i64, 2],
            "2018" => [1.0, 2.0]
        )
        .unwrap();

        let err = TradeFlowTransformer::default()
            .reshape(&table, "ExportValue")
            .unwrap_err();
        assert!(matches!(err, TradeError::MissingEconomy { row: 1 }));
        assert!(err.is_data_quality());
    }

    #[test]
    fn large_integer_sector_codes_keep_precision() {
        let code = (1i64 << 53) + 1;
        let table = df!(
            "Reporting Economy" => ["Japan"],
            "Product/Sector" => [code],
            "2018" => [1.0]
        )
        .unwrap();

        let err = TradeFlowTransformer::default()
            .reshape(&table, "ExportValue")
            .unwrap_err();
        assert!(matches!(err, TradeError::UnknownSectorCode { code: c, .. } if c == code));
    }

    #[test]
    fn narrow_integer_sector_columns_are_accepted() {
        let table = df!(
            "Reporting Economy" => ["Germany"],
            "Product/Sector" => [3i32],
            "2018" => [4.0]
        )
        .unwrap();

        let records = TradeFlowTransformer::default()
            .reshape(&table, "ImportValue")
            .unwrap();
        assert_eq!(records[0].product_sector, 3);
        assert_eq!(records[0].display_color, "darkred");
    }

    #[test]
    fn missing_id_column() {
        let table = df!("Reporting Economy" => ["France"], "2018" => [1.0]).unwrap();
        let err = TradeFlowTransformer::default()
            .reshape(&table, "ExportValue")
            .unwrap_err();
        assert!(matches!(err, TradeError::MissingColumn(ref c) if c == "Product/Sector"));
    }

    #[test]
    fn frame_uses_dashboard_column_names() {
        let df = TradeFlowTransformer::default()
            .reshape_frame(&france_table(), "ExportValue")
            .unwrap();

        assert_eq!(
            df.get_column_names_str(),
            vec![
                "Reporting Economy",
                "Product/Sector",
                "Year",
                "ExportValue",
                "LogExportValue",
                "SectorDescription",
                "CustomColor"
            ]
        );
        assert_eq!(df.height(), 2);
        let years = df
            .column("Year")
            .unwrap()
            .as_materialized_series()
            .i32()
            .unwrap()
            .clone();
        assert_eq!(years.get(1), Some(2019));
    }
}
