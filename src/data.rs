//! Table loading, persistence and column views using Polars

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use tracing::{debug, warn};

/// Load a CSV file with every column read as text.
///
/// Schema inference is disabled so that values like `"1,000,000+"` or `"$0"`
/// reach the coercions unchanged. Empty fields are nulls, quoted or not.
pub fn read_csv_table(path: &Path) -> crate::Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let blanks_to_null: Vec<Expr> = df
        .get_column_names()
        .into_iter()
        .map(|name| {
            let name = name.as_str();
            when(col(name).eq(lit("")))
                .then(lit(NULL).cast(DataType::String))
                .otherwise(col(name))
                .alias(name)
        })
        .collect();
    let df = df.lazy().with_columns(blanks_to_null).collect()?;

    debug!(path = %path.display(), rows = df.height(), columns = df.width(), "loaded table");
    Ok(df)
}

/// Write a table as CSV with a header row
pub fn write_csv_table(df: &mut DataFrame, path: &Path) -> crate::Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;

    debug!(path = %path.display(), rows = df.height(), "wrote table");
    Ok(())
}

/// Column names in table order
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

/// Strip surrounding whitespace from every column name.
///
/// When two headers trim to the same name the first column is kept and the
/// later ones are dropped.
pub fn trim_column_names(df: &DataFrame) -> crate::Result<DataFrame> {
    let mut seen = HashSet::with_capacity(df.width());
    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let name = column.name().trim().to_string();
        if !seen.insert(name.clone()) {
            warn!(column = %name, "duplicate column after trimming headers, keeping the first");
            continue;
        }
        columns.push(
            column
                .as_materialized_series()
                .clone()
                .with_name(name.into())
                .into_column(),
        );
    }

    Ok(DataFrame::new(columns)?)
}

/// Remove rows that repeat an earlier row across every column.
///
/// Nulls compare equal to nulls. The first occurrence is kept and row order
/// is preserved.
pub fn drop_duplicate_rows(df: &DataFrame) -> crate::Result<DataFrame> {
    let columns = column_names(df)
        .iter()
        .map(|name| text_values(df, name))
        .collect::<crate::Result<Vec<_>>>()?;

    let mut seen: HashSet<Vec<Option<&str>>> = HashSet::with_capacity(df.height());
    let keep: Vec<bool> = (0..df.height())
        .map(|row| {
            let key = columns
                .iter()
                .map(|values| values[row].as_deref())
                .collect::<Vec<_>>();
            seen.insert(key)
        })
        .collect();

    let dropped = keep.iter().filter(|k| !**k).count();
    if dropped == 0 {
        return Ok(df.clone());
    }

    debug!(dropped, "removed duplicate rows");
    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    Ok(df.filter(&mask)?)
}

/// Keep the rows whose mask entry is true
pub fn filter_rows(df: &DataFrame, keep: &[bool]) -> crate::Result<DataFrame> {
    let mask = BooleanChunked::from_slice("keep".into(), keep);
    Ok(df.filter(&mask)?)
}

/// A column rendered as text, nulls preserved
pub fn text_values(df: &DataFrame, name: &str) -> crate::Result<Vec<Option<String>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;

    let values = series
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect();
    Ok(values)
}

/// A column read as floats; nulls and non-numeric text are `None`
pub fn numeric_values(df: &DataFrame, name: &str) -> crate::Result<Vec<Option<f64>>> {
    Ok(text_values(df, name)?
        .into_iter()
        .map(|value| value.as_deref().and_then(crate::coerce::parse_number))
        .collect())
}
