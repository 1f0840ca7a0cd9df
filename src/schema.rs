//! Declarative mapping from source columns to canonical fields
//!
//! Each normalizer is described by a list of [`FieldRule`]s. A rule names the
//! canonical column it produces, the source columns it may read from (in
//! priority order), how the text is coerced, and what to use when no source
//! column exists.

use polars::prelude::*;
use tracing::debug;

use crate::coerce;
use crate::data::{column_names, text_values};

/// Canonical column names
pub mod fields {
    pub const APP: &str = "App";
    pub const CATEGORY: &str = "Category";
    pub const INSTALLS: &str = "Installs";
    pub const PRICE: &str = "Price";
    pub const SIZE_MB: &str = "SizeMB";
    pub const RATING: &str = "Rating";
    pub const REVIEWS: &str = "Reviews";
    pub const IS_PAID: &str = "IsPaid";
    pub const HAS_IAP: &str = "HasIAP";
    pub const LOG_INSTALLS: &str = "log_installs";
    pub const CLUSTER: &str = "cluster";

    pub const APPLE_PRICE: &str = "price";
    pub const APPLE_RATING: &str = "user_rating";
    pub const APPLE_SIZE_MB: &str = "size_mb";
    pub const APPLE_RATING_COUNT: &str = "rating_count";

    pub const UNKNOWN_CATEGORY: &str = "Unknown";
}

/// How a rule recognises its source column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnMatch {
    /// Exact, case-sensitive column name
    Exact(&'static str),
    /// Lowercased name contains at least one of the substrings
    ContainsAny(&'static [&'static str]),
    /// Lowercased name contains every one of the substrings
    ContainsAll(&'static [&'static str]),
}

impl ColumnMatch {
    fn matches(&self, column: &str) -> bool {
        match self {
            ColumnMatch::Exact(name) => column == *name,
            ColumnMatch::ContainsAny(parts) => {
                let lowered = column.to_lowercase();
                parts.iter().any(|part| lowered.contains(part))
            }
            ColumnMatch::ContainsAll(parts) => {
                let lowered = column.to_lowercase();
                parts.iter().all(|part| lowered.contains(part))
            }
        }
    }

    fn is_substring(&self) -> bool {
        !matches!(self, ColumnMatch::Exact(_))
    }
}

/// Coercion applied to each source cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `"1,000,000+"` counts
    Count,
    /// `"2,345"` integers
    GroupedInt,
    /// Plain integers
    Int,
    /// `"$2.99"` amounts
    Currency,
    /// Plain floats
    Number,
    /// `"19M"` / `"512k"` sizes in megabytes
    Size,
    /// Byte counts converted to decimal megabytes
    BytesToMb,
    /// 1 when the source cell is non-null
    Presence,
    /// Values copied as text
    Text,
}

/// Value used when a cell cannot be determined
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Zero,
    Missing,
    Literal(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub target: &'static str,
    pub sources: &'static [ColumnMatch],
    pub kind: FieldKind,
    pub default: FieldDefault,
}

impl FieldRule {
    pub const fn new(
        target: &'static str,
        sources: &'static [ColumnMatch],
        kind: FieldKind,
        default: FieldDefault,
    ) -> Self {
        Self {
            target,
            sources,
            kind,
            default,
        }
    }

    /// First source column present in `columns`, by rule priority and then by
    /// column order. Substring matches never select the rule's own target,
    /// so a previously derived column is not mistaken for source data.
    pub fn resolve<'a>(&self, columns: &'a [String]) -> Option<&'a str> {
        self.sources.iter().find_map(|source| {
            columns
                .iter()
                .find(|column| {
                    source.matches(column)
                        && !(source.is_substring() && column.as_str() == self.target)
                })
                .map(String::as_str)
        })
    }

    /// Build the canonical column for this rule from `df`
    pub fn materialize(&self, df: &DataFrame) -> crate::Result<Series> {
        let columns = column_names(df);
        let raw = match self.resolve(&columns) {
            Some(source) => {
                debug!(target_field = self.target, source, "resolved source column");
                Some(text_values(df, source)?)
            }
            None => {
                debug!(
                    target_field = self.target,
                    default = ?self.default,
                    "no source column, using default"
                );
                None
            }
        };

        Ok(build_series(self, raw, df.height()))
    }
}

fn build_series(rule: &FieldRule, raw: Option<Vec<Option<String>>>, height: usize) -> Series {
    let name: PlSmallStr = rule.target.into();

    let ints = |parse: fn(&str) -> Option<i64>| -> Vec<i64> {
        match &raw {
            Some(values) => values
                .iter()
                .map(|v| v.as_deref().and_then(parse).unwrap_or(0))
                .collect(),
            None => vec![0; height],
        }
    };
    let floats = |parse: fn(&str) -> Option<f64>| -> Vec<Option<f64>> {
        match &raw {
            Some(values) => values
                .iter()
                .map(|v| v.as_deref().and_then(parse))
                .collect(),
            None => vec![None; height],
        }
    };

    match rule.kind {
        FieldKind::Count => Series::new(name, ints(coerce::parse_count)),
        FieldKind::GroupedInt => Series::new(name, ints(coerce::parse_grouped_int)),
        FieldKind::Int => Series::new(name, ints(coerce::parse_int)),
        FieldKind::Currency | FieldKind::Number | FieldKind::Size | FieldKind::BytesToMb => {
            let parse: fn(&str) -> Option<f64> = match rule.kind {
                FieldKind::Currency => coerce::parse_currency,
                FieldKind::Size => coerce::parse_size,
                FieldKind::BytesToMb => coerce::bytes_to_mb,
                _ => coerce::parse_number,
            };
            let values = floats(parse);
            match rule.default {
                FieldDefault::Zero => Series::new(
                    name,
                    values.into_iter().map(|v| v.unwrap_or(0.0)).collect::<Vec<f64>>(),
                ),
                _ => Series::new(name, values),
            }
        }
        FieldKind::Presence => {
            let flags: Vec<i32> = match &raw {
                Some(values) => values.iter().map(|v| i32::from(v.is_some())).collect(),
                None => vec![0; height],
            };
            Series::new(name, flags)
        }
        FieldKind::Text => match (&raw, rule.default) {
            (Some(values), _) => Series::new(name, values.clone()),
            (None, FieldDefault::Literal(text)) => Series::new(name, vec![text; height]),
            (None, _) => Series::new(name, vec![None::<String>; height]),
        },
    }
}

/// Apply rules in order, replacing same-named columns in place and appending
/// new ones
pub fn apply_rules(df: &mut DataFrame, rules: &[FieldRule]) -> crate::Result<()> {
    for rule in rules {
        let series = rule.materialize(df)?;
        df.with_column(series)?;
    }
    Ok(())
}

/// 0/1 flag column from a predicate over a float column
pub fn flag_series(name: &str, values: &[f64], predicate: impl Fn(f64) -> bool) -> Series {
    let flags: Vec<i32> = values.iter().map(|v| i32::from(predicate(*v))).collect();
    Series::new(name.into(), flags)
}
