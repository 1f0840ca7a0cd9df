//! Apple App Store export normalization

use polars::prelude::*;
use tracing::info;

use crate::data::{drop_duplicate_rows, trim_column_names};
use crate::schema::{
    apply_rules, fields, flag_series, ColumnMatch, FieldDefault, FieldKind, FieldRule,
};

const APPLE_RULES: &[FieldRule] = &[
    FieldRule::new(
        fields::APPLE_PRICE,
        &[ColumnMatch::Exact("price"), ColumnMatch::Exact("Price")],
        FieldKind::Number,
        FieldDefault::Zero,
    ),
    FieldRule::new(
        fields::APPLE_RATING,
        &[ColumnMatch::Exact("user_rating"), ColumnMatch::Exact("rating")],
        FieldKind::Number,
        FieldDefault::Missing,
    ),
    // Decimal megabytes, unlike the binary `k` suffix of Google sizes
    FieldRule::new(
        fields::APPLE_SIZE_MB,
        &[ColumnMatch::Exact("size_bytes")],
        FieldKind::BytesToMb,
        FieldDefault::Missing,
    ),
    FieldRule::new(
        fields::APPLE_RATING_COUNT,
        &[
            ColumnMatch::Exact("rating_count_tot"),
            ColumnMatch::ContainsAll(&["rating", "count"]),
        ],
        FieldKind::Int,
        FieldDefault::Zero,
    ),
];

const CATEGORY_RULE: FieldRule = FieldRule::new(
    fields::CATEGORY,
    &[
        ColumnMatch::Exact("prime_genre"),
        ColumnMatch::Exact("primeGenre"),
        ColumnMatch::Exact("genre"),
    ],
    FieldKind::Text,
    FieldDefault::Literal(fields::UNKNOWN_CATEGORY),
);

/// Normalize a raw Apple App Store table.
///
/// There is no install count in this source, so `log_installs` is null on
/// every row.
pub fn normalize_apple(raw: &DataFrame) -> crate::Result<DataFrame> {
    let df = trim_column_names(raw)?;
    let mut df = drop_duplicate_rows(&df)?;

    apply_rules(&mut df, APPLE_RULES)?;

    let prices: Vec<f64> = df
        .column(fields::APPLE_PRICE)?
        .as_materialized_series()
        .f64()?
        .into_no_null_iter()
        .collect();
    df.with_column(flag_series(fields::IS_PAID, &prices, |price| price > 0.0))?;

    let category = CATEGORY_RULE.materialize(&df)?;
    df.with_column(category)?;

    let height = df.height();
    df.with_column(Series::new(
        fields::LOG_INSTALLS.into(),
        vec![None::<f64>; height],
    ))?;

    info!(rows_in = raw.height(), rows_out = df.height(), "normalized Apple table");
    Ok(df)
}
