//! Google Play export normalization

use polars::prelude::*;
use tracing::{debug, info};

use super::{DropPolicy, NormalizeOptions};
use crate::data::{drop_duplicate_rows, filter_rows, has_column, text_values, trim_column_names};
use crate::schema::{
    apply_rules, fields, flag_series, ColumnMatch, FieldDefault, FieldKind, FieldRule,
};

const GOOGLE_RULES: &[FieldRule] = &[
    FieldRule::new(
        fields::CATEGORY,
        &[ColumnMatch::Exact("Category")],
        FieldKind::Text,
        FieldDefault::Literal(fields::UNKNOWN_CATEGORY),
    ),
    FieldRule::new(
        fields::INSTALLS,
        &[ColumnMatch::Exact("Installs")],
        FieldKind::Count,
        FieldDefault::Zero,
    ),
    FieldRule::new(
        fields::PRICE,
        &[ColumnMatch::Exact("Price")],
        FieldKind::Currency,
        FieldDefault::Zero,
    ),
    FieldRule::new(
        fields::SIZE_MB,
        &[ColumnMatch::Exact("Size")],
        FieldKind::Size,
        FieldDefault::Missing,
    ),
    FieldRule::new(
        fields::RATING,
        &[ColumnMatch::Exact("Rating")],
        FieldKind::Number,
        FieldDefault::Missing,
    ),
    FieldRule::new(
        fields::REVIEWS,
        &[ColumnMatch::Exact("Reviews")],
        FieldKind::GroupedInt,
        FieldDefault::Zero,
    ),
];

/// In-app purchase detection: the first column, in table order, whose name
/// looks like an IAP flag
const HAS_IAP_RULE: FieldRule = FieldRule::new(
    fields::HAS_IAP,
    &[ColumnMatch::ContainsAny(&["in-app", "inapp", "iap"])],
    FieldKind::Presence,
    FieldDefault::Zero,
);

/// Normalize a raw Google Play table.
///
/// Column names are trimmed and exact duplicate rows removed before any field
/// is derived. Every canonical field is present in the output; absent source
/// columns yield the field default.
pub fn normalize_google(raw: &DataFrame, options: &NormalizeOptions) -> crate::Result<DataFrame> {
    let df = trim_column_names(raw)?;
    let df = drop_duplicate_rows(&df)?;
    let mut df = drop_unidentified_rows(&df, options.drop_policy)?;

    apply_rules(&mut df, GOOGLE_RULES)?;

    let prices: Vec<f64> = df
        .column(fields::PRICE)?
        .as_materialized_series()
        .f64()?
        .into_no_null_iter()
        .collect();
    df.with_column(flag_series(fields::IS_PAID, &prices, |price| price > 0.0))?;

    let has_iap = HAS_IAP_RULE.materialize(&df)?;
    df.with_column(has_iap)?;

    let log_installs: Vec<f64> = df
        .column(fields::INSTALLS)?
        .as_materialized_series()
        .i64()?
        .into_no_null_iter()
        .map(|installs| (installs as f64).ln_1p())
        .collect();
    df.with_column(Series::new(fields::LOG_INSTALLS.into(), log_installs))?;

    info!(rows_in = raw.height(), rows_out = df.height(), "normalized Google table");
    Ok(df)
}

/// Drop rows lacking an app identity, only when both App and Category exist
fn drop_unidentified_rows(df: &DataFrame, policy: DropPolicy) -> crate::Result<DataFrame> {
    if !(has_column(df, fields::APP) && has_column(df, fields::CATEGORY)) {
        return Ok(df.clone());
    }

    let apps = text_values(df, fields::APP)?;
    let categories = text_values(df, fields::CATEGORY)?;
    let keep: Vec<bool> = apps
        .iter()
        .zip(categories.iter())
        .map(|(app, category)| match policy {
            DropPolicy::BothMissing => app.is_some() || category.is_some(),
            DropPolicy::AnyMissing => app.is_some() && category.is_some(),
        })
        .collect();

    let dropped = keep.iter().filter(|k| !**k).count();
    if dropped == 0 {
        return Ok(df.clone());
    }
    debug!(dropped, ?policy, "dropped rows without app identity");
    filter_rows(df, &keep)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(df: &DataFrame) -> DataFrame {
        normalize_google(df, &NormalizeOptions::default()).unwrap()
    }

    fn f64_column(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect()
    }

    fn i64_column(df: &DataFrame, name: &str) -> Vec<i64> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect()
    }

    fn i32_column(df: &DataFrame, name: &str) -> Vec<i32> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .i32()
            .unwrap()
            .into_no_null_iter()
            .collect()
    }

    fn sample_raw() -> DataFrame {
        df!(
            "App" => ["X", "Y", "Z"],
            "Category" => ["GAME", "TOOLS", "GAME"],
            "Installs" => ["1,000,000+", "0", "Free"],
            "Price" => ["$0", "$4.99", "Everyone"],
            "Rating" => ["4.5", "NaN", "3"],
            "Reviews" => ["2,345", "10", "3.0M"],
            "Size" => ["19M", "Varies with device", "512k"]
        )
        .unwrap()
    }

    #[test]
    fn test_full_row_scenario() {
        let df = normalize(&sample_raw());

        assert_eq!(df.height(), 3);
        assert_eq!(i64_column(&df, "Installs")[0], 1_000_000);
        assert_eq!(f64_column(&df, "Price")[0], Some(0.0));
        assert_eq!(i32_column(&df, "IsPaid")[0], 0);
        assert_eq!(f64_column(&df, "Rating")[0], Some(4.5));
        assert_eq!(i64_column(&df, "Reviews")[0], 2345);
        assert_eq!(f64_column(&df, "SizeMB")[0], Some(19.0));

        let log_installs = f64_column(&df, "log_installs")[0].unwrap();
        assert!((log_installs - 13.816).abs() < 1e-3);
    }

    #[test]
    fn test_varies_with_device_only_affects_size() {
        let df = normalize(&sample_raw());

        assert_eq!(f64_column(&df, "SizeMB")[1], None);
        assert_eq!(i64_column(&df, "Installs")[1], 0);
        assert_eq!(f64_column(&df, "Price")[1], Some(4.99));
        assert_eq!(i64_column(&df, "Reviews")[1], 10);
    }

    #[test]
    fn test_unparsable_values_take_defaults() {
        let df = normalize(&sample_raw());

        assert_eq!(i64_column(&df, "Installs")[2], 0);
        assert_eq!(f64_column(&df, "Price")[2], Some(0.0));
        assert_eq!(i64_column(&df, "Reviews")[2], 0);
        assert_eq!(f64_column(&df, "Rating")[1], None);
        assert_eq!(f64_column(&df, "SizeMB")[2], Some(0.5));
    }

    #[test]
    fn test_is_paid_follows_price() {
        let df = normalize(&sample_raw());
        let prices = f64_column(&df, "Price");
        let paid = i32_column(&df, "IsPaid");

        for (price, flag) in prices.iter().zip(paid.iter()) {
            assert_eq!(*flag == 1, price.unwrap() > 0.0);
        }
        assert_eq!(paid, vec![0, 1, 0]);
    }

    #[test]
    fn test_log_installs_zero_and_monotone() {
        let raw = df!("Installs" => ["0", "10+", "1,000+", "100,000+"]).unwrap();
        let df = normalize(&raw);
        let logs: Vec<f64> = f64_column(&df, "log_installs")
            .into_iter()
            .map(Option::unwrap)
            .collect();

        assert_eq!(logs[0], 0.0);
        assert!(logs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_missing_columns_use_defaults() {
        let raw = df!("App" => ["only"]).unwrap();
        let df = normalize(&raw);

        assert_eq!(i64_column(&df, "Installs"), vec![0]);
        assert_eq!(f64_column(&df, "Price"), vec![Some(0.0)]);
        assert_eq!(f64_column(&df, "SizeMB"), vec![None]);
        assert_eq!(f64_column(&df, "Rating"), vec![None]);
        assert_eq!(i64_column(&df, "Reviews"), vec![0]);
        assert_eq!(i32_column(&df, "HasIAP"), vec![0]);
        assert_eq!(f64_column(&df, "log_installs"), vec![Some(0.0)]);
        let category = df
            .column("Category")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .get(0)
            .map(str::to_string);
        assert_eq!(category.as_deref(), Some("Unknown"));
    }

    #[test]
    fn test_has_iap_uses_first_matching_column() {
        let raw = df!(
            "App" => ["a", "b", "c"],
            "Contains InApp" => [Some("yes"), None, Some("yes")],
            "In-App Purchases" => [Some("yes"), Some("yes"), Some("yes")]
        )
        .unwrap();
        let df = normalize(&raw);

        assert_eq!(i32_column(&df, "HasIAP"), vec![1, 0, 1]);
    }

    #[test]
    fn test_quoted_empty_cells_from_csv_are_missing() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "App,Category,In-App,Installs").unwrap();
        writeln!(file, "\"\",\"\",\"\",10+").unwrap();
        writeln!(file, "a,GAME,\"\",5+").unwrap();
        writeln!(file, "b,\"\",yes,1+").unwrap();
        let raw = crate::data::read_csv_table(file.path()).unwrap();
        let df = normalize(&raw);

        assert_eq!(df.height(), 2);
        assert_eq!(i32_column(&df, "HasIAP"), vec![0, 1]);
        assert_eq!(
            text_values(&df, "Category").unwrap(),
            vec![Some("GAME".to_string()), Some("Unknown".to_string())]
        );
    }

    #[test]
    fn test_duplicates_and_whitespace_headers() {
        let raw = df!(
            " App " => ["a", "a", "b"],
            "Category " => ["GAME", "GAME", "TOOLS"]
        )
        .unwrap();
        let df = normalize(&raw);

        assert_eq!(df.height(), 2);
        assert!(has_column(&df, "App"));
        assert!(has_column(&df, "Category"));
    }

    #[test]
    fn test_drop_policy() {
        let raw = df!(
            "App" => [Some("a"), None, None],
            "Category" => [None, Some("GAME"), None]
        )
        .unwrap();

        let both = normalize_google(&raw, &NormalizeOptions::default()).unwrap();
        assert_eq!(both.height(), 2);

        let any = normalize_google(
            &raw,
            &NormalizeOptions {
                drop_policy: DropPolicy::AnyMissing,
            },
        )
        .unwrap();
        assert_eq!(any.height(), 0);

        let no_category = df!("App" => [None::<&str>, Some("a")]).unwrap();
        assert_eq!(normalize(&no_category).height(), 2);
    }

    #[test]
    fn test_renormalizing_output_is_stable() {
        let mut raw = sample_raw();
        raw.with_column(Series::new("In-App".into(), [Some("y"), None, Some("y")]))
            .unwrap();

        let once = normalize(&raw);
        let twice = normalize(&once);

        assert!(twice.equals_missing(&once));
    }
}
