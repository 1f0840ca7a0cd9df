//! Exploratory plots over canonical tables using Plotters

use std::ops::Range;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use polars::prelude::{col, df, len, DataFrame, DataType, IdxSize, IntoLazy, SortMultipleOptions};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::data::{has_column, numeric_values, text_values};
use crate::schema::fields;

const TOP_CATEGORIES: usize = 20;
const RATING_BINS: usize = 30;
const SCATTER_SAMPLE: usize = 3000;
const SCATTER_SEED: u64 = 1;

/// One histogram bar covering `[start, end)` (the last bin is closed)
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Categories ranked by median installs, highest first
pub fn median_installs_by_category(
    df: &DataFrame,
    top_n: usize,
) -> crate::Result<Vec<(String, f64)>> {
    let frame = df!(
        fields::CATEGORY => text_values(df, fields::CATEGORY)?,
        fields::INSTALLS => numeric_values(df, fields::INSTALLS)?
    )?;

    let ranked = frame
        .lazy()
        .filter(col(fields::CATEGORY).is_not_null())
        .group_by([col(fields::CATEGORY)])
        .agg([col(fields::INSTALLS).median()])
        .sort(
            [fields::INSTALLS, fields::CATEGORY],
            SortMultipleOptions::default()
                .with_order_descending_multi([true, false])
                .with_nulls_last(true),
        )
        .limit(top_n as IdxSize)
        .collect()?;

    Ok(text_values(&ranked, fields::CATEGORY)?
        .into_iter()
        .zip(numeric_values(&ranked, fields::INSTALLS)?)
        .filter_map(|(category, median)| Some((category?, median.unwrap_or(0.0))))
        .collect())
}

/// Most frequent categories, highest count first
pub fn category_counts(df: &DataFrame, top_n: usize) -> crate::Result<Vec<(String, usize)>> {
    let ranked = df
        .clone()
        .lazy()
        .select([col(fields::CATEGORY).cast(DataType::String)])
        .filter(col(fields::CATEGORY).is_not_null())
        .group_by([col(fields::CATEGORY)])
        .agg([len().alias("count")])
        .sort(
            ["count", fields::CATEGORY],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .limit(top_n as IdxSize)
        .collect()?;

    Ok(text_values(&ranked, fields::CATEGORY)?
        .into_iter()
        .zip(numeric_values(&ranked, "count")?)
        .filter_map(|(category, count)| Some((category?, count? as usize)))
        .collect())
}

/// Equal-width histogram over the range of `values`
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (min, max) = if max > min { (min, max) } else { (min - 0.5, max + 0.5) };
    let width = (max - min) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &value in values {
        let idx = (((value - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: min + i as f64 * width,
            end: min + (i + 1) as f64 * width,
            count,
        })
        .collect()
}

/// Seeded sample of at most `max` row indices, in ascending order
pub fn sample_indices(n_rows: usize, max: usize, seed: u64) -> Vec<usize> {
    if n_rows <= max {
        return (0..n_rows).collect();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices = rand::seq::index::sample(&mut rng, n_rows, max).into_vec();
    indices.sort_unstable();
    indices
}

/// Render the Google plots that the table's columns allow
pub fn plot_google_summary(df: &DataFrame, out_dir: &Path) -> crate::Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if has_column(df, fields::CATEGORY) && has_column(df, fields::INSTALLS) {
        let bars = median_installs_by_category(df, TOP_CATEGORIES)?;
        let path = out_dir.join("gp_top_categories_installs.png");
        if draw_bar_chart(
            &path,
            "Top 20 Categories by Median Installs (Google)",
            "Median Installs",
            &bars,
        )? {
            written.push(path);
        }
    }

    if has_column(df, fields::RATING) {
        let ratings: Vec<f64> = numeric_values(df, fields::RATING)?.into_iter().flatten().collect();
        let path = out_dir.join("gp_rating_dist.png");
        if draw_histogram(
            &path,
            "Google Play Ratings Distribution",
            "Rating",
            &histogram(&ratings, RATING_BINS),
        )? {
            written.push(path);
        }
    }

    if has_column(df, fields::PRICE) && has_column(df, fields::RATING) {
        let prices = numeric_values(df, fields::PRICE)?;
        let ratings = numeric_values(df, fields::RATING)?;
        let points: Vec<(f64, f64)> = sample_indices(df.height(), SCATTER_SAMPLE, SCATTER_SEED)
            .into_iter()
            .filter_map(|i| Some((prices[i]?, ratings[i]?)))
            .collect();
        let path = out_dir.join("gp_price_vs_rating.png");
        if draw_scatter(&path, "Price vs Rating (sample)", ("Price", "Rating"), &points)? {
            written.push(path);
        }
    }

    Ok(written)
}

/// Render the Apple plots that the table's columns allow
pub fn plot_apple_summary(df: &DataFrame, out_dir: &Path) -> crate::Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if has_column(df, fields::CATEGORY) {
        let bars: Vec<(String, f64)> = category_counts(df, TOP_CATEGORIES)?
            .into_iter()
            .map(|(category, count)| (category, count as f64))
            .collect();
        let path = out_dir.join("ap_top_categories.png");
        if draw_bar_chart(&path, "Top 20 Categories (Apple)", "Count", &bars)? {
            written.push(path);
        }
    }

    if has_column(df, fields::APPLE_RATING) {
        let ratings: Vec<f64> = numeric_values(df, fields::APPLE_RATING)?
            .into_iter()
            .flatten()
            .collect();
        let path = out_dir.join("ap_rating_dist.png");
        if draw_histogram(
            &path,
            "Apple Ratings Distribution",
            "User Rating",
            &histogram(&ratings, RATING_BINS),
        )? {
            written.push(path);
        }
    }

    Ok(written)
}

/// Horizontal bars, first entry on top. Returns false when there is nothing
/// to draw.
fn draw_bar_chart(
    path: &Path,
    title: &str,
    x_desc: &str,
    bars: &[(String, f64)],
) -> crate::Result<bool> {
    if bars.is_empty() {
        debug!(path = %path.display(), "no data for bar chart");
        return Ok(false);
    }

    let n = bars.len();
    let max_value = bars.iter().map(|(_, v)| *v).fold(0.0, f64::max).max(1.0);

    let root = BitMapBackend::new(path, (1000, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(220)
        .build_cartesian_2d(0f64..(max_value * 1.05), (0..n).into_segmented())?;

    let label = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) if *i < n => bars[n - 1 - *i].0.clone(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc(x_desc)
        .y_labels(n)
        .y_label_formatter(&label)
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(i, (_, value))| {
        let row = n - 1 - i;
        Rectangle::new(
            [
                (0.0, SegmentValue::Exact(row)),
                (*value, SegmentValue::Exact(row + 1)),
            ],
            BLUE.mix(0.7).filled(),
        )
    }))?;

    root.present()?;
    debug!(path = %path.display(), "bar chart saved");
    Ok(true)
}

fn draw_histogram(
    path: &Path,
    title: &str,
    x_desc: &str,
    bins: &[HistogramBin],
) -> crate::Result<bool> {
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        debug!(path = %path.display(), "no data for histogram");
        return Ok(false);
    };
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(1).max(1) as f64;

    let root = BitMapBackend::new(path, (700, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(first.start..last.end, 0f64..(max_count * 1.1))?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("Count")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(bins.iter().map(|bin| {
        Rectangle::new([(bin.start, 0.0), (bin.end, bin.count as f64)], BLUE.mix(0.6).filled())
    }))?;

    root.present()?;
    debug!(path = %path.display(), "histogram saved");
    Ok(true)
}

fn draw_scatter(
    path: &Path,
    title: &str,
    desc: (&str, &str),
    points: &[(f64, f64)],
) -> crate::Result<bool> {
    if points.is_empty() {
        debug!(path = %path.display(), "no data for scatter plot");
        return Ok(false);
    }

    let x_range = padded_range(points.iter().map(|p| p.0));
    let y_range = padded_range(points.iter().map(|p| p.1));

    let root = BitMapBackend::new(path, (700, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc(desc.0)
        .y_desc(desc.1)
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 3, BLUE.mix(0.4).filled())),
    )?;

    root.present()?;
    debug!(path = %path.display(), "scatter plot saved");
    Ok(true)
}

fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let pad = ((hi - lo) * 0.05).max(0.5);
    (lo - pad)..(hi + pad)
}
