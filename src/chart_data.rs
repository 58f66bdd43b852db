//! Chart builders: pure functions mapping the filtered table to renderable
//! chart data. Every builder signals an empty table with `None` instead of
//! producing a zero-row chart.

use color_eyre::Result;
use polars::prelude::*;

use crate::insights::{self, CorrelationMatrix};
use crate::loader::{CATEGORY_COLUMN, QUALITY_COLUMN};

/// One histogram series: (quality value, row count) points, sorted by quality.
#[derive(Debug, Clone)]
pub struct HistogramSeries {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

/// Distribution of quality scores, aggregated or split per category.
#[derive(Debug, Clone)]
pub struct QualityHistogram {
    pub series: Vec<HistogramSeries>,
}

/// Signed correlation per attribute, ascending. Only defined coefficients.
#[derive(Debug, Clone)]
pub struct CorrelationBars {
    pub bars: Vec<(String, f64)>,
}

/// Raw (quality, attribute) points plus the mean attribute value per
/// discrete quality score, connected as a line.
#[derive(Debug, Clone)]
pub struct ScatterData {
    pub attribute: String,
    pub points: Vec<(f64, f64)>,
    pub mean_line: Vec<(f64, f64)>,
}

fn count_frame(df: &DataFrame, keys: &[Expr]) -> Result<DataFrame> {
    let lf = df
        .clone()
        .lazy()
        .group_by(keys.to_vec())
        .agg([len().alias("count")])
        .sort_by_exprs([col(QUALITY_COLUMN)], SortMultipleOptions::default());
    Ok(lf.collect()?)
}

fn quality_count_points(df: &DataFrame) -> Result<Vec<(f64, f64)>> {
    let quality = df.column(QUALITY_COLUMN)?.cast(&DataType::Float64)?;
    let quality = quality.f64()?;
    let counts = df.column("count")?.cast(&DataType::Float64)?;
    let counts = counts.f64()?;

    let mut points = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        if let (Some(q), Some(c)) = (quality.get(i), counts.get(i)) {
            if q.is_finite() {
                points.push((q, c));
            }
        }
    }
    Ok(points)
}

/// Builds the quality distribution. With `grouped` set and more than one
/// category present, one series per category; otherwise a single aggregated
/// series.
pub fn quality_histogram(df: &DataFrame, grouped: bool) -> Result<Option<QualityHistogram>> {
    if df.height() == 0 {
        return Ok(None);
    }

    let split = grouped && crate::filter::categories_present(df)? > 1;
    if !split {
        let counts = count_frame(df, &[col(QUALITY_COLUMN)])?;
        let points = quality_count_points(&counts)?;
        return Ok(Some(QualityHistogram {
            series: vec![HistogramSeries {
                name: "all".to_string(),
                points,
            }],
        }));
    }

    let mut series = Vec::new();
    for category in crate::filter::FilterDomain::from_table(df)?.categories {
        let subset = df
            .clone()
            .lazy()
            .filter(col(CATEGORY_COLUMN).eq(lit(category.as_str())))
            .collect()?;
        let counts = count_frame(&subset, &[col(QUALITY_COLUMN)])?;
        series.push(HistogramSeries {
            name: category,
            points: quality_count_points(&counts)?,
        });
    }

    Ok(Some(QualityHistogram { series }))
}

/// Correlation-with-quality bars, sorted ascending by signed value. `None`
/// when the table is empty or no coefficient is defined.
pub fn correlation_bars(df: &DataFrame) -> Result<Option<CorrelationBars>> {
    let vector = match insights::correlation_vector(df)? {
        Some(vector) => vector,
        None => return Ok(None),
    };
    let bars = vector.defined_sorted();
    if bars.is_empty() {
        return Ok(None);
    }
    Ok(Some(CorrelationBars { bars }))
}

/// Full numeric correlation matrix for the heatmap. `None` for an empty table.
pub fn correlation_heatmap(df: &DataFrame) -> Result<Option<CorrelationMatrix>> {
    insights::correlation_matrix(df)
}

/// Per-category correlation bars for side-by-side comparison. `None` unless
/// at least two categories are present in the view.
pub fn correlation_comparison(df: &DataFrame) -> Result<Option<Vec<(String, CorrelationBars)>>> {
    if df.height() == 0 {
        return Ok(None);
    }
    let categories = crate::filter::FilterDomain::from_table(df)?.categories;
    if categories.len() < 2 {
        return Ok(None);
    }

    let mut out = Vec::new();
    for category in categories {
        let subset = df
            .clone()
            .lazy()
            .filter(col(CATEGORY_COLUMN).eq(lit(category.as_str())))
            .collect()?;
        if let Some(bars) = correlation_bars(&subset)? {
            out.push((category, bars));
        }
    }

    if out.is_empty() {
        return Ok(None);
    }
    Ok(Some(out))
}

/// Numeric attributes available for the scatter view (quality excluded).
pub fn scatter_attributes(df: &DataFrame) -> Vec<String> {
    df.schema()
        .iter()
        .filter(|(name, dtype)| {
            insights::is_numeric_type(dtype) && name.as_str() != QUALITY_COLUMN
        })
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Builds the scatter cloud of `attribute` against quality, with the mean
/// attribute value per discrete quality score as an overlay line.
pub fn attribute_scatter(df: &DataFrame, attribute: &str) -> Result<Option<ScatterData>> {
    if df.height() == 0 {
        return Ok(None);
    }

    let collected = df
        .clone()
        .lazy()
        .select([
            col(QUALITY_COLUMN).cast(DataType::Float64),
            col(attribute).cast(DataType::Float64),
        ])
        .drop_nulls(None)
        .collect()?;

    let quality = collected.column(QUALITY_COLUMN)?.f64()?;
    let values = collected.column(attribute)?.f64()?;

    let mut points = Vec::with_capacity(collected.height());
    for i in 0..collected.height() {
        if let (Some(q), Some(v)) = (quality.get(i), values.get(i)) {
            if q.is_finite() && v.is_finite() {
                points.push((q, v));
            }
        }
    }

    if points.is_empty() {
        return Ok(None);
    }

    let means = df
        .clone()
        .lazy()
        .group_by([col(QUALITY_COLUMN).cast(DataType::Float64)])
        .agg([col(attribute).cast(DataType::Float64).mean().alias("mean")])
        .sort_by_exprs([col(QUALITY_COLUMN)], SortMultipleOptions::default())
        .collect()?;

    let mean_quality = means.column(QUALITY_COLUMN)?.f64()?;
    let mean_values = means.column("mean")?.f64()?;
    let mut mean_line = Vec::with_capacity(means.height());
    for i in 0..means.height() {
        if let (Some(q), Some(m)) = (mean_quality.get(i), mean_values.get(i)) {
            if q.is_finite() && m.is_finite() {
                mean_line.push((q, m));
            }
        }
    }

    Ok(Some(ScatterData {
        attribute: attribute.to_string(),
        points,
        mean_line,
    }))
}
