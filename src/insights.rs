//! Correlation of physiochemical attributes against quality, and the key
//! insight metrics derived from it.

use color_eyre::Result;
use polars::prelude::*;

use crate::loader::QUALITY_COLUMN;

/// Columns with |r| below this count as low-impact factors.
pub const LOW_IMPACT_THRESHOLD: f64 = 0.1;

/// A Pearson coefficient, or an explicit marker when the computation is
/// mathematically undefined (fewer than two rows, or zero variance on either
/// side). `Undefined` never renders as a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coefficient {
    Defined(f64),
    Undefined,
}

impl Coefficient {
    pub fn value(&self) -> Option<f64> {
        match self {
            Coefficient::Defined(v) => Some(*v),
            Coefficient::Undefined => None,
        }
    }
}

/// Per-attribute correlation against the quality column, quality excluded.
#[derive(Debug, Clone)]
pub struct CorrelationEntry {
    pub column: String,
    pub coefficient: Coefficient,
}

#[derive(Debug, Clone)]
pub struct CorrelationVector {
    pub entries: Vec<CorrelationEntry>,
}

impl CorrelationVector {
    /// Entries with a defined coefficient, sorted ascending by signed value.
    pub fn defined_sorted(&self) -> Vec<(String, f64)> {
        let mut out: Vec<(String, f64)> = self
            .entries
            .iter()
            .filter_map(|e| e.coefficient.value().map(|v| (e.column.clone(), v)))
            .collect();
        out.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        out
    }
}

/// Square correlation matrix over the numeric columns, for the heatmap.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub cells: Vec<Vec<Coefficient>>,
}

/// Headline metrics shown in the insight tiles.
#[derive(Debug, Clone)]
pub struct Insights {
    pub row_count: usize,
    pub mean_quality: f64,
    pub top_positive: Option<(String, f64)>,
    pub most_harmful: Option<(String, f64)>,
    pub low_impact_count: usize,
}

pub(crate) fn is_numeric_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Collects a numeric series into `Vec<f64>` regardless of its width.
pub(crate) fn numeric_values_as_f64(series: &Series) -> Vec<f64> {
    match series.cast(&DataType::Float64) {
        Ok(cast) => match cast.f64() {
            Ok(values) => values.iter().flatten().collect(),
            Err(_) => Vec::new(),
        },
        Err(_) => Vec::new(),
    }
}

/// Pearson correlation of two equal-length value slices. Returns `Undefined`
/// for degenerate inputs instead of NaN.
pub fn pearson(values1: &[f64], values2: &[f64]) -> Coefficient {
    if values1.len() != values2.len() || values1.len() < 2 {
        return Coefficient::Undefined;
    }

    let n = values1.len() as f64;
    let mean1 = values1.iter().sum::<f64>() / n;
    let mean2 = values2.iter().sum::<f64>() / n;

    let numerator: f64 = values1
        .iter()
        .zip(values2.iter())
        .map(|(v1, v2)| (v1 - mean1) * (v2 - mean2))
        .sum();

    let var1: f64 = values1.iter().map(|v| (v - mean1).powi(2)).sum();
    let var2: f64 = values2.iter().map(|v| (v - mean2).powi(2)).sum();

    if var1 == 0.0 || var2 == 0.0 {
        return Coefficient::Undefined;
    }

    Coefficient::Defined(numerator / (var1.sqrt() * var2.sqrt()))
}

fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.schema()
        .iter()
        .filter(|(_, dtype)| is_numeric_type(dtype))
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Correlation of every numeric column against quality, quality itself
/// excluded. `None` when the table is empty.
pub fn correlation_vector(df: &DataFrame) -> Result<Option<CorrelationVector>> {
    if df.height() == 0 {
        return Ok(None);
    }

    let quality = df.column(QUALITY_COLUMN)?.as_materialized_series();
    let quality_values = numeric_values_as_f64(quality);

    let mut entries = Vec::new();
    for name in numeric_columns(df) {
        if name == QUALITY_COLUMN {
            continue;
        }
        let series = df.column(&name)?.as_materialized_series();
        let values = numeric_values_as_f64(series);
        entries.push(CorrelationEntry {
            column: name,
            coefficient: pearson(&values, &quality_values),
        });
    }

    Ok(Some(CorrelationVector { entries }))
}

/// Pairwise correlations between all numeric columns. Diagonal cells are 1.0
/// unless the column itself is degenerate. `None` when the table is empty or
/// fewer than two numeric columns exist.
pub fn correlation_matrix(df: &DataFrame) -> Result<Option<CorrelationMatrix>> {
    if df.height() == 0 {
        return Ok(None);
    }

    let columns = numeric_columns(df);
    if columns.len() < 2 {
        return Ok(None);
    }

    let values: Vec<Vec<f64>> = columns
        .iter()
        .map(|name| {
            let series = df.column(name)?.as_materialized_series();
            Ok(numeric_values_as_f64(series))
        })
        .collect::<Result<_>>()?;

    let n = columns.len();
    let mut cells = vec![vec![Coefficient::Undefined; n]; n];
    for i in 0..n {
        for j in i..n {
            let coefficient = if i == j {
                match pearson(&values[i], &values[i]) {
                    Coefficient::Defined(_) => Coefficient::Defined(1.0),
                    Coefficient::Undefined => Coefficient::Undefined,
                }
            } else {
                pearson(&values[i], &values[j])
            };
            cells[i][j] = coefficient;
            cells[j][i] = coefficient;
        }
    }

    Ok(Some(CorrelationMatrix { columns, cells }))
}

/// Headline insights over the filtered view. `None` when the view is empty.
pub fn compute_insights(df: &DataFrame) -> Result<Option<Insights>> {
    let vector = match correlation_vector(df)? {
        Some(vector) => vector,
        None => return Ok(None),
    };

    let quality = df.column(QUALITY_COLUMN)?.as_materialized_series();
    let quality = quality.cast(&DataType::Float64)?;
    let mean_quality = match quality.mean() {
        Some(mean) => mean,
        None => return Ok(None),
    };

    let defined = vector.defined_sorted();
    let most_harmful = defined.first().cloned();
    let top_positive = defined.last().cloned();
    let low_impact_count = defined
        .iter()
        .filter(|(_, v)| v.abs() < LOW_IMPACT_THRESHOLD)
        .count();

    Ok(Some(Insights {
        row_count: df.height(),
        mean_quality,
        top_positive,
        most_harmful,
        low_impact_count,
    }))
}
