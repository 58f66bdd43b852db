//! Filter engine: derive the available filter domain from the base table and
//! apply a category + quality-range selection to produce a filtered view.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;
use std::collections::BTreeSet;

use crate::loader::{CATEGORY_COLUMN, QUALITY_COLUMN};

/// Step used by the quality range keys. The source data scores quality in
/// whole points, but half steps let a selection sit between two scores.
pub const QUALITY_STEP: f64 = 0.5;

/// Category part of a selection: a single wine type or the wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryChoice {
    All,
    One(String),
}

impl CategoryChoice {
    pub fn label(&self) -> &str {
        match self {
            CategoryChoice::All => "All",
            CategoryChoice::One(name) => name.as_str(),
        }
    }
}

/// The values a user can filter on, derived from the base table.
#[derive(Debug, Clone)]
pub struct FilterDomain {
    pub categories: Vec<String>,
    pub quality_min: f64,
    pub quality_max: f64,
}

impl FilterDomain {
    /// Reads distinct categories (sorted) and the observed quality range.
    pub fn from_table(df: &DataFrame) -> Result<FilterDomain> {
        let category = df.column(CATEGORY_COLUMN)?.as_materialized_series();
        let mut categories = BTreeSet::new();
        for value in category.str()?.iter().flatten() {
            categories.insert(value.to_string());
        }

        let quality = df.column(QUALITY_COLUMN)?.as_materialized_series();
        let quality = quality.cast(&DataType::Float64)?;
        let quality_min = quality
            .min::<f64>()?
            .ok_or_else(|| eyre!("column '{}' has no values", QUALITY_COLUMN))?;
        let quality_max = quality
            .max::<f64>()?
            .ok_or_else(|| eyre!("column '{}' has no values", QUALITY_COLUMN))?;

        Ok(FilterDomain {
            categories: categories.into_iter().collect(),
            quality_min,
            quality_max,
        })
    }

    /// Cycles to the next category choice after `current`, wrapping through
    /// the wildcard.
    pub fn next_category(&self, current: &CategoryChoice) -> CategoryChoice {
        match current {
            CategoryChoice::All => match self.categories.first() {
                Some(first) => CategoryChoice::One(first.clone()),
                None => CategoryChoice::All,
            },
            CategoryChoice::One(name) => {
                let idx = self.categories.iter().position(|c| c == name);
                match idx.and_then(|i| self.categories.get(i + 1)) {
                    Some(next) => CategoryChoice::One(next.clone()),
                    None => CategoryChoice::All,
                }
            }
        }
    }
}

/// A complete filter selection. `quality_min <= quality_max` always holds;
/// the constructor orders the bounds and clamps them to the domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub category: CategoryChoice,
    pub quality_min: f64,
    pub quality_max: f64,
}

impl Selection {
    pub fn new(category: CategoryChoice, quality_min: f64, quality_max: f64) -> Selection {
        let (lo, hi) = if quality_min <= quality_max {
            (quality_min, quality_max)
        } else {
            (quality_max, quality_min)
        };
        Selection {
            category,
            quality_min: lo,
            quality_max: hi,
        }
    }

    /// Full-range wildcard selection for the given domain.
    pub fn unfiltered(domain: &FilterDomain) -> Selection {
        Selection::new(CategoryChoice::All, domain.quality_min, domain.quality_max)
    }

    pub fn step_min(&mut self, delta: f64, domain: &FilterDomain) {
        let lo = (self.quality_min + delta).clamp(domain.quality_min, self.quality_max);
        self.quality_min = lo;
    }

    pub fn step_max(&mut self, delta: f64, domain: &FilterDomain) {
        let hi = (self.quality_max + delta).clamp(self.quality_min, domain.quality_max);
        self.quality_max = hi;
    }
}

/// Returns the rows of `df` matching `selection`. The input is never mutated
/// and an empty result is a valid outcome, not an error.
pub fn apply(df: &DataFrame, selection: &Selection) -> Result<DataFrame> {
    let mut lf = df.clone().lazy();

    if let CategoryChoice::One(name) = &selection.category {
        lf = lf.filter(col(CATEGORY_COLUMN).eq(lit(name.as_str())));
    }

    lf = lf.filter(
        col(QUALITY_COLUMN)
            .cast(DataType::Float64)
            .gt_eq(lit(selection.quality_min))
            .and(
                col(QUALITY_COLUMN)
                    .cast(DataType::Float64)
                    .lt_eq(lit(selection.quality_max)),
            ),
    );

    Ok(lf.collect()?)
}

/// Number of distinct categories present in a (possibly filtered) table.
pub fn categories_present(df: &DataFrame) -> Result<usize> {
    let category = df.column(CATEGORY_COLUMN)?.as_materialized_series();
    let mut seen = BTreeSet::new();
    for value in category.str()?.iter().flatten() {
        seen.insert(value.to_string());
    }
    Ok(seen.len())
}
