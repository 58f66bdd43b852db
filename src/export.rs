//! CSV export of the current filtered view.

use chrono::Local;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Writes `df` to `path` as CSV with a header row and no row index, matching
/// the input schema so the file can be reloaded by the loader.
pub fn write_filtered_csv(df: &DataFrame, path: &Path) -> Result<()> {
    if df.height() == 0 {
        return Err(eyre!("nothing to export: the filtered view is empty"));
    }
    let mut df = df.clone();
    let file = File::create(path)?;
    CsvWriter::new(file).include_header(true).finish(&mut df)?;
    Ok(())
}

/// Default export filename, timestamped so repeated exports don't clobber
/// each other: `filtered_wine_YYYYmmdd_HHMMSS.csv` in the working directory.
pub fn default_export_path() -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("filtered_wine_{}.csv", stamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_writes_header_and_rows() {
        let df = df!(
            "wine_type" => &["red", "white"],
            "alcohol" => &[9.4, 10.1],
            "quality" => &[5i64, 6],
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_filtered_csv(&df, &path).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let mut lines = body.lines();
        assert_eq!(lines.next().unwrap(), "wine_type,alcohol,quality");
        assert_eq!(body.lines().count(), 3);
    }

    #[test]
    fn export_empty_view_is_an_error() {
        let df = df!(
            "wine_type" => &["red"],
            "alcohol" => &[9.4],
            "quality" => &[5i64],
        )
        .unwrap()
        .head(Some(0));
        let dir = tempfile::tempdir().unwrap();
        assert!(write_filtered_csv(&df, &dir.path().join("out.csv")).is_err());
    }

    #[test]
    fn default_path_is_csv() {
        let path = default_export_path();
        assert_eq!(path.extension().unwrap(), "csv");
        assert!(path.to_string_lossy().starts_with("filtered_wine_"));
    }
}
