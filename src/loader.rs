//! CSV loading with schema validation, and an explicit table cache keyed by
//! path + modification time.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::insights::is_numeric_type;

/// Column holding the wine type label.
pub const CATEGORY_COLUMN: &str = "wine_type";
/// Column holding the quality score.
pub const QUALITY_COLUMN: &str = "quality";

/// Reads a CSV file into a DataFrame and validates the expected schema:
/// a string category column, a numeric quality column, and at least one
/// other numeric physiochemical column.
pub fn load_table(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(eyre!("input file not found: {}", path.display()));
    }

    let pl_path = PlPath::Local(Arc::from(path));
    let lf = LazyCsvReader::new(pl_path)
        .with_has_header(true)
        .finish()?;
    let df = lf.collect()?;

    validate_schema(&df)?;
    Ok(df)
}

fn validate_schema(df: &DataFrame) -> Result<()> {
    let schema = df.schema();

    match schema.get(CATEGORY_COLUMN) {
        Some(DataType::String) => {}
        Some(other) => {
            return Err(eyre!(
                "column '{}' must be a string category, got {}",
                CATEGORY_COLUMN,
                other
            ))
        }
        None => return Err(eyre!("missing required column '{}'", CATEGORY_COLUMN)),
    }

    match schema.get(QUALITY_COLUMN) {
        Some(dtype) if is_numeric_type(dtype) => {}
        Some(other) => {
            return Err(eyre!(
                "column '{}' must be numeric, got {}",
                QUALITY_COLUMN,
                other
            ))
        }
        None => return Err(eyre!("missing required column '{}'", QUALITY_COLUMN)),
    }

    let has_attribute = schema
        .iter()
        .any(|(name, dtype)| name.as_str() != QUALITY_COLUMN && is_numeric_type(dtype));
    if !has_attribute {
        return Err(eyre!(
            "no numeric attribute columns found besides '{}'",
            QUALITY_COLUMN
        ));
    }

    Ok(())
}

struct CachedTable {
    modified: SystemTime,
    table: DataFrame,
}

/// Cache of loaded tables keyed by canonical path. An entry is reused only
/// while the file's modification time is unchanged; `invalidate` drops an
/// entry manually.
#[derive(Default)]
pub struct TableCache {
    entries: HashMap<PathBuf, CachedTable>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn cache_key(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
    }

    fn modified_time(path: &Path) -> Result<SystemTime> {
        Ok(std::fs::metadata(path)?.modified()?)
    }

    /// Returns the table for `path`, loading it on a miss or when the file
    /// has been modified since it was cached.
    pub fn load(&mut self, path: &Path) -> Result<DataFrame> {
        let key = Self::cache_key(path);
        let modified = Self::modified_time(path).ok();

        if let (Some(modified), Some(entry)) = (modified, self.entries.get(&key)) {
            if entry.modified == modified {
                return Ok(entry.table.clone());
            }
        }

        let table = load_table(path)?;
        if let Some(modified) = modified.or_else(|| Self::modified_time(path).ok()) {
            self.entries.insert(
                key,
                CachedTable {
                    modified,
                    table: table.clone(),
                },
            );
        }
        Ok(table)
    }

    /// Drops the cached entry for `path`, if any.
    pub fn invalidate(&mut self, path: &Path) {
        self.entries.remove(&Self::cache_key(path));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    const VALID: &str = "wine_type,alcohol,quality\nred,9.4,5\nwhite,10.1,6\n";

    #[test]
    fn load_valid_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "wine.csv", VALID);
        let df = load_table(&path).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn missing_file_is_fatal() {
        assert!(load_table(Path::new("/nonexistent/wine.csv")).is_err());
    }

    #[test]
    fn missing_category_column_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "bad.csv", "alcohol,quality\n9.4,5\n");
        assert!(load_table(&path).is_err());
    }

    #[test]
    fn missing_quality_column_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "bad.csv", "wine_type,alcohol\nred,9.4\n");
        assert!(load_table(&path).is_err());
    }

    #[test]
    fn table_without_attributes_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "bad.csv", "wine_type,quality\nred,5\n");
        assert!(load_table(&path).is_err());
    }

    #[test]
    fn cache_reuses_unmodified_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "wine.csv", VALID);
        let mut cache = TableCache::new();
        let first = cache.load(&path).unwrap();
        let second = cache.load(&path).unwrap();
        assert!(first.equals(&second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_drops_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "wine.csv", VALID);
        let mut cache = TableCache::new();
        cache.load(&path).unwrap();
        assert!(!cache.is_empty());
        cache.invalidate(&path);
        assert!(cache.is_empty());
    }

    #[test]
    fn modified_file_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "wine.csv", VALID);
        let mut cache = TableCache::new();
        let first = cache.load(&path).unwrap();
        assert_eq!(first.height(), 2);

        // Rewrite with one more row; the changed mtime must miss the cache.
        std::thread::sleep(std::time::Duration::from_millis(20));
        write_csv(
            dir.path(),
            "wine.csv",
            "wine_type,alcohol,quality\nred,9.4,5\nwhite,10.1,6\nred,11.0,7\n",
        );
        let second = cache.load(&path).unwrap();
        assert_eq!(second.height(), 3);
    }
}
