use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::sync::mpsc;
use vintui::filter::{CategoryChoice, Selection};
use vintui::{App, AppEvent};

fn sample_frame() -> DataFrame {
    df!(
        "wine_type" => &["red", "red", "red", "white", "white", "white"],
        "fixed_acidity" => &[7.4, 7.8, 7.6, 6.8, 6.9, 7.1],
        "alcohol" => &[9.4, 10.2, 11.0, 9.8, 10.5, 12.1],
        "quality" => &[5i64, 6, 7, 5, 6, 8],
    )
    .unwrap()
}

fn write_sample(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("wine.csv");
    let mut df = sample_frame();
    let mut file = File::create(&path).unwrap();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .unwrap();
    path
}

fn key(c: char) -> AppEvent {
    AppEvent::Key(KeyEvent {
        code: KeyCode::Char(c),
        modifiers: KeyModifiers::NONE,
        kind: KeyEventKind::Press,
        state: KeyEventState::NONE,
    })
}

#[test]
fn open_filter_and_inspect_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = write_sample(dir.path());

    let (tx, _rx) = mpsc::channel();
    let mut app = App::new(tx);
    assert!(app.event(&AppEvent::Open(csv_path)).is_none());

    let dash = app.dashboard.as_ref().unwrap();
    assert_eq!(dash.views.filtered.height(), 6);
    assert!(dash.views.insights.is_some());
    assert!(dash.views.histogram.is_some());
    assert!(dash.views.bars.is_some());
    assert!(dash.views.heatmap.is_some());
    assert!(dash.views.scatter.is_some());

    // Cycle to red wines only and narrow quality to [6, 8].
    app.event(&key('c'));
    app.event(&key(']'));
    app.event(&key(']'));
    let dash = app.dashboard.as_ref().unwrap();
    assert_eq!(dash.selection.category, CategoryChoice::One("red".to_string()));
    assert_eq!(dash.views.filtered.height(), 2);
    let insights = dash.views.insights.as_ref().unwrap();
    assert_eq!(insights.row_count, 2);
    assert!((insights.mean_quality - 6.5).abs() < 1e-9);
}

#[test]
fn filtered_export_reloads_identically() {
    let dir = tempfile::tempdir().unwrap();
    let df = sample_frame();

    let selection = Selection::new(CategoryChoice::One("white".to_string()), 5.0, 6.0);
    let filtered = vintui::filter::apply(&df, &selection).unwrap();
    assert_eq!(filtered.height(), 2);

    let export_path = dir.path().join("filtered.csv");
    vintui::export::write_filtered_csv(&filtered, &export_path).unwrap();

    // The exported file must pass schema validation and round-trip the rows.
    let reloaded = vintui::loader::load_table(&export_path).unwrap();
    assert_eq!(reloaded.height(), filtered.height());
    assert_eq!(reloaded.width(), filtered.width());
    assert_eq!(reloaded.get_column_names(), filtered.get_column_names());

    let alcohol = reloaded.column("alcohol").unwrap().f64().unwrap();
    let values: Vec<f64> = alcohol.iter().flatten().collect();
    assert_eq!(values, vec![9.8, 10.5]);
}

#[test]
fn reload_key_picks_up_file_changes() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = write_sample(dir.path());

    let (tx, _rx) = mpsc::channel();
    let mut app = App::new(tx);
    app.event(&AppEvent::Open(csv_path.clone()));
    assert_eq!(app.dashboard.as_ref().unwrap().views.filtered.height(), 6);

    std::thread::sleep(std::time::Duration::from_millis(20));
    let mut extended = df!(
        "wine_type" => &["red", "red", "red", "white", "white", "white", "red"],
        "fixed_acidity" => &[7.4, 7.8, 7.6, 6.8, 6.9, 7.1, 7.0],
        "alcohol" => &[9.4, 10.2, 11.0, 9.8, 10.5, 12.1, 10.0],
        "quality" => &[5i64, 6, 7, 5, 6, 8, 6],
    )
    .unwrap();
    let mut file = File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut extended)
        .unwrap();

    // 'r' invalidates the cache and re-emits an Open for the same path.
    let next = app.event(&key('r')).unwrap();
    assert!(matches!(next, AppEvent::Open(_)));
    app.event(&next);
    assert_eq!(app.dashboard.as_ref().unwrap().views.filtered.height(), 7);
}
