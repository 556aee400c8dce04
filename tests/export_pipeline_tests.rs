use std::fs;
use std::time::{Duration, Instant};

use snipview::export::{
    DirectorySink, EXPORT_PRE_DELAY, EXPORT_RESET_DELAY, ExportJob, ExportLayout, ExportOptions,
    ExportRequest, run_export,
};
use snipview::test_utils::test_helpers::{MemorySink, RecordingSurfaceFactory};
use snipview::viewer::SourceDocument;
use tempfile::TempDir;

fn ten_lines() -> ExportRequest {
    let text = (0..10).map(|i| format!("x{i}++;")).collect::<Vec<_>>().join("\n");
    ExportRequest {
        document: SourceDocument::new(text),
        title: "Ten".to_string(),
    }
}

#[test]
fn ten_line_canvas_height() {
    let layout = ExportLayout::default();
    let mut job = ExportJob::new(ExportOptions::default());
    let mut surfaces = RecordingSurfaceFactory::new();
    let mut sink = MemorySink::new();
    let t0 = Instant::now();

    job.request(t0, ten_lines()).unwrap();
    job.poll(t0 + EXPORT_PRE_DELAY, &mut surfaces, &mut sink);

    let expected = 2 * layout.padding + 10 * layout.line_height + layout.footer_margin;
    assert_eq!(surfaces.sizes(), vec![(layout.width, expected)]);
}

#[test]
fn generating_flag_lasts_at_least_the_full_window() {
    let mut job = ExportJob::new(ExportOptions::default());
    let mut surfaces = RecordingSurfaceFactory::new();
    let mut sink = MemorySink::new();
    let t0 = Instant::now();

    job.request(t0, ten_lines()).unwrap();
    assert!(job.is_generating());

    // Poll often, like the event loop does
    let mut step = t0;
    let mut cleared_at = None;
    while step < t0 + Duration::from_secs(3) {
        step += Duration::from_millis(50);
        job.poll(step, &mut surfaces, &mut sink);
        if !job.is_generating() {
            cleared_at = Some(step);
            break;
        }
    }

    let cleared_at = cleared_at.unwrap();
    assert!(cleared_at - t0 >= EXPORT_PRE_DELAY + EXPORT_RESET_DELAY);
    assert_eq!(sink.deliveries().len(), 1);
}

#[test]
fn export_lands_in_directory() {
    let dir = TempDir::new().unwrap();
    let mut sink = DirectorySink::new(dir.path());
    let mut surfaces = RecordingSurfaceFactory::new();
    let options = ExportOptions::default();

    let path = run_export(&options, &ten_lines(), &mut surfaces, &mut sink).unwrap();

    assert_eq!(path, dir.path().join("code-snippet.png"));
    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
}

#[test]
fn export_to_missing_directory_fails_and_resets() {
    let dir = TempDir::new().unwrap();
    let mut sink = DirectorySink::new(dir.path().join("gone"));
    let mut surfaces = RecordingSurfaceFactory::new();
    let mut job = ExportJob::new(ExportOptions::default());
    let t0 = Instant::now();

    job.request(t0, ten_lines()).unwrap();
    let outcome = job.poll(t0 + EXPORT_PRE_DELAY, &mut surfaces, &mut sink);
    assert!(matches!(outcome, Some(Err(_))));

    job.poll(t0 + EXPORT_PRE_DELAY + EXPORT_RESET_DELAY, &mut surfaces, &mut sink);
    assert!(!job.is_generating());
}
