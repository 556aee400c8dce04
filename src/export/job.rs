use std::mem;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::download::DownloadSink;
use super::error::{ExportError, ExportRejected};
use super::filename::DEFAULT_EXPORT_FILENAME;
use super::layout::ExportLayout;
use super::render::render_snippet;
use super::surface::SurfaceFactory;
use crate::theme::ThemeId;
use crate::viewer::SourceDocument;

/// Minimum time the "generating" indicator is shown before work starts.
pub const EXPORT_PRE_DELAY: Duration = Duration::from_millis(300);
/// How long the indicator stays up after the image was produced.
pub const EXPORT_RESET_DELAY: Duration = Duration::from_millis(2000);

pub const DEFAULT_FOOTER: &str = "Generated with snipview";

pub type ExportOutcome = Result<PathBuf, ExportError>;

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub layout: ExportLayout,
    pub theme: ThemeId,
    pub footer: String,
    pub filename: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            layout: ExportLayout::default(),
            theme: ThemeId::default(),
            footer: DEFAULT_FOOTER.to_string(),
            filename: DEFAULT_EXPORT_FILENAME.to_string(),
        }
    }
}

/// What to export: the raw source and the caption for the header bar.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub document: SourceDocument,
    pub title: String,
}

#[derive(Debug, Default)]
pub enum ExportState {
    #[default]
    Idle,
    Generating {
        requested_at: Instant,
        request: ExportRequest,
    },
    Resetting {
        until: Instant,
        succeeded: bool,
    },
}

/// Single-slot export pipeline driven by `poll`.
#[derive(Debug)]
pub struct ExportJob {
    options: ExportOptions,
    state: ExportState,
}

impl ExportJob {
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            state: ExportState::Idle,
        }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn state(&self) -> &ExportState {
        &self.state
    }

    /// True from the moment a request is accepted until the reset window ends.
    pub fn is_generating(&self) -> bool {
        !matches!(self.state, ExportState::Idle)
    }

    pub fn request(&mut self, now: Instant, request: ExportRequest) -> Result<(), ExportRejected> {
        if self.is_generating() {
            debug!("Export already in flight, ignoring request");
            return Err(ExportRejected::InFlight);
        }
        debug!(
            "Export requested for {:?} ({} lines)",
            request.title,
            request.document.line_count()
        );
        self.state = ExportState::Generating {
            requested_at: now,
            request,
        };
        Ok(())
    }

    /// When the next state change is due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.state {
            ExportState::Idle => None,
            ExportState::Generating { requested_at, .. } => Some(*requested_at + EXPORT_PRE_DELAY),
            ExportState::Resetting { until, .. } => Some(*until),
        }
    }

    /// Advance the job. Returns the outcome exactly once, when the image
    /// has been produced or has failed.
    pub fn poll(
        &mut self,
        now: Instant,
        surfaces: &mut dyn SurfaceFactory,
        sink: &mut dyn DownloadSink,
    ) -> Option<ExportOutcome> {
        match &self.state {
            ExportState::Idle => None,
            ExportState::Resetting { until, .. } => {
                if now >= *until {
                    self.state = ExportState::Idle;
                }
                None
            }
            ExportState::Generating { requested_at, .. } => {
                if now < *requested_at + EXPORT_PRE_DELAY {
                    return None;
                }
                let ExportState::Generating { request, .. } = mem::take(&mut self.state) else {
                    return None;
                };
                let outcome = run_export(&self.options, &request, surfaces, sink);
                match &outcome {
                    Ok(path) => info!("Export finished: {}", path.display()),
                    Err(e) => warn!("Export failed: {e}"),
                }
                self.state = ExportState::Resetting {
                    until: now + EXPORT_RESET_DELAY,
                    succeeded: outcome.is_ok(),
                };
                Some(outcome)
            }
        }
    }
}

/// Run the whole pipeline immediately, without the indicator delays.
pub fn run_export(
    options: &ExportOptions,
    request: &ExportRequest,
    surfaces: &mut dyn SurfaceFactory,
    sink: &mut dyn DownloadSink,
) -> ExportOutcome {
    let (width, height) = options.layout.canvas_size(request.document.line_count());
    let mut surface = surfaces.create(width, height)?;
    let href = render_snippet(surface.as_mut(), options, &request.title, &request.document)?;
    sink.deliver(&options.filename, &href)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::{MemorySink, RecordingSurfaceFactory};

    fn request(lines: usize) -> ExportRequest {
        let text = (1..=lines)
            .map(|i| format!("int x{i} = {i};"))
            .collect::<Vec<_>>()
            .join("\n");
        ExportRequest {
            document: SourceDocument::new(text),
            title: "Snippet".to_string(),
        }
    }

    #[test]
    fn canvas_height_follows_line_count() {
        let mut job = ExportJob::new(ExportOptions::default());
        let mut surfaces = RecordingSurfaceFactory::new();
        let mut sink = MemorySink::new();
        let t0 = Instant::now();

        job.request(t0, request(10)).unwrap();
        let outcome = job.poll(t0 + EXPORT_PRE_DELAY, &mut surfaces, &mut sink);

        assert!(matches!(outcome, Some(Ok(_))));
        assert_eq!(surfaces.sizes(), vec![(800, 2 * 40 + 10 * 24 + 100)]);
    }

    #[test]
    fn indicator_spans_delay_and_reset_window() {
        let mut job = ExportJob::new(ExportOptions::default());
        let mut surfaces = RecordingSurfaceFactory::new();
        let mut sink = MemorySink::new();
        let t0 = Instant::now();

        job.request(t0, request(3)).unwrap();
        assert!(job.is_generating());

        assert!(job.poll(t0 + Duration::from_millis(299), &mut surfaces, &mut sink).is_none());
        assert!(surfaces.sizes().is_empty());

        let produced_at = t0 + EXPORT_PRE_DELAY;
        assert!(job.poll(produced_at, &mut surfaces, &mut sink).is_some());
        assert!(job.is_generating());
        assert_eq!(sink.deliveries().len(), 1);
        assert_eq!(sink.deliveries()[0].0, DEFAULT_EXPORT_FILENAME);

        let almost = produced_at + EXPORT_RESET_DELAY - Duration::from_millis(1);
        assert!(job.poll(almost, &mut surfaces, &mut sink).is_none());
        assert!(job.is_generating());

        job.poll(t0 + Duration::from_millis(2300), &mut surfaces, &mut sink);
        assert!(!job.is_generating());
        assert_eq!(job.next_deadline(), None);
    }

    #[test]
    fn second_request_while_in_flight_is_rejected() {
        let mut job = ExportJob::new(ExportOptions::default());
        let mut surfaces = RecordingSurfaceFactory::new();
        let mut sink = MemorySink::new();
        let t0 = Instant::now();

        job.request(t0, request(1)).unwrap();
        assert_eq!(
            job.request(t0 + Duration::from_millis(100), request(2)),
            Err(ExportRejected::InFlight)
        );

        job.poll(t0 + EXPORT_PRE_DELAY, &mut surfaces, &mut sink);
        assert_eq!(
            job.request(t0 + Duration::from_millis(500), request(2)),
            Err(ExportRejected::InFlight)
        );
        assert!(job.poll(t0 + Duration::from_millis(1000), &mut surfaces, &mut sink).is_none());
        assert_eq!(sink.deliveries().len(), 1);
        assert_eq!(surfaces.sizes().len(), 1);
    }

    #[test]
    fn failures_still_reset() {
        let mut job = ExportJob::new(ExportOptions::default());
        let mut surfaces = RecordingSurfaceFactory::failing();
        let mut sink = MemorySink::new();
        let t0 = Instant::now();

        job.request(t0, request(2)).unwrap();
        let outcome = job.poll(t0 + EXPORT_PRE_DELAY, &mut surfaces, &mut sink);

        assert!(matches!(outcome, Some(Err(ExportError::FontUnavailable(_)))));
        assert!(matches!(
            job.state(),
            ExportState::Resetting { succeeded: false, .. }
        ));
        assert!(sink.deliveries().is_empty());

        let done = t0 + EXPORT_PRE_DELAY + EXPORT_RESET_DELAY;
        job.poll(done, &mut surfaces, &mut sink);
        assert!(!job.is_generating());
        assert!(job.request(done, request(2)).is_ok());
    }

    #[test]
    fn run_export_delivers_configured_filename() {
        let options = ExportOptions {
            filename: "generics.png".to_string(),
            ..ExportOptions::default()
        };
        let mut surfaces = RecordingSurfaceFactory::new();
        let mut sink = MemorySink::new();

        run_export(&options, &request(4), &mut surfaces, &mut sink).unwrap();

        let deliveries = sink.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].0, "generics.png");
        assert!(deliveries[0].1.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}
