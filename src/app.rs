use std::time::{Duration, Instant};

use anyhow::Result;
use log::{debug, info};
use ratatui::{
    Frame, Terminal,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::clipboard::ClipboardSink;
use crate::event_source::{Event, EventSource, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crate::export::{DownloadSink, ExportJob, ExportOptions, ExportRequest, SurfaceFactory};
use crate::notification::{NotificationLevel, NotificationManager};
use crate::viewer::CodeViewer;

const TICK_RATE: Duration = Duration::from_millis(50);
const HELP_TEXT: &str = " c copy · s save PNG · j/k scroll · g/G top/bottom · q quit ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

pub struct App {
    viewer: CodeViewer,
    export_job: ExportJob,
    pub notifications: NotificationManager,
    clipboard: Box<dyn ClipboardSink>,
    surfaces: Box<dyn SurfaceFactory>,
    sink: Box<dyn DownloadSink>,
}

impl App {
    pub fn new(
        viewer: CodeViewer,
        options: ExportOptions,
        clipboard: Box<dyn ClipboardSink>,
        surfaces: Box<dyn SurfaceFactory>,
        sink: Box<dyn DownloadSink>,
    ) -> Self {
        Self {
            viewer,
            export_job: ExportJob::new(options),
            notifications: NotificationManager::new(),
            clipboard,
            surfaces,
            sink,
        }
    }

    pub fn viewer(&self) -> &CodeViewer {
        &self.viewer
    }

    pub fn export_job(&self) -> &ExportJob {
        &self.export_job
    }

    pub fn is_generating(&self) -> bool {
        self.export_job.is_generating()
    }

    pub fn handle_key_event(
        &mut self,
        key: KeyEvent,
        now: Instant,
        visible_height: usize,
    ) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        let half_page = (visible_height / 2).max(1);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(AppAction::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Some(AppAction::Quit);
            }
            KeyCode::Char('c') => self.copy_code(now),
            KeyCode::Char('s') => self.save_image(now),
            KeyCode::Char('j') | KeyCode::Down => self.viewer.scroll_down(1),
            KeyCode::Char('k') | KeyCode::Up => self.viewer.scroll_up(1),
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.viewer.scroll_down(half_page)
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.viewer.scroll_up(half_page)
            }
            KeyCode::PageDown => self.viewer.scroll_down(visible_height.max(1)),
            KeyCode::PageUp => self.viewer.scroll_up(visible_height.max(1)),
            KeyCode::Char('g') | KeyCode::Home => self.viewer.scroll_to_top(),
            KeyCode::Char('G') | KeyCode::End => self.viewer.scroll_to_bottom(),
            _ => {}
        }
        None
    }

    pub fn copy_code(&mut self, now: Instant) {
        match self
            .viewer
            .copy_to_clipboard(self.clipboard.as_mut(), now)
        {
            Ok(()) => info!("Copied {} lines", self.viewer.document().line_count()),
            Err(e) => self.notifications.error(e.to_string(), now),
        }
    }

    pub fn save_image(&mut self, now: Instant) {
        let request = ExportRequest {
            document: self.viewer.document().clone(),
            title: self.viewer.title().to_string(),
        };
        if let Err(e) = self.export_job.request(now, request) {
            self.notifications.warn(e.to_string(), now);
        }
    }

    /// Advance every timer. Returns true when something visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let copied_expired = self.viewer.update(now);
        let notification_expired = self.notifications.update(now);

        let was_generating = self.export_job.is_generating();
        if let Some(outcome) =
            self.export_job
                .poll(now, self.surfaces.as_mut(), self.sink.as_mut())
        {
            match outcome {
                Ok(path) => self
                    .notifications
                    .info(format!("Saved {}", path.display()), now),
                Err(e) => self
                    .notifications
                    .error(format!("Export failed: {e}"), now),
            }
            return true;
        }
        let export_changed = was_generating != self.export_job.is_generating();

        copied_expired || notification_expired || export_changed
    }

    /// Earliest pending deadline, used to bound the event poll timeout.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.export_job.next_deadline(),
            self.viewer.copied_deadline(),
            self.notifications.current().map(|n| n.expires_at),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    pub fn draw(&self, f: &mut Frame, now: Instant) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(f.area());

        let generating = self.export_job.is_generating();
        self.viewer.draw(f, chunks[0], now, generating);
        self.draw_status_line(f, chunks[1], now);

        if generating {
            self.draw_generating_overlay(f, chunks[0]);
        }
    }

    fn draw_status_line(&self, f: &mut Frame, area: Rect, now: Instant) {
        let palette = self.viewer.palette();
        let line = match self
            .notifications
            .current()
            .filter(|n| !n.is_expired(now))
        {
            Some(notification) => {
                let color = match notification.level {
                    NotificationLevel::Info => palette.base_0b.color(),
                    NotificationLevel::Warning => palette.base_0a.color(),
                    NotificationLevel::Error => palette.base_08.color(),
                };
                Line::from(Span::styled(
                    format!(" {} ", notification.message),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ))
            }
            None => Line::from(Span::styled(
                HELP_TEXT,
                Style::default().fg(palette.base_03.color()),
            )),
        };
        f.render_widget(
            Paragraph::new(line).style(Style::default().bg(palette.base_01.color())),
            area,
        );
    }

    fn draw_generating_overlay(&self, f: &mut Frame, area: Rect) {
        let palette = self.viewer.palette();
        let popup = centered_rect(40, 5, area);
        f.render_widget(Clear, popup);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.base_0d.color()))
            .style(Style::default().bg(palette.base_01.color()));
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "⟳ Generating image...",
                Style::default()
                    .fg(palette.base_05.color())
                    .add_modifier(Modifier::BOLD),
            )))
            .alignment(Alignment::Center)
            .block(block),
            popup,
        );
    }
}

/// A `width` x `height` cell rectangle centered in `r`, clamped to fit.
fn centered_rect(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(r.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(r.width.saturating_sub(width) / 2),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1])[1]
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let mut needs_redraw = true;
    loop {
        if needs_redraw {
            let now = Instant::now();
            terminal.draw(|f| app.draw(f, now))?;
            needs_redraw = false;
        }

        let timeout = app
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .map_or(TICK_RATE, |until| until.min(TICK_RATE));

        let mut should_quit = false;
        let mut events_processed = 0;
        let mut wait = timeout;
        while events_processed < 50 && event_source.poll(wait)? {
            wait = Duration::ZERO;
            let event = event_source.read()?;
            events_processed += 1;
            match event {
                Event::Key(key) => {
                    let visible_height = terminal.size()?.height.saturating_sub(3) as usize;
                    if app.handle_key_event(key, Instant::now(), visible_height)
                        == Some(AppAction::Quit)
                    {
                        should_quit = true;
                        break;
                    }
                }
                Event::Resize(cols, rows) => debug!("Terminal resized to {cols}x{rows}"),
                _ => {}
            }
        }

        if should_quit {
            break;
        }

        if app.tick(Instant::now()) || events_processed > 0 {
            needs_redraw = true;
        }
    }
    Ok(())
}
