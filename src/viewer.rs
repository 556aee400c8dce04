use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::clipboard::{ClipboardError, ClipboardSink};
use crate::emphasis::EmphasisSet;
use crate::lines::split_lines;
use crate::markup::render_line_markup;
use crate::syntax_highlighter::{SyntaxHighlighter, tokenize};
use crate::theme::Base16Palette;
use crate::transient::TransientFlag;

/// How long the "copied" confirmation stays up after a copy.
pub const COPY_FEEDBACK: Duration = Duration::from_millis(1500);

const EMPHASIS_MARKER: &str = "▎";

/// Raw source text as supplied by the caller. Never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    text: Arc<str>,
}

impl SourceDocument {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    /// Lines as drawn into exported images: split on `\n`, without `\r`.
    pub fn raw_lines(&self) -> impl Iterator<Item = &str> {
        self.text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
    }
}

/// A rendered row: the markup for HTML consumers and the styled terminal line.
#[derive(Debug, Clone)]
pub struct ViewerRow {
    pub number: usize,
    pub markup: String,
    pub line: Line<'static>,
    pub emphasized: bool,
}

pub struct CodeViewer {
    document: SourceDocument,
    title: String,
    emphasis: EmphasisSet,
    highlighter: SyntaxHighlighter,
    rows: Vec<ViewerRow>,
    copied: TransientFlag,
    scroll_offset: usize,
}

impl CodeViewer {
    pub fn new(
        document: SourceDocument,
        title: impl Into<String>,
        emphasis: EmphasisSet,
        highlighter: SyntaxHighlighter,
    ) -> Self {
        let rows = build_rows(&document, &emphasis, &highlighter);
        debug!(
            "Viewer built {} rows, {} emphasized",
            rows.len(),
            rows.iter().filter(|row| row.emphasized).count()
        );
        Self {
            document,
            title: title.into(),
            emphasis,
            highlighter,
            rows,
            copied: TransientFlag::new(COPY_FEEDBACK),
            scroll_offset: 0,
        }
    }

    pub fn document(&self) -> &SourceDocument {
        &self.document
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn emphasis(&self) -> &EmphasisSet {
        &self.emphasis
    }

    pub fn rows(&self) -> &[ViewerRow] {
        &self.rows
    }

    pub fn is_emphasized(&self, line_number: usize) -> bool {
        self.rows
            .get(line_number.wrapping_sub(1))
            .is_some_and(|row| row.emphasized)
    }

    /// Copy the raw source, never the markup, and raise the "copied" flag.
    ///
    /// On failure the flag is left untouched so the confirmation is never
    /// shown for a copy that did not happen.
    pub fn copy_to_clipboard(
        &mut self,
        clipboard: &mut dyn ClipboardSink,
        now: Instant,
    ) -> Result<(), ClipboardError> {
        clipboard.set_text(self.document.as_str())?;
        self.copied.trigger(now);
        Ok(())
    }

    pub fn copied_deadline(&self) -> Option<Instant> {
        self.copied.expires_at()
    }

    pub fn palette(&self) -> &'static Base16Palette {
        self.highlighter.palette()
    }

    pub fn is_copied(&self, now: Instant) -> bool {
        self.copied.is_active(now)
    }

    /// Returns true when the "copied" confirmation just expired.
    pub fn update(&mut self, now: Instant) -> bool {
        self.copied.update(now)
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let max = self.rows.len().saturating_sub(1);
        self.scroll_offset = self.scroll_offset.saturating_add(lines).min(max);
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.rows.len().saturating_sub(1);
    }

    pub fn gutter_width(&self) -> u16 {
        let digits = self.rows.len().to_string().len().max(2);
        (digits + 3) as u16
    }

    pub fn draw(&self, f: &mut Frame, area: Rect, now: Instant, exporting: bool) {
        let palette = self.highlighter.palette();

        let copy_label = if self.is_copied(now) {
            Span::styled(
                " ✓ Copied! ",
                Style::default()
                    .fg(palette.base_0b.color())
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(" [c] Copy ", Style::default().fg(palette.base_04.color()))
        };
        let export_label = if exporting {
            Span::styled(
                " ⟳ Generating... ",
                Style::default()
                    .fg(palette.base_0d.color())
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(" [s] Save PNG ", Style::default().fg(palette.base_04.color()))
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border_color(exporting)))
            .style(Style::default().bg(palette.base_00.color()))
            .title(Line::from(Span::styled(
                format!(" ☕ {} ", self.title),
                Style::default()
                    .fg(palette.base_0d.color())
                    .add_modifier(Modifier::BOLD),
            )))
            .title(Line::from(vec![copy_label, export_label]).right_aligned());

        let inner = block.inner(area);
        f.render_widget(block, area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(self.gutter_width()), Constraint::Min(0)])
            .split(inner);
        let (gutter_area, body_area) = (columns[0], columns[1]);

        let visible = self
            .rows
            .iter()
            .skip(self.scroll_offset)
            .take(inner.height as usize);

        let mut gutter_lines = Vec::new();
        let mut body_lines = Vec::new();
        for row in visible {
            gutter_lines.push(self.gutter_line(row));
            body_lines.push(self.body_line(row, body_area.width));
        }

        f.render_widget(Paragraph::new(gutter_lines), gutter_area);
        f.render_widget(Paragraph::new(body_lines), body_area);
    }

    fn gutter_line(&self, row: &ViewerRow) -> Line<'static> {
        let palette = self.highlighter.palette();
        let digits = self.gutter_width() as usize - 3;
        let style = if row.emphasized {
            Style::default()
                .fg(palette.emphasis_marker())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.base_03.color())
        };
        Line::from(vec![
            Span::styled(format!(" {:>digits$} ", row.number), style),
            Span::styled("│", Style::default().fg(palette.base_02.color())),
        ])
    }

    fn body_line(&self, row: &ViewerRow, width: u16) -> Line<'static> {
        let palette = self.highlighter.palette();
        if !row.emphasized {
            let mut spans = vec![Span::raw(" ")];
            spans.extend(row.line.spans.iter().cloned());
            return Line::from(spans);
        }

        let background = Style::default().bg(palette.emphasis_background());
        let mut spans = vec![Span::styled(
            EMPHASIS_MARKER,
            background.fg(palette.emphasis_marker()),
        )];
        spans.extend(
            row.line
                .spans
                .iter()
                .map(|span| span.clone().patch_style(background)),
        );
        let used = 1 + row.line.width();
        let padding = (width as usize).saturating_sub(used);
        if padding > 0 {
            spans.push(Span::styled(" ".repeat(padding), background));
        }
        Line::from(spans)
    }
}

fn build_rows(
    document: &SourceDocument,
    emphasis: &EmphasisSet,
    highlighter: &SyntaxHighlighter,
) -> Vec<ViewerRow> {
    let source = document.as_str();
    let tokens = tokenize(source);
    split_lines(source, &tokens)
        .iter()
        .enumerate()
        .map(|(index, line_tokens)| {
            let number = index + 1;
            ViewerRow {
                number,
                markup: render_line_markup(source, line_tokens),
                line: highlighter.highlight_line(source, line_tokens),
                emphasized: emphasis.contains(number),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::{MemoryClipboard, create_test_terminal};

    const FIVE_LINES: &str = "class A {\n  int x = 1;\n  int y = 2;\n  // z\n}";

    fn viewer_with(emphasis: &[usize]) -> CodeViewer {
        CodeViewer::new(
            SourceDocument::new(FIVE_LINES),
            "Demo",
            emphasis.iter().copied().collect(),
            SyntaxHighlighter::default(),
        )
    }

    #[test]
    fn marks_exactly_the_requested_rows() {
        let viewer = viewer_with(&[2, 4]);
        let marked: Vec<usize> = viewer
            .rows()
            .iter()
            .filter(|row| row.emphasized)
            .map(|row| row.number)
            .collect();
        assert_eq!(marked, vec![2, 4]);
        assert!(!viewer.is_emphasized(0));
        assert!(viewer.is_emphasized(2));
        assert!(!viewer.is_emphasized(3));
        assert!(!viewer.is_emphasized(99));
    }

    #[test]
    fn rows_carry_markup_and_numbers() {
        let viewer = viewer_with(&[]);
        assert_eq!(viewer.rows().len(), 5);
        assert_eq!(viewer.rows()[0].number, 1);
        assert_eq!(
            viewer.rows()[0].markup,
            r#"<span class="hl-keyword">class</span> A {"#
        );
        assert_eq!(viewer.rows()[3].markup, r#"  <span class="hl-comment">// z</span>"#);
    }

    #[test]
    fn copy_writes_raw_source_and_raises_flag() {
        let source = "List<String> xs = new ArrayList<>(); // \"quoted\"\n";
        let mut viewer = CodeViewer::new(
            SourceDocument::new(source),
            "Copy",
            EmphasisSet::new(),
            SyntaxHighlighter::default(),
        );
        let mut clipboard = MemoryClipboard::new();
        let t0 = Instant::now();

        viewer.copy_to_clipboard(&mut clipboard, t0).unwrap();

        assert_eq!(clipboard.writes(), vec![source.to_string()]);
        assert!(viewer.is_copied(t0));
        assert!(!viewer.is_copied(t0 + COPY_FEEDBACK));
    }

    #[test]
    fn repeated_copy_extends_from_the_last_request() {
        let mut viewer = viewer_with(&[]);
        let mut clipboard = MemoryClipboard::new();
        let t0 = Instant::now();
        let later = t0 + Duration::from_millis(900);

        viewer.copy_to_clipboard(&mut clipboard, t0).unwrap();
        viewer.copy_to_clipboard(&mut clipboard, later).unwrap();

        assert!(!viewer.update(t0 + COPY_FEEDBACK));
        assert!(viewer.is_copied(t0 + COPY_FEEDBACK));
        assert!(viewer.update(later + COPY_FEEDBACK));
        assert!(!viewer.is_copied(later + COPY_FEEDBACK));
        assert_eq!(clipboard.writes().len(), 2);
    }

    #[test]
    fn failed_copy_does_not_confirm() {
        let mut viewer = viewer_with(&[]);
        let mut clipboard = MemoryClipboard::failing();
        let t0 = Instant::now();

        let result = viewer.copy_to_clipboard(&mut clipboard, t0);

        assert!(matches!(result, Err(ClipboardError::Unavailable(_))));
        assert!(!viewer.is_copied(t0));
    }

    #[test]
    fn scrolling_is_clamped() {
        let mut viewer = viewer_with(&[]);
        viewer.scroll_up(3);
        assert_eq!(viewer.scroll_offset(), 0);
        viewer.scroll_down(100);
        assert_eq!(viewer.scroll_offset(), 4);
        viewer.scroll_to_top();
        assert_eq!(viewer.scroll_offset(), 0);
        viewer.scroll_to_bottom();
        assert_eq!(viewer.scroll_offset(), 4);
        viewer.scroll_down(usize::MAX);
        assert_eq!(viewer.scroll_offset(), 4);
    }

    #[test]
    fn draw_renders_gutter_and_emphasis_marker() {
        let viewer = viewer_with(&[2, 4]);
        let mut terminal = create_test_terminal(60, 10);
        let now = Instant::now();
        terminal
            .draw(|f| viewer.draw(f, f.area(), now, false))
            .unwrap();

        let buffer = terminal.backend().buffer();
        // Border at x=0, gutter " NN │" occupies x=1..=5, body starts at x=6
        let marker_x = 1 + viewer.gutter_width();
        for number in 1..=5u16 {
            let y = number; // first row sits right below the top border
            let expected = if number == 2 || number == 4 { "▎" } else { " " };
            assert_eq!(buffer[(marker_x, y)].symbol(), expected, "row {number}");
        }
        assert_eq!(buffer[(3, 1)].symbol(), "1");
        assert_eq!(buffer[(3, 5)].symbol(), "5");
    }
}
