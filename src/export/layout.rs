use serde::{Deserialize, Serialize};

/// Geometry of an exported snippet image, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportLayout {
    pub width: u32,
    pub padding: u32,
    pub line_height: u32,
    pub footer_margin: u32,
    pub header_height: u32,
    pub title_x: u32,
    pub title_baseline: u32,
    /// Distance from the top padding to the first code baseline
    pub code_top_offset: u32,
    pub footer_x: u32,
    /// Distance from the bottom edge to the footer baseline
    pub footer_offset: u32,
    pub title_size: f32,
    pub code_size: f32,
    pub footer_size: f32,
}

impl Default for ExportLayout {
    fn default() -> Self {
        Self {
            width: 800,
            padding: 40,
            line_height: 24,
            footer_margin: 100,
            header_height: 50,
            title_x: 20,
            title_baseline: 30,
            code_top_offset: 70,
            footer_x: 20,
            footer_offset: 20,
            title_size: 16.0,
            code_size: 14.0,
            footer_size: 12.0,
        }
    }
}

impl ExportLayout {
    /// Canvas size for `line_count` lines: fixed width, height grows per line.
    pub fn canvas_size(&self, line_count: usize) -> (u32, u32) {
        let lines = u32::try_from(line_count).unwrap_or(u32::MAX);
        let height = self
            .padding
            .saturating_mul(2)
            .saturating_add(lines.saturating_mul(self.line_height))
            .saturating_add(self.footer_margin);
        (self.width, height)
    }

    /// Baseline of the 0-based code line `index`.
    pub fn line_baseline(&self, index: usize) -> u32 {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        self.padding
            .saturating_add(self.code_top_offset)
            .saturating_add(index.saturating_mul(self.line_height))
    }

    pub fn footer_baseline(&self, canvas_height: u32) -> u32 {
        canvas_height.saturating_sub(self.footer_offset)
    }
}
