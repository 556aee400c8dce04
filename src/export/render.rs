use log::debug;

use super::data_url::ImageDataUrl;
use super::error::ExportError;
use super::job::ExportOptions;
use super::surface::{FontRole, Surface, TextStyle};
use crate::syntax_highlighter::TAB_WIDTH;
use crate::viewer::SourceDocument;

/// Draw `document` onto `surface` and return the encoded image.
///
/// The surface is expected to be sized by `ExportLayout::canvas_size`.
/// Lines are drawn unhighlighted, exactly as stored.
pub fn render_snippet(
    surface: &mut dyn Surface,
    options: &ExportOptions,
    title: &str,
    document: &SourceDocument,
) -> Result<ImageDataUrl, ExportError> {
    let layout = &options.layout;
    let palette = options.theme.palette();
    let (width, height) = surface.size();

    surface.fill_rect(0, 0, width, height, palette.base_00.rgba());
    surface.fill_rect(0, 0, width, layout.header_height.min(height), palette.base_01.rgba());
    surface.fill_text(
        title,
        layout.title_x,
        layout.title_baseline,
        TextStyle::new(FontRole::Title, layout.title_size),
        palette.base_0d.rgba(),
    )?;

    let code_style = TextStyle::new(FontRole::Code, layout.code_size);
    let tab = " ".repeat(TAB_WIDTH);
    for (index, line) in document.raw_lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let text = line.replace('\t', &tab);
        surface.fill_text(
            &text,
            layout.padding,
            layout.line_baseline(index),
            code_style,
            palette.base_05.rgba(),
        )?;
    }

    surface.fill_text(
        &options.footer,
        layout.footer_x,
        layout.footer_baseline(height),
        TextStyle::new(FontRole::Footer, layout.footer_size),
        palette.base_03.rgba(),
    )?;

    let png = surface.encode_png()?;
    debug!("Encoded {width}x{height} snapshot, {} bytes", png.len());
    Ok(ImageDataUrl::from_png(&png))
}
