use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{ImageBuffer, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use log::{debug, info};
use resvg::usvg::fontdb::{self, Database, Family, Query, Stretch, Weight};
use swash::FontRef;
use swash::scale::image::Content;
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::shape::ShapeContext;
use swash::zeno::{Format, Vector};

use super::error::ExportError;

const MONOSPACE_FALLBACKS: &[&str] = &[
    "DejaVu Sans Mono",
    "Liberation Mono",
    "Noto Sans Mono",
    "Menlo",
    "Consolas",
];
const SANS_FALLBACKS: &[&str] = &[
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "Helvetica",
    "Segoe UI",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontRole {
    Title,
    Code,
    Footer,
}

impl FontRole {
    fn weight(self) -> f32 {
        match self {
            FontRole::Title => 700.0,
            FontRole::Code | FontRole::Footer => 400.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub role: FontRole,
    pub size: f32,
}

impl TextStyle {
    pub fn new(role: FontRole, size: f32) -> Self {
        Self { role, size }
    }
}

/// An offscreen drawing target. Coordinates are pixels from the top-left;
/// text is positioned by its baseline.
pub trait Surface {
    fn size(&self) -> (u32, u32);

    fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>);

    fn fill_text(
        &mut self,
        text: &str,
        x: u32,
        baseline: u32,
        style: TextStyle,
        color: Rgba<u8>,
    ) -> Result<(), ExportError>;

    fn encode_png(&self) -> Result<Vec<u8>, ExportError>;
}

/// Hands out a fresh surface for every export.
pub trait SurfaceFactory {
    fn create(&mut self, width: u32, height: u32) -> Result<Box<dyn Surface>, ExportError>;
}

/// Font files to use instead of system discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontConfig {
    pub code_font: Option<PathBuf>,
    pub ui_font: Option<PathBuf>,
}

#[derive(Clone)]
pub struct FontFace {
    data: Arc<Vec<u8>>,
    index: usize,
}

impl FontFace {
    pub fn from_bytes(data: Vec<u8>, index: usize) -> Result<Self, ExportError> {
        if FontRef::from_index(&data, index).is_none() {
            return Err(ExportError::InvalidFont);
        }
        Ok(Self {
            data: Arc::new(data),
            index,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ExportError> {
        let data = fs::read(path).map_err(|source| ExportError::FontLoad {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(data, 0)
    }

    fn query(db: &Database, families: &[Family<'_>], weight: Weight) -> Option<Self> {
        let id = db.query(&Query {
            families,
            weight,
            stretch: Stretch::Normal,
            style: fontdb::Style::Normal,
        })?;
        let (data, index) = db.with_face_data(id, |data, index| (data.to_vec(), index as usize))?;
        Self::from_bytes(data, index).ok()
    }

    pub fn font_ref(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(&self.data, self.index)
    }
}

/// Faces used by the exporter: monospace for code, sans-serif for the rest.
#[derive(Clone)]
pub struct FontSet {
    code: FontFace,
    title: FontFace,
    footer: FontFace,
}

impl FontSet {
    pub fn new(code: FontFace, ui: FontFace) -> Self {
        Self {
            code,
            title: ui.clone(),
            footer: ui,
        }
    }

    /// Configured files win; anything missing is looked up in the system
    /// font database.
    pub fn load(config: &FontConfig) -> Result<Self, ExportError> {
        let mut db = Database::new();
        if config.code_font.is_none() || config.ui_font.is_none() {
            db.load_system_fonts();
            debug!("Font database holds {} faces", db.len());
        }

        let code = match &config.code_font {
            Some(path) => FontFace::from_file(path)?,
            None => {
                let families = with_fallbacks(Family::Monospace, MONOSPACE_FALLBACKS);
                FontFace::query(&db, &families, Weight::NORMAL)
                    .ok_or(ExportError::FontUnavailable("monospace"))?
            }
        };

        let sans = with_fallbacks(Family::SansSerif, SANS_FALLBACKS);
        let footer = match &config.ui_font {
            Some(path) => FontFace::from_file(path)?,
            None => FontFace::query(&db, &sans, Weight::NORMAL)
                .ok_or(ExportError::FontUnavailable("sans-serif"))?,
        };
        let title = match &config.ui_font {
            Some(_) => footer.clone(),
            None => FontFace::query(&db, &sans, Weight::BOLD).unwrap_or_else(|| footer.clone()),
        };

        info!("Loaded export fonts");
        Ok(Self {
            code,
            title,
            footer,
        })
    }

    pub fn face(&self, role: FontRole) -> &FontFace {
        match role {
            FontRole::Title => &self.title,
            FontRole::Code => &self.code,
            FontRole::Footer => &self.footer,
        }
    }
}

fn with_fallbacks<'a>(generic: Family<'a>, names: &'a [&'a str]) -> Vec<Family<'a>> {
    std::iter::once(generic)
        .chain(names.iter().copied().map(Family::Name))
        .collect()
}

/// In-memory RGBA canvas drawn with imageproc and swash.
pub struct RasterSurface {
    image: RgbaImage,
    fonts: Arc<FontSet>,
    scale_context: ScaleContext,
    shape_context: ShapeContext,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32, fonts: Arc<FontSet>) -> Self {
        Self {
            image: ImageBuffer::new(width, height),
            fonts,
            scale_context: ScaleContext::new(),
            shape_context: ShapeContext::new(),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

fn blend(image: &mut RgbaImage, x: i32, y: i32, alpha: u8, color: Rgba<u8>) {
    if x < 0 || y < 0 || x as u32 >= image.width() || y as u32 >= image.height() {
        return;
    }
    let dest = image.get_pixel_mut(x as u32, y as u32);
    let a = alpha as f32 / 255.0;
    let inv_a = 1.0 - a;
    for channel in 0..3 {
        dest[channel] = (color[channel] as f32 * a + dest[channel] as f32 * inv_a) as u8;
    }
    dest[3] = 255;
}

impl Surface for RasterSurface {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>) {
        if width == 0 || height == 0 {
            return;
        }
        draw_filled_rect_mut(
            &mut self.image,
            Rect::at(x as i32, y as i32).of_size(width, height),
            color,
        );
    }

    fn fill_text(
        &mut self,
        text: &str,
        x: u32,
        baseline: u32,
        style: TextStyle,
        color: Rgba<u8>,
    ) -> Result<(), ExportError> {
        if text.is_empty() {
            return Ok(());
        }
        let fonts = Arc::clone(&self.fonts);
        let face = fonts.face(style.role);
        let font = face.font_ref().ok_or(ExportError::InvalidFont)?;
        let variations = [("wght", style.role.weight())];

        let mut shaper = self
            .shape_context
            .builder(font)
            .size(style.size)
            .variations(&variations)
            .build();
        shaper.add_str(text);

        let mut scaler = self
            .scale_context
            .builder(font)
            .size(style.size)
            .variations(&variations)
            .build();

        let mut glyphs = Vec::new();
        let mut pen_x = x as f32;
        shaper.shape_with(|cluster| {
            for glyph in cluster.glyphs {
                glyphs.push((glyph.id, pen_x + glyph.x, glyph.y));
                pen_x += glyph.advance;
            }
        });

        let pen_y = baseline as f32;
        for (id, glyph_x, glyph_y) in glyphs {
            let rendered = Render::new(&[Source::Outline, Source::Bitmap(StrikeWith::BestFit)])
                .format(Format::Alpha)
                .offset(Vector::new(glyph_x.fract(), glyph_y))
                .render(&mut scaler, id);

            // Text is single-colored; only alpha masks are blended
            let Some(rendered) = rendered.filter(|image| image.content == Content::Mask) else {
                continue;
            };
            let origin_x = glyph_x.floor() as i32 + rendered.placement.left;
            let origin_y = pen_y as i32 - rendered.placement.top;
            let width = rendered.placement.width;
            for py in 0..rendered.placement.height {
                for px in 0..width {
                    let alpha = rendered.data[(py * width + px) as usize];
                    if alpha > 0 {
                        blend(
                            &mut self.image,
                            origin_x + px as i32,
                            origin_y + py as i32,
                            alpha,
                            color,
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn encode_png(&self) -> Result<Vec<u8>, ExportError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

/// Creates raster surfaces, loading fonts once on first use.
pub struct RasterSurfaceFactory {
    config: FontConfig,
    fonts: Option<Arc<FontSet>>,
}

impl RasterSurfaceFactory {
    pub fn new(config: FontConfig) -> Self {
        Self {
            config,
            fonts: None,
        }
    }

    pub fn with_fonts(fonts: FontSet) -> Self {
        Self {
            config: FontConfig::default(),
            fonts: Some(Arc::new(fonts)),
        }
    }

    fn fonts(&mut self) -> Result<Arc<FontSet>, ExportError> {
        if let Some(fonts) = &self.fonts {
            return Ok(Arc::clone(fonts));
        }
        let fonts = Arc::new(FontSet::load(&self.config)?);
        self.fonts = Some(Arc::clone(&fonts));
        Ok(fonts)
    }
}

impl SurfaceFactory for RasterSurfaceFactory {
    fn create(&mut self, width: u32, height: u32) -> Result<Box<dyn Surface>, ExportError> {
        if width == 0 || height == 0 {
            return Err(ExportError::EmptyCanvas { width, height });
        }
        let fonts = self.fonts()?;
        Ok(Box::new(RasterSurface::new(width, height, fonts)))
    }
}
