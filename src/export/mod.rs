pub mod data_url;
pub mod download;
pub mod error;
pub mod filename;
pub mod job;
pub mod layout;
pub mod render;
pub mod surface;

pub use data_url::ImageDataUrl;
pub use download::{DirectorySink, DownloadSink};
pub use error::{ExportError, ExportRejected};
pub use filename::{DEFAULT_EXPORT_FILENAME, sanitize_filename};
pub use job::{
    DEFAULT_FOOTER, EXPORT_PRE_DELAY, EXPORT_RESET_DELAY, ExportJob, ExportOptions, ExportOutcome,
    ExportRequest, ExportState, run_export,
};
pub use layout::ExportLayout;
pub use render::render_snippet;
pub use surface::{
    FontConfig, FontFace, FontRole, FontSet, RasterSurface, RasterSurfaceFactory, Surface,
    SurfaceFactory, TextStyle,
};
