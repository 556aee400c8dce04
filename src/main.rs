use std::fs::{self, File};
use std::io::{self, Read};
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use snipview::clipboard::SystemClipboard;
use snipview::emphasis::EmphasisSet;
use snipview::event_source::KeyboardEventSource;
use snipview::export::{
    DirectorySink, EXPORT_PRE_DELAY, ExportRequest, RasterSurfaceFactory, run_export,
};
use snipview::panic_handler::{initialize_panic_handler, restore_terminal};
use snipview::settings::{self, Settings};
use snipview::syntax_highlighter::SyntaxHighlighter;
use snipview::theme::ThemeId;
use snipview::{App, CodeViewer, SourceDocument, run_app_with_event_source};

/// View a source snippet with highlighting, copy it, or save it as a PNG.
#[derive(Parser, Debug)]
#[command(name = "snipview", version, about)]
struct Cli {
    /// Source file to show. Reads stdin when omitted or `-`.
    file: Option<PathBuf>,

    /// Caption for the viewer header and the exported image
    #[arg(short, long)]
    title: Option<String>,

    /// Lines to emphasize, e.g. `2,4,7-9`
    #[arg(long = "highlight", value_name = "LINES", default_value = "")]
    highlight: EmphasisSet,

    /// Color theme, overrides the config file
    #[arg(long)]
    theme: Option<String>,

    /// Write the PNG and exit without opening the viewer
    #[arg(long)]
    export_only: bool,

    /// Where to write the log
    #[arg(long, value_name = "PATH", default_value = "snipview.log")]
    log_file: PathBuf,

    /// Log at debug level
    #[arg(long)]
    debug: bool,
}

fn read_source(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn default_title(file: Option<&PathBuf>) -> String {
    file.and_then(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snippet".to_string())
}

fn export_headless(settings: &Settings, theme: ThemeId, request: ExportRequest) -> Result<()> {
    let mut options = settings.export_options();
    options.theme = theme;
    let mut surfaces = RasterSurfaceFactory::new(settings.font_config());
    let mut sink = DirectorySink::resolve(settings.export.directory.as_deref());

    thread::sleep(EXPORT_PRE_DELAY);
    let path = run_export(&options, &request, &mut surfaces, &mut sink)
        .context("Failed to export image")?;
    println!("{}", path.display());
    Ok(())
}

fn run_viewer(settings: &Settings, theme: ThemeId, viewer: CodeViewer) -> Result<()> {
    let mut options = settings.export_options();
    options.theme = theme;
    let mut app = App::new(
        viewer,
        options,
        Box::new(SystemClipboard::new()),
        Box::new(RasterSurfaceFactory::new(settings.font_config())),
        Box::new(DirectorySink::resolve(settings.export.directory.as_deref())),
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app_with_event_source(&mut terminal, &mut app, &mut KeyboardEventSource);

    restore_terminal();
    terminal.show_cursor()?;
    res
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    WriteLogger::init(
        if cli.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("Failed to create log file {}", cli.log_file.display()))?,
    )?;
    info!("Starting snipview");

    settings::load_settings();
    let settings = settings::get_settings();
    let theme = cli
        .theme
        .as_deref()
        .map(ThemeId::from_name)
        .unwrap_or_else(|| settings.theme_id());

    let document = SourceDocument::new(read_source(cli.file.as_ref())?);
    let title = cli
        .title
        .clone()
        .unwrap_or_else(|| default_title(cli.file.as_ref()));

    if cli.export_only {
        let started = Instant::now();
        let result = export_headless(&settings, theme, ExportRequest { document, title });
        if let Err(e) = &result {
            error!("Export failed: {e:#}");
        }
        info!("Headless export took {:?}", started.elapsed());
        return result;
    }

    initialize_panic_handler();
    let viewer = CodeViewer::new(document, title, cli.highlight, SyntaxHighlighter::new(theme));
    let res = run_viewer(&settings, theme, viewer);
    if let Err(err) = &res {
        error!("Application error: {err:?}");
    }

    info!("Shutting down snipview");
    res
}
