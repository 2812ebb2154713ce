use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tracing_subscriber::EnvFilter;

use tui_choropleth::app::App;
use tui_choropleth::chart::format_value;
use tui_choropleth::classify::{ColorScale, Method};
use tui_choropleth::config::AppConfig;
use tui_choropleth::data::{self, record_values, Dataset};
use tui_choropleth::palette::Palette;
use tui_choropleth::ui;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file; defaults apply when it does not exist
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    /// Directory holding the CSV and GeoJSON files (overrides the config)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Attribute column expressed at startup
    #[arg(short, long)]
    attribute: Option<String>,

    /// Classification method (overrides the config)
    #[arg(short, long, value_enum)]
    method: Option<Method>,

    /// Write logs to this file; the terminal UI owns stdout
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Print the join report and class breaks instead of starting the UI
    #[arg(long)]
    summary: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let mut config = if cli.config.exists() {
        AppConfig::load_from_file(&cli.config)?
    } else {
        tracing::info!(path = %cli.config.display(), "no config file, using defaults");
        AppConfig::default()
    };
    if let Some(dir) = &cli.data_dir {
        config.data.dir = dir.clone();
    }
    let method = cli.method.unwrap_or(config.classification.method);
    let palette = config.classification.palette()?;

    let dataset = data::load_dataset(&config.data, &config.columns())
        .with_context(|| format!("Failed to load data from {}", config.data.dir.display()))?;
    tracing::info!(
        records = dataset.records.len(),
        regions = dataset.features.len(),
        matched = dataset.report.matched,
        sample = dataset.is_sample,
        "dataset ready"
    );

    if cli.summary {
        print_summary(&config, &dataset, method, &palette);
        return Ok(());
    }

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, &config, dataset, palette, method, cli.attribute.as_deref());

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Logs go to `--log-file`, or to stderr in summary mode. The UI run stays silent otherwise.
fn init_tracing(cli: &Cli) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(path) = &cli.log_file {
        let file = File::create(path).with_context(|| format!("Failed to create log file: {:?}", path))?;
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if cli.summary {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn print_summary(config: &AppConfig, dataset: &Dataset, method: Method, palette: &Palette) {
    let report = &dataset.report;
    println!(
        "{} records, {} regions, {} joined{}",
        dataset.records.len(),
        dataset.features.len(),
        report.matched,
        if dataset.is_sample { " (sample data)" } else { "" }
    );
    if !report.unmatched_features.is_empty() {
        println!("regions without data: {}", report.unmatched_features.join(", "));
    }
    if !report.unused_records.is_empty() {
        println!("records without region: {}", report.unused_records.join(", "));
    }

    println!("classification: {method}");
    for column in config.columns() {
        let scale = ColorScale::build(&record_values(&dataset.records, &column), method, palette.clone());
        let breaks: Vec<String> = scale.breakpoints().iter().map(|b| format_value(*b)).collect();
        println!("  {:<12} {:<24} [{}]", column, config.label_for(&column), breaks.join(", "));
    }
}

/// Handle mouse events for hover, tab selection, panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Moved => app.pointer_moved(mouse.column, mouse.row),
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click a tab to select an attribute, click and drag the map to pan
        MouseEventKind::Down(MouseButton::Left) => app.click(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => {
            if app.last_mouse.is_some() {
                app.handle_drag(mouse.column, mouse.row);
            }
        }
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(),
        _ => {}
    }
}

fn run(
    terminal: &mut DefaultTerminal,
    config: &AppConfig,
    dataset: Dataset,
    palette: Palette,
    method: Method,
    attribute: Option<&str>,
) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(config, dataset, palette, method, attribute, size.width, size.height);

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                            // Attribute selection
                            KeyCode::Tab => app.next_attribute(),
                            KeyCode::BackTab => app.prev_attribute(),
                            KeyCode::Char(c @ '1'..='9') => {
                                app.select_attribute(c as usize - '1' as usize);
                            }
                            KeyCode::Char('m') | KeyCode::Char('M') => app.cycle_method(),

                            // Pan with hjkl or arrow keys
                            KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                            KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                            KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                            KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                            // Zoom
                            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                            KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                            // Layer toggles
                            KeyCode::Char('g') | KeyCode::Char('G') => app.map_renderer.toggle_graticule(),
                            KeyCode::Char('b') | KeyCode::Char('B') => app.map_renderer.toggle_background(),
                            KeyCode::Char('o') | KeyCode::Char('O') => app.map_renderer.toggle_outlines(),
                            KeyCode::Char('L') => app.map_renderer.toggle_labels(),

                            // Reset view
                            KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse(&mut app, mouse);
                }
                Event::Resize(width, height) => {
                    app.resize(width, height);
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
