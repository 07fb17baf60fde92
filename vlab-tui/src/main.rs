//! VolatilityLab TUI: sidebar console with a keyboard-driven backtest wizard.
//!
//! Logs go to `<data_local_dir>/vlab/vlab.log`, never to the terminal.

use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vlab_core::catalog::RemoteCatalog;
use vlab_core::config::CatalogSource;
use vlab_core::{
    HttpBacktestClient, StaticCatalog, StrategyCatalog, SystemClock, VlabConfig,
    WorkflowController,
};
use vlab_tui::{input, persistence, ui, AppState};

const LOG_ENV: &str = "VLAB_LOG";

fn init_logging(log_path: &Path) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create log dir {}", parent.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("open log file {}", log_path.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init();
    Ok(())
}

fn main() -> Result<()> {
    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    // Paths
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vlab");
    let data_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vlab");
    let state_path = config_dir.join("state.json");

    init_logging(&data_dir.join("vlab.log"))?;

    let config = VlabConfig::load(None).context("load configuration")?;
    info!(base_url = %config.api.base_url, catalog = ?config.catalog.source, "starting console");

    // Collaborators
    let client = Arc::new(HttpBacktestClient::new(&config.api).context("build HTTP client")?);
    let catalog: Arc<dyn StrategyCatalog> = match config.catalog.source {
        CatalogSource::Static => Arc::new(StaticCatalog::builtin()),
        CatalogSource::Remote => {
            Arc::new(RemoteCatalog::new(client.clone(), StaticCatalog::builtin()))
        }
    };
    let mut controller =
        WorkflowController::new(catalog, client).context("spawn backtest worker")?;
    if config.catalog.source == CatalogSource::Remote {
        controller.refresh_strategies();
    }

    // Build app state and apply persisted preferences
    let mut app = AppState::new(
        controller,
        &config.carousel,
        Arc::new(SystemClock),
        state_path.clone(),
        data_dir.join("exports"),
    );
    persistence::apply(&mut app, persistence::load(&state_path));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run the main event loop
    let result = run_app(&mut terminal, &mut app);

    // Save state before exit
    if let Err(e) = persistence::save(&state_path, &persistence::extract(&app)) {
        warn!(error = %e, "failed to save UI state");
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Stop the worker; an in-flight request finishes first.
    let AppState { controller, .. } = app;
    controller.shutdown();
    info!("console closed");

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Drain worker responses (non-blocking)
        app.tick();

        // 3. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 4. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}
