use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ratatui::DefaultTerminal;
use ratatui::crossterm::event::{DisableFocusChange, EnableFocusChange};
use ratatui::crossterm::execute;
use tracing::{error, info};

mod controller;
mod domain;
mod logging;
mod model;
mod orders;
mod query;
mod store;
mod table;
mod ui;

use controller::Controller;
use domain::{DEFAULT_ENDPOINT, PageRequest, TVConfig, TVError};
use model::{Model, Status};
use orders::{HttpPostsSource, PostsSource};
use ui::TableUI;

/// Browse a page of orders in the terminal.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Endpoint returning the upstream records
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    url: String,

    /// Page to fetch, starting at 0
    #[arg(long, default_value_t = 0)]
    page: usize,

    /// Orders per page
    #[arg(long, default_value_t = 15)]
    size: usize,

    /// Column the table is sorted by initially
    #[arg(long, default_value = "id")]
    sort: String,

    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Seconds fetched orders count as fresh
    #[arg(long, default_value_t = 0)]
    stale_secs: u64,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    #[arg(long, default_value_t = 40)]
    max_column_width: usize,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn to_config(&self) -> Result<TVConfig, TVError> {
        let request = PageRequest::new(self.page, self.size, self.sort.clone())?;
        Ok(TVConfig::default()
            .with_endpoint(self.url.clone())
            .with_request(request)
            .with_request_timeout(Duration::from_secs(self.timeout_secs))
            .with_stale_time(Duration::from_secs(self.stale_secs))
            .with_event_poll_time(self.poll_ms)
            .with_max_column_width(self.max_column_width))
    }
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run() -> Result<(), TVError> {
    let args = Args::parse();
    if let Some(log_file) = &args.log_file {
        logging::init_logging(log_file, args.verbose)?;
    }
    let cfg = args.to_config()?;
    info!("Starting otv, fetching {} ({:?})", cfg.endpoint, cfg.request);

    let source: Arc<dyn PostsSource> =
        Arc::new(HttpPostsSource::new(cfg.endpoint.clone(), cfg.request_timeout)?);

    let mut terminal = ratatui::try_init().map_err(TVError::TerminalUnavailable)?;
    with_restore(
        // Focus changes trigger a refetch of stale orders
        || execute!(io::stdout(), EnableFocusChange),
        || event_loop(&mut terminal, &cfg, source),
        || {
            let _ = execute!(io::stdout(), DisableFocusChange);
            ratatui::restore();
        },
    )
}

// Runs `restore` whatever `setup` or `body` return.
fn with_restore(
    setup: impl FnOnce() -> io::Result<()>,
    body: impl FnOnce() -> Result<(), TVError>,
    restore: impl FnOnce(),
) -> Result<(), TVError> {
    let result = setup().map_err(TVError::from).and_then(|_| body());
    restore();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    cfg: &TVConfig,
    source: Arc<dyn PostsSource>,
) -> Result<(), TVError> {
    let size = terminal.size()?;
    let mut model = Model::init(cfg, source, size.width as usize, size.height as usize);
    let mut ui = TableUI::new();
    let controller = Controller::new(cfg);

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event()?;
        model.update(message)?;
    }

    info!("Quitting otv");
    Ok(())
}
