mod app;
mod config;
mod error;
mod kanban_board;
mod storage;
mod store;
mod task;
mod ui;

use app::App;
use config::Config;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    fs::{self, OpenOptions},
    io,
};
use storage::FileStorage;
use store::BoardStore;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_matches(&config::command().get_matches());
    init_logging(&config)?;

    // Board setup
    let storage = FileStorage::new(&config.data_file);
    let mut store = BoardStore::load(storage, config.storage_key.as_str());
    log::info!("Loaded board with {} tasks", store.board().task_count());
    if let Err(err) = store.persist() {
        log::error!("Failed to save board to {}: {}", config.data_file.display(), err);
    }
    let mut app = App::new(store, config.submit_delay);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = ui::run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("{:?}", err);
    }
    Ok(())
}

// stderr shares the tty with the TUI, so logs always go to a file
fn init_logging(config: &Config) -> io::Result<()> {
    let path = config.log_path();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}
