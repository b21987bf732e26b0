use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;

mod app;
mod config;
mod error;
mod floating;
mod glass;
mod logger;
mod notes;
mod screens;
mod settings;
mod store;

use crate::app::App;
use crate::store::Store;

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    Ok(())
}

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TUI application (default)
    Tui,
    /// Print notes, pinned first then newest
    List,
    /// Save a new note
    Add {
        /// Note text, trimmed and capped at 1000 characters
        text: String,
    },
    /// Delete every note
    Clear,
}

async fn print_notes(store: &Store) -> Result<()> {
    let stored = notes::load_notes(store).await?;
    if stored.is_empty() {
        println!("No notes yet");
        return Ok(());
    }
    let now = notes::now_millis();
    for note in notes::sort_for_display(&stored) {
        let pin = if note.is_pinned { "⚑" } else { " " };
        println!(
            "{} {:<12} {}",
            pin,
            notes::format_relative_date(note.created_at, now),
            notes::preview_title(&note.content)
        );
    }
    Ok(())
}

async fn add_note(store: &Store, text: &str) -> Result<()> {
    let existing = notes::load_notes(store).await?;
    let updated = notes::add_note(&existing, text, notes::now_millis())?;
    notes::save_notes(store, &updated).await?;
    log::info!("cli: added note ({} notes stored)", updated.len());
    println!("Note saved.");
    Ok(())
}

async fn clear_all(store: &Store) -> Result<()> {
    notes::clear_notes(store).await?;
    log::info!("cli: cleared all notes");
    println!("All notes have been deleted.");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        default_hook(info);
    }));

    let _logger = logger::init();
    let store = Store::open_default()?;

    let args = Args::parse();

    match args.command {
        Some(Commands::List) => {
            return print_notes(&store).await;
        }
        Some(Commands::Add { text }) => {
            return add_note(&store, &text).await;
        }
        Some(Commands::Clear) => {
            return clear_all(&store).await;
        }
        None | Some(Commands::Tui) => {
            // Proceed to TUI
        }
    }

    let app_config = config::load_config();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let mut app = App::new(store, app_config).await;
    let app_result = app.run(&mut terminal).await;

    drop(app);
    let _ = restore_terminal();
    if let Err(err) = app_result {
        log::error!("ui loop failed: {:?}", err);
        eprintln!("Error: {:?}", err);
    }
    Ok(())
}
