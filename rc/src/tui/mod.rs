//! Terminal User Interface for the recipe manager
//!
//! Screens follow the controller's view: recipe list, recipe detail (with an
//! edit sub-mode), add-recipe form and the ingredients screen. F1-F3 switch
//! between the header tabs from anywhere.

mod app;
mod events;
mod runner;
mod views;

pub use app::{Action, App, ConfirmDialog, IngredientsFocus};
pub use events::{Event, EventHandler};
pub use runner::TuiRunner;

use std::io::{self, Stdout};
use std::sync::Arc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use eyre::Result;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::api::RecipeApi;
use crate::controller::{Controller, ControllerHandle, DialogConfirm};

/// Terminal type alias
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Initialize the terminal for TUI mode
pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
pub fn restore() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

/// Run the TUI against an API until the user quits
pub async fn run(api: Arc<dyn RecipeApi>) -> Result<()> {
    let (confirm, confirm_rx) = DialogConfirm::new();
    let controller = Controller::new(api, Arc::new(confirm));
    let handle = ControllerHandle::spawn(controller);

    let terminal = init()?;

    // Restore the terminal even on early return or error
    struct TerminalGuard;
    impl Drop for TerminalGuard {
        fn drop(&mut self) {
            let _ = restore();
        }
    }
    let _guard = TerminalGuard;

    let mut runner = TuiRunner::new(terminal, handle, confirm_rx);
    runner.run().await
}
