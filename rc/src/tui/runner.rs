//! TUI Runner - owns the terminal and bridges keys, snapshots and dialogs
//!
//! The loop redraws after every wake-up and waits on three sources:
//! - terminal input from the `EventHandler`
//! - new `ViewState` snapshots from the controller
//! - confirmation requests from `DialogConfirm`

use std::time::Duration;

use eyre::Result;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::Tui;
use super::app::{Action, App};
use super::events::{Event, EventHandler};
use super::views;
use crate::controller::{ConfirmRequest, ControllerHandle, ViewState};

const TICK_RATE: Duration = Duration::from_millis(250);

pub struct TuiRunner {
    app: App,
    terminal: Tui,
    handle: ControllerHandle,
    state_rx: watch::Receiver<ViewState>,
    confirm_rx: mpsc::UnboundedReceiver<ConfirmRequest>,
    event_handler: EventHandler,
}

impl TuiRunner {
    pub fn new(terminal: Tui, handle: ControllerHandle, confirm_rx: mpsc::UnboundedReceiver<ConfirmRequest>) -> Self {
        let state_rx = handle.subscribe();
        Self {
            app: App::new(),
            terminal,
            handle,
            state_rx,
            confirm_rx,
            event_handler: EventHandler::new(TICK_RATE),
        }
    }

    /// Run until the user quits or the controller stops
    pub async fn run(&mut self) -> Result<()> {
        info!("TuiRunner::run: started");
        loop {
            let state = self.state_rx.borrow_and_update().clone();
            self.app.sync(&state);
            self.terminal.draw(|frame| views::render(&self.app, &state, frame))?;

            tokio::select! {
                event = self.event_handler.next() => match event? {
                    Event::Key(key) => match self.app.handle_key(key, &state) {
                        Some(Action::Quit) => break,
                        Some(Action::Send(intent)) => self.handle.send(intent).await?,
                        None => {}
                    },
                    Event::Resize(width, height) => debug!(width, height, "TuiRunner::run: resize"),
                    Event::Tick => {}
                },
                changed = self.state_rx.changed() => {
                    if changed.is_err() {
                        warn!("TuiRunner::run: controller stopped");
                        break;
                    }
                }
                Some(request) = self.confirm_rx.recv() => {
                    debug!(message = %request.message, "TuiRunner::run: confirm requested");
                    self.app.open_dialog(request);
                }
            }
        }

        // A dropped dialog answers "no" to a controller still waiting on it
        self.app.dialog = None;
        if let Err(e) = self.handle.shutdown().await {
            debug!(error = %e, "TuiRunner::run: controller already stopped");
        }
        info!("TuiRunner::run: exited");
        Ok(())
    }
}
