//! Terminal input pumped into a tokio channel

use std::time::Duration;

use crossterm::event::{self, KeyEvent, KeyEventKind};
use eyre::Result;
use tokio::sync::mpsc;
use tracing::trace;

/// Terminal events
#[derive(Debug)]
pub enum Event {
    /// Key press (releases and repeats are filtered out)
    Key(KeyEvent),
    Resize(u16, u16),
    /// No input within the tick rate
    Tick,
}

/// Polls crossterm on a dedicated thread
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        // crossterm's reader blocks, so keep it off the runtime
        std::thread::spawn(move || {
            loop {
                let event = if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        Ok(event::Event::Key(key)) if key.kind == KeyEventKind::Press => Event::Key(key),
                        Ok(event::Event::Resize(w, h)) => Event::Resize(w, h),
                        Ok(other) => {
                            trace!(?other, "EventHandler: ignored");
                            continue;
                        }
                        Err(_) => continue,
                    }
                } else {
                    Event::Tick
                };

                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }

    pub async fn next(&mut self) -> Result<Event> {
        self.rx.recv().await.ok_or_else(|| eyre::eyre!("Event channel closed"))
    }
}
