//! Confirmation capability for destructive actions

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Ask the user to confirm before a destructive request is issued
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// Fixed answer (`--yes`, tests)
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirm for AutoConfirm {
    async fn confirm(&self, message: &str) -> bool {
        debug!(%message, answer = self.0, "AutoConfirm::confirm: called");
        self.0
    }
}

/// `[y/N]` prompt on the terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

#[async_trait]
impl Confirm for StdinConfirm {
    async fn confirm(&self, message: &str) -> bool {
        let prompt = format!("{} [y/N] ", message);
        let answer = tokio::task::spawn_blocking(move || {
            use std::io::{BufRead, Write};
            let mut stdout = std::io::stdout();
            let _ = write!(stdout, "{}", prompt);
            let _ = stdout.flush();
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_yes(&line),
            _ => false,
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// A pending question for the TUI's dialog
#[derive(Debug)]
pub struct ConfirmRequest {
    pub message: String,
    pub reply: oneshot::Sender<bool>,
}

/// Routes questions to the TUI and waits for the dialog's answer
#[derive(Debug, Clone)]
pub struct DialogConfirm {
    tx: mpsc::UnboundedSender<ConfirmRequest>,
}

impl DialogConfirm {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ConfirmRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Confirm for DialogConfirm {
    async fn confirm(&self, message: &str) -> bool {
        debug!(%message, "DialogConfirm::confirm: called");
        let (reply, answer) = oneshot::channel();
        let request = ConfirmRequest {
            message: message.to_string(),
            reply,
        };
        if self.tx.send(request).is_err() {
            debug!("DialogConfirm::confirm: dialog channel closed");
            return false;
        }
        // A dropped reply counts as "no"
        answer.await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_auto_confirm() {
        assert!(AutoConfirm(true).confirm("Delete this recipe?").await);
        assert!(!AutoConfirm(false).confirm("Delete this recipe?").await);
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
    }

    #[tokio::test]
    async fn test_dialog_round_trip() {
        let (confirm, mut rx) = DialogConfirm::new();
        let asker = tokio::spawn(async move { confirm.confirm("Delete ingredient \"Flour\"?").await });

        let request = rx.recv().await.unwrap();
        assert_eq!(request.message, "Delete ingredient \"Flour\"?");
        request.reply.send(true).unwrap();
        assert!(asker.await.unwrap());
    }

    #[tokio::test]
    async fn test_dialog_dropped_reply_is_no() {
        let (confirm, mut rx) = DialogConfirm::new();
        let asker = tokio::spawn(async move { confirm.confirm("Delete this recipe?").await });
        drop(rx.recv().await.unwrap());
        assert!(!asker.await.unwrap());
    }

    #[tokio::test]
    async fn test_dialog_without_receiver_is_no() {
        let (confirm, rx) = DialogConfirm::new();
        drop(rx);
        assert!(!confirm.confirm("Delete this recipe?").await);
    }
}
