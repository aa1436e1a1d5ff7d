use std::io::{IsTerminal, Write};
use std::time::Duration;

use colored::*;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const FRAMES: [&str; 4] = ["|", "/", "-", "\\"];
const TICK: Duration = Duration::from_millis(120);

/// Rotating status indicator shown while the completion call is outstanding.
/// Renders to stderr only when stderr is a terminal, touches no domain state,
/// and is always joined before `stop` returns.
pub struct Spinner {
    cancel: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    pub fn start(label: &str) -> Self {
        if !std::io::stderr().is_terminal() {
            return Spinner {
                cancel: None,
                handle: None,
            };
        }

        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let label = label.to_string();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            let mut frame = 0usize;
            loop {
                tokio::select! {
                    _ = &mut cancel_rx => break,
                    _ = interval.tick() => {
                        eprint!("\r\x1b[2K{} {}", FRAMES[frame % FRAMES.len()].cyan(), label.dimmed());
                        let _ = std::io::stderr().flush();
                        frame += 1;
                    }
                }
            }
            eprint!("\r\x1b[2K");
            let _ = std::io::stderr().flush();
        });

        Spinner {
            cancel: Some(cancel_tx),
            handle: Some(handle),
        }
    }

    pub async fn stop(mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}
