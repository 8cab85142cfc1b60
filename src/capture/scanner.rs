//! Barcode scanner seam.
//!
//! A scanner is a lazy feed of scanned payloads. Dropping the receiver stops
//! consumption; calling `subscribe` again starts a fresh feed. The console
//! build reads lines from stdin, which is exactly what a USB wedge scanner
//! produces.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

pub trait Scanner: Send + Sync {
    fn subscribe(&self) -> mpsc::Receiver<String>;
}

/// Reads newline-terminated scan payloads from stdin
pub struct StdinScanner;

impl Scanner for StdinScanner {
    fn subscribe(&self) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let code = line.trim().to_string();
                        if code.is_empty() {
                            continue;
                        }
                        if tx.send(code).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("scanner input closed");
                        break;
                    }
                    Err(e) => {
                        debug!(error = %e, "scanner read error");
                        break;
                    }
                }
            }
        });
        rx
    }
}
