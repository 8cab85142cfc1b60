//! Scripted capture devices for tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::capture::camera::{Camera, CaptureError};
use crate::capture::scanner::Scanner;
use crate::packout::{PhotoCategory, PhotoRef};

/// Camera whose outcomes are queued in advance; an exhausted script yields
/// numbered synthetic refs
pub struct MockCamera {
    script: Mutex<VecDeque<Result<PhotoRef, CaptureError>>>,
    shots: AtomicUsize,
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCamera {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            shots: AtomicUsize::new(0),
        }
    }

    pub fn push_outcome(&self, outcome: Result<PhotoRef, CaptureError>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    pub fn shots(&self) -> usize {
        self.shots.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Camera for MockCamera {
    async fn capture(&self, _hint: PhotoCategory) -> Result<PhotoRef, CaptureError> {
        let n = self.shots.fetch_add(1, Ordering::SeqCst) + 1;
        match self.script.lock().unwrap().pop_front() {
            Some(outcome) => outcome,
            None => Ok(PhotoRef(format!("mock://photo-{n}"))),
        }
    }
}

/// Scanner that replays a fixed list of codes and then closes the feed
pub struct ScriptedScanner {
    codes: Vec<String>,
}

impl ScriptedScanner {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }
}

impl Scanner for ScriptedScanner {
    fn subscribe(&self) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(self.codes.len().max(1));
        for code in &self.codes {
            // capacity covers the whole script, so this cannot fail
            let _ = tx.try_send(code.clone());
        }
        rx
    }
}
