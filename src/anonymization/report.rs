//! Line-oriented run reporting
//!
//! Every user-facing message of a run goes through a [`Reporter`] so callers
//! decide where it ends up. The CLI prints to stdout; tests collect lines.

use std::sync::Mutex;

/// Sink for human-readable report lines
pub trait Reporter: Send + Sync {
    fn line(&self, message: &str);
}

/// Prints each line to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn line(&self, message: &str) {
        println!("{message}");
    }
}

/// Collects lines in memory
#[derive(Debug, Default)]
pub struct BufferedReporter {
    lines: Mutex<Vec<String>>,
}

impl BufferedReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines reported so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|lines| lines.clone()).unwrap_or_default()
    }

    /// Whether any reported line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl Reporter for BufferedReporter {
    fn line(&self, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(message.to_string());
        }
    }
}
