use crossterm::style::Stylize;
use log::debug;
use std::io::{ self, Write };
use std::sync::{ Mutex, MutexGuard };
use super::TranscriptView;
use crate::models::chat::{ ChatMessage, Role };

type Sink = Mutex<Box<dyn Write + Send>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Prints each entry as a line, for non-interactive use.
///
/// Errors go to the error sink, everything else to the output sink. The first
/// write failure is kept for [`StdoutView::take_error`].
pub struct StdoutView {
    color: bool,
    out: Sink,
    err: Sink,
    failure: Mutex<Option<io::Error>>,
}

impl StdoutView {
    pub fn new(color: bool) -> Self {
        Self::with_writers(color, Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn with_writers(
        color: bool,
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>
    ) -> Self {
        Self {
            color,
            out: Mutex::new(out),
            err: Mutex::new(err),
            failure: Mutex::new(None),
        }
    }

    pub fn format(&self, message: &ChatMessage) -> String {
        let label = match message.role {
            Role::User => "You",
            Role::Assistant => "Assistant",
            Role::Error => "Error",
        };
        if !self.color {
            return format!("{}: {}", label, message.content);
        }
        let label = match message.role {
            Role::User => label.cyan().bold(),
            Role::Assistant => label.green().bold(),
            Role::Error => label.red().bold(),
        };
        format!("{}: {}", label, message.content)
    }

    /// First write failure since the last call, if any.
    pub fn take_error(&self) -> Option<io::Error> {
        lock(&self.failure).take()
    }
}

impl TranscriptView for StdoutView {
    fn append(&self, message: ChatMessage) {
        let line = self.format(&message);
        let sink = if message.role == Role::Error { &self.err } else { &self.out };
        let written = {
            let mut sink = lock(sink);
            writeln!(sink, "{}", line).and_then(|_| sink.flush())
        };
        if let Err(e) = written {
            debug!("Failed to print {:?} entry: {}", message.role, e);
            lock(&self.failure).get_or_insert(e);
        }
    }
}
