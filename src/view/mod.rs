pub mod input;
pub mod stdout;

use std::sync::{ Arc, Mutex, MutexGuard };
use crate::models::chat::ChatMessage;

pub use self::input::InputField;
pub use self::stdout::StdoutView;

/// Where chat turns are rendered.
pub trait TranscriptView: Send + Sync {
    /// Appends one entry and scrolls so it is the last visible one.
    fn append(&self, message: ChatMessage);
}

/// Rendered entries of the terminal chat box plus its scroll position.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<ChatMessage>,
    scroll_back: usize,
}

impl Transcript {
    pub fn push(&mut self, message: ChatMessage) {
        self.entries.push(message);
        self.scroll_back = 0;
    }

    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    /// Lines scrolled up from the newest entry.
    pub fn scroll_back(&self) -> usize {
        self.scroll_back
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }

    pub fn clamp_scroll(&mut self, max: usize) {
        self.scroll_back = self.scroll_back.min(max);
    }
}

#[derive(Debug, Clone, Default)]
pub struct SharedTranscript(Arc<Mutex<Transcript>>);

impl SharedTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, Transcript> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TranscriptView for SharedTranscript {
    fn append(&self, message: ChatMessage) {
        self.lock().push(message);
    }
}
