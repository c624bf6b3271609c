use crate::models::chat::{ ChatId, ChatRequest };

/// A request that has been built but not yet answered.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub seq: u64,
    pub request: ChatRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// The reply was the newest so far; `previous` is the id it replaced.
    Current {
        previous: Option<ChatId>,
        current: Option<ChatId>,
    },
    /// A newer turn was already applied; the conversation id was left alone.
    Stale,
}

/// Conversation state shared by every turn of one chat session.
///
/// Turns are numbered in the order they were started. Responses can come
/// back in any order, so only a response at least as new as the last one
/// applied may replace the conversation id.
#[derive(Debug, Default)]
pub struct ChatSession {
    chat_id: Option<ChatId>,
    next_seq: u64,
    applied_seq: Option<u64>,
}

impl ChatSession {
    pub fn new(chat_id: Option<ChatId>) -> Self {
        Self {
            chat_id: chat_id.filter(ChatId::is_present),
            ..Self::default()
        }
    }

    pub fn chat_id(&self) -> Option<&ChatId> {
        self.chat_id.as_ref()
    }

    pub fn begin_turn(&mut self, message: String) -> Turn {
        let seq = self.next_seq;
        self.next_seq += 1;
        Turn {
            seq,
            request: ChatRequest {
                message,
                chat_id: self.chat_id.clone(),
            },
        }
    }

    /// Records the conversation id returned for turn `seq`.
    ///
    /// A missing or falsy id (`""`, `0`, `false`) clears the stored one,
    /// matching what the backend said last.
    pub fn apply(&mut self, seq: u64, chat_id: Option<ChatId>) -> Applied {
        if let Some(last) = self.applied_seq {
            if seq < last {
                return Applied::Stale;
            }
        }
        self.applied_seq = Some(seq);
        let current = chat_id.filter(ChatId::is_present);
        let previous = std::mem::replace(&mut self.chat_id, current.clone());
        Applied::Current { previous, current }
    }
}
