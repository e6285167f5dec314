//! Lobby chat history.

use std::fmt;

use dropfour_protocol::ChatMessagePayload;

/// One line of chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub from: String,
    pub text: String,
}

impl ChatEntry {
    pub fn new(from: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            text: text.into(),
        }
    }
}

impl From<ChatMessagePayload> for ChatEntry {
    fn from(payload: ChatMessagePayload) -> Self {
        Self {
            from: payload.from,
            text: payload.text,
        }
    }
}

impl fmt::Display for ChatEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.from, self.text)
    }
}

/// The chat for the current lobby, oldest first.
///
/// Entries are kept exactly as delivered: no deduplication, no reordering,
/// no cap. The only way to remove entries is [`seed`](Self::seed), which
/// replaces the whole log with a server snapshot.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    entries: Vec<ChatEntry>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the log with `entries`.
    pub fn seed<I>(&mut self, entries: I)
    where
        I: IntoIterator,
        I::Item: Into<ChatEntry>,
    {
        self.entries = entries.into_iter().map(Into::into).collect();
    }

    /// Adds `entry` after every existing entry.
    pub fn append(&mut self, entry: impl Into<ChatEntry>) {
        self.entries.push(entry.into());
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChatEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a ChatLog {
    type Item = &'a ChatEntry;
    type IntoIter = std::slice::Iter<'a, ChatEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
