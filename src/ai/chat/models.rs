//! The core models for a chat session: transcript entries and the
//! append-only transcript they are stored in.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

// Observers that fall this far behind start missing entries and
// should re-read the transcript instead.
const OBSERVER_CAPACITY: usize = 256;

/// Who produced an entry. Only model entries carry a model id.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
#[serde(tag = "origin", rename_all = "lowercase")]
pub enum Origin {
    User,
    Model { model_id: String },
}

/// A single immutable element of the transcript.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct Entry {
    id: String,
    content: String,
    #[serde(flatten)]
    origin: Origin,
    created_at: DateTime<Utc>,
    chained: bool,
}

impl Entry {
    pub fn user(content: &str) -> Self {
        Self::new(content, Origin::User, false)
    }

    pub fn model(model_id: &str, content: &str, chained: bool) -> Self {
        Self::new(
            content,
            Origin::Model {
                model_id: model_id.to_string(),
            },
            chained,
        )
    }

    fn new(content: &str, origin: Origin, chained: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            origin,
            created_at: Utc::now(),
            chained,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn model_id(&self) -> Option<&str> {
        match &self.origin {
            Origin::Model { model_id } => Some(model_id),
            Origin::User => None,
        }
    }

    pub fn is_user(&self) -> bool {
        self.origin == Origin::User
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn chained(&self) -> bool {
        self.chained
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
}

/// What the user sends in one turn.
#[derive(Clone, Debug, Default)]
pub struct Submission {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl Submission {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachments(mut self, names: &[&str]) -> Self {
        self.attachments = names
            .iter()
            .map(|name| Attachment {
                name: name.to_string(),
            })
            .collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.attachments.is_empty()
    }

    /// The text shown for the user's entry. Attachments are listed by
    /// name only.
    pub fn display_text(&self) -> String {
        if self.attachments.is_empty() {
            return self.text.clone();
        }
        let names = self
            .attachments
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<&str>>()
            .join(", ");
        format!("{}\n\nAttached files: {}", self.text, names)
    }
}

/// Append-only log of entries in creation order. There is no update or
/// delete; a bad response is corrected by appending a new entry.
pub struct Transcript {
    entries: Vec<Entry>,
    observers: broadcast::Sender<Entry>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        let (observers, _) = broadcast::channel(OBSERVER_CAPACITY);
        Self {
            entries: Vec::new(),
            observers,
        }
    }

    /// Adds the entry to the end and notifies observers of the new tail.
    pub fn append(&mut self, entry: Entry) {
        self.entries.push(entry.clone());
        // No receivers is fine, nobody is watching
        let _ = self.observers.send(entry);
    }

    pub fn all(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Receive every entry appended after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Entry> {
        self.observers.subscribe()
    }
}
