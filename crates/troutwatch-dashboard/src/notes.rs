//! Notes tile fed by cross-frame messages.
//!
//! Embedded pages post `{"type": "note", "text": ...}` envelopes; every
//! accepted note is timestamped and prepended to the `section-notes` tile.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RegistrationError;
use crate::markup::{Element, Node};
use crate::registry::TileRegistry;
use crate::tile::TileSpec;

/// Identifier of the notes tile.
pub const NOTES_TILE_ID: &str = "section-notes";
/// Oldest notes are dropped beyond this count.
pub const MAX_NOTES: usize = 200;
/// Message type accepted by [`NotesBoard::accept`].
pub const NOTE_MESSAGE_TYPE: &str = "note";

const EMPTY_TEXT: &str = "No notes";

/// One received note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    /// Local time of receipt.
    pub received_at: DateTime<Local>,
    /// Note text.
    pub text: String,
}

impl Note {
    /// `[HH:MM:SS] text`
    pub fn display_line(&self) -> String {
        format!("[{}] {}", self.received_at.format("%H:%M:%S"), self.text)
    }
}

/// Cross-frame message envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message type; only `"note"` is handled.
    #[serde(rename = "type")]
    pub kind: String,
    /// Payload. Non-string payloads are kept as their JSON text.
    #[serde(default)]
    pub text: serde_json::Value,
}

impl Message {
    /// A note message.
    pub fn note(text: impl Into<String>) -> Self {
        Self {
            kind: NOTE_MESSAGE_TYPE.to_owned(),
            text: serde_json::Value::String(text.into()),
        }
    }

    fn text_string(&self) -> String {
        match &self.text {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Notes history plus the tile that shows it.
#[derive(Debug, Clone, Default)]
pub struct NotesBoard {
    notes: Vec<Note>,
}

impl NotesBoard {
    /// Empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the notes tile with its empty placeholder.
    pub fn mount(&self, registry: &mut TileRegistry) -> Result<(), RegistrationError> {
        let body = self.render();
        registry
            .register_with(
                TileSpec::new(NOTES_TILE_ID)
                    .title("Notes")
                    .icon("📝")
                    .size("2x3"),
                |api| {
                    api.el().replace(body);
                    Ok(())
                },
            )
            .map(|_| ())
    }

    /// Handle a message envelope. Returns `true` if it was a note.
    pub fn accept(&mut self, registry: &mut TileRegistry, message: &Message) -> bool {
        if message.kind != NOTE_MESSAGE_TYPE {
            debug!(kind = %message.kind, "ignoring non-note message");
            return false;
        }
        self.push(registry, message.text_string());
        true
    }

    /// Prepend a note stamped with the current local time.
    pub fn push(&mut self, registry: &mut TileRegistry, text: impl Into<String>) {
        self.push_at(registry, Local::now(), text);
    }

    /// Prepend a note with an explicit timestamp.
    pub fn push_at(
        &mut self,
        registry: &mut TileRegistry,
        received_at: DateTime<Local>,
        text: impl Into<String>,
    ) {
        self.notes.insert(
            0,
            Note {
                received_at,
                text: text.into(),
            },
        );
        self.notes.truncate(MAX_NOTES);

        let body = self.render();
        match registry.body_mut(NOTES_TILE_ID) {
            Some(existing) => existing.replace(body),
            None => {
                let _ = self.mount(registry);
            }
        }
    }

    /// Notes, most recent first.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Body nodes for the notes tile.
    pub fn render(&self) -> Vec<Node> {
        let mut list = Element::div()
            .attr("id", "notes-list")
            .style("display:flex;flex-direction:column;gap:6px;");

        if self.notes.is_empty() {
            list = list.child(Element::div().class("muted").text(EMPTY_TEXT));
        } else {
            list.children_mut().extend(self.notes.iter().map(|note| {
                Element::div()
                    .class("note-item")
                    .style("font-family:monospace;font-size:12px;")
                    .text(note.display_line())
                    .into()
            }));
        }

        vec![list.into()]
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 5, 1, h, m, s)
            .earliest()
            .unwrap_or_else(Local::now)
    }

    #[test]
    fn mount_shows_placeholder() {
        let mut registry = TileRegistry::new();
        let board = NotesBoard::new();
        assert!(board.mount(&mut registry).is_ok());

        let tile = registry.get(NOTES_TILE_ID);
        assert_eq!(tile.map(|t| t.size().to_string()), Some("2x3".to_owned()));
        assert_eq!(tile.map(|t| t.body().text_content()), Some("No notes".to_owned()));
    }

    #[test]
    fn notes_are_prepended() {
        let mut registry = TileRegistry::new();
        let mut board = NotesBoard::new();
        let _ = board.mount(&mut registry);

        board.push_at(&mut registry, at(9, 0, 1), "first");
        board.push_at(&mut registry, at(9, 0, 2), "second");

        let html = registry
            .get(NOTES_TILE_ID)
            .map(|t| t.body().render())
            .unwrap_or_default();
        let second = html.find("[09:00:02] second");
        let first = html.find("[09:00:01] first");
        assert!(second.is_some() && first.is_some());
        assert!(second < first);
        assert!(!html.contains("No notes"));
    }

    #[test]
    fn history_is_capped() {
        let mut registry = TileRegistry::new();
        let mut board = NotesBoard::new();
        for i in 0..MAX_NOTES.saturating_add(5) {
            board.push(&mut registry, format!("n{i}"));
        }
        assert_eq!(board.notes().len(), MAX_NOTES);
        assert_eq!(
            board.notes().first().map(|n| n.text.as_str()),
            Some(format!("n{}", MAX_NOTES.saturating_add(4)).as_str())
        );
    }

    #[test]
    fn only_note_messages_are_accepted() {
        let mut registry = TileRegistry::new();
        let mut board = NotesBoard::new();

        let other = Message {
            kind: "score".to_owned(),
            text: serde_json::json!("3"),
        };
        assert!(!board.accept(&mut registry, &other));
        assert!(board.notes().is_empty());

        assert!(board.accept(&mut registry, &Message::note("hello")));
        assert_eq!(board.notes().first().map(|n| n.text.as_str()), Some("hello"));
        assert!(registry.contains(NOTES_TILE_ID));
    }

    #[test]
    fn envelope_uses_type_field() {
        let parsed = serde_json::from_str::<Message>(r#"{"type":"note","text":"hi"}"#);
        assert_eq!(parsed.ok(), Some(Message::note("hi")));
    }

    #[test]
    fn non_string_payload_is_stringified() {
        let mut registry = TileRegistry::new();
        let mut board = NotesBoard::new();
        let message = Message {
            kind: "note".to_owned(),
            text: serde_json::json!(42),
        };
        board.accept(&mut registry, &message);
        assert_eq!(board.notes().first().map(|n| n.text.as_str()), Some("42"));
    }

    #[test]
    fn note_text_is_escaped() {
        let mut registry = TileRegistry::new();
        let mut board = NotesBoard::new();
        board.push(&mut registry, "<b>x</b>");
        let html = registry
            .get(NOTES_TILE_ID)
            .map(|t| t.body().render())
            .unwrap_or_default();
        assert!(html.contains("&lt;b&gt;x&lt;/b&gt;"));
    }
}
