//! The dashboard as a whole: tile registry plus notes history.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::warn;

use crate::notes::{Message, NotesBoard};
use crate::registry::TileRegistry;
use crate::tile::Tile;

/// Dashboard shared between the refresh task and the HTTP handlers.
pub type SharedDashboard = Arc<RwLock<Dashboard>>;

/// Everything the page shows.
#[derive(Debug, Clone)]
pub struct Dashboard {
    tiles: TileRegistry,
    notes: NotesBoard,
}

/// Serializable summary of one tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileSummary {
    /// Tile identifier.
    pub id: String,
    /// Header title.
    pub title: String,
    /// Header glyph.
    pub icon: String,
    /// Grid span, `<cols>x<rows>`.
    pub size: String,
    /// Rendered body HTML.
    pub body_html: String,
}

impl From<&Tile> for TileSummary {
    fn from(tile: &Tile) -> Self {
        Self {
            id: tile.id().to_owned(),
            title: tile.title().to_owned(),
            icon: tile.icon().to_owned(),
            size: tile.size().to_string(),
            body_html: tile.body().render(),
        }
    }
}

impl Dashboard {
    /// Dashboard holding only the empty notes tile.
    pub fn new() -> Self {
        let mut tiles = TileRegistry::new();
        let notes = NotesBoard::new();
        if let Err(e) = notes.mount(&mut tiles) {
            warn!(error = %e, "notes tile not mounted");
        }
        Self { tiles, notes }
    }

    /// Wrap in the shared handle.
    pub fn into_shared(self) -> SharedDashboard {
        Arc::new(RwLock::new(self))
    }

    /// Tile registry.
    pub const fn tiles(&self) -> &TileRegistry {
        &self.tiles
    }

    /// Mutable tile registry.
    pub const fn tiles_mut(&mut self) -> &mut TileRegistry {
        &mut self.tiles
    }

    /// Notes history.
    pub const fn notes(&self) -> &NotesBoard {
        &self.notes
    }

    /// Deliver a cross-frame message. Returns `true` if it was handled.
    pub fn post_message(&mut self, message: &Message) -> bool {
        self.notes.accept(&mut self.tiles, message)
    }

    /// One summary per tile, in grid order.
    pub fn summaries(&self) -> Vec<TileSummary> {
        self.tiles.iter().map(TileSummary::from).collect()
    }

    /// Rendered grid HTML.
    pub fn render_grid(&self) -> String {
        self.tiles.render_html()
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}
