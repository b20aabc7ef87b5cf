//! In-memory tile registry.
//!
//! The registry maps tile identifiers to [`Tile`]s and remembers the
//! order in which they were registered; the rendered grid follows that
//! order.
//!
//! Registration is create-only. Registering an id that already exists
//! returns a handle to the existing tile and does **not** run the mount
//! callback again, so it cannot be used to refresh content. Callers that
//! refresh a tile look its body up with [`TileRegistry::body_mut`] and
//! rewrite it directly.

use std::collections::HashMap;

use tracing::{debug, error};

use crate::error::{MountError, RegistrationError};
use crate::markup::Element;
use crate::tile::{Body, Tile, TileApi, TileSpec};

/// Result of a registration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileHandle {
    id: String,
    created: bool,
}

impl TileHandle {
    /// Identifier of the tile.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// `true` if this call created the tile, `false` if it already
    /// existed.
    pub const fn was_created(&self) -> bool {
        self.created
    }
}

/// Identifier-keyed tile store with stable registration order.
#[derive(Debug, Clone, Default)]
pub struct TileRegistry {
    tiles: Vec<Tile>,
    index: HashMap<String, usize>,
}

impl TileRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tile without a mount callback. Its body keeps the
    /// placeholder until someone writes to it.
    pub fn register(&mut self, spec: TileSpec) -> Result<TileHandle, RegistrationError> {
        self.insert(spec, None::<fn(&mut TileApi<'_>) -> Result<(), MountError>>)
    }

    /// Register a tile and fill it with `mount`.
    ///
    /// `mount` runs synchronously, only when the tile is created. If it
    /// fails the error is logged and the tile keeps whatever body the
    /// callback left behind.
    pub fn register_with<F>(
        &mut self,
        spec: TileSpec,
        mount: F,
    ) -> Result<TileHandle, RegistrationError>
    where
        F: FnOnce(&mut TileApi<'_>) -> Result<(), MountError>,
    {
        self.insert(spec, Some(mount))
    }

    fn insert<F>(
        &mut self,
        spec: TileSpec,
        mount: Option<F>,
    ) -> Result<TileHandle, RegistrationError>
    where
        F: FnOnce(&mut TileApi<'_>) -> Result<(), MountError>,
    {
        if spec.id.trim().is_empty() {
            return Err(RegistrationError::MissingId);
        }

        if self.index.contains_key(&spec.id) {
            debug!(tile_id = %spec.id, "tile already registered, mount skipped");
            return Ok(TileHandle {
                id: spec.id,
                created: false,
            });
        }

        let id = spec.id.clone();
        let mut tile = Tile::from_spec(spec);

        if let Some(mount) = mount {
            let mut api = TileApi::new(tile.body_mut());
            if let Err(e) = mount(&mut api) {
                error!(tile_id = %id, error = %e, "tile mount failed");
            }
        }

        self.index.insert(id.clone(), self.tiles.len());
        self.tiles.push(tile);
        debug!(tile_id = %id, "tile registered");

        Ok(TileHandle { id, created: true })
    }

    /// Whether a tile with `id` exists.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Look up a tile.
    pub fn get(&self, id: &str) -> Option<&Tile> {
        self.index.get(id).and_then(|&i| self.tiles.get(i))
    }

    /// Mutable access to a tile's body, for refreshing its content.
    pub fn body_mut(&mut self, id: &str) -> Option<&mut Body> {
        let i = *self.index.get(id)?;
        self.tiles.get_mut(i).map(Tile::body_mut)
    }

    /// Tiles in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Number of tiles.
    pub const fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the registry is empty.
    pub const fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// The grid container holding every tile, in registration order.
    pub fn to_element(&self) -> Element {
        let mut grid = Element::new("main")
            .attr("id", "dashboard")
            .class("grid")
            .attr("role", "grid");
        grid.children_mut()
            .extend(self.tiles.iter().map(|t| t.to_element().into()));
        grid
    }

    /// Rendered HTML of the grid.
    pub fn render_html(&self) -> String {
        self.to_element().render()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::markup::Element;

    #[test]
    fn missing_id_is_rejected() {
        let mut registry = TileRegistry::new();
        assert_eq!(
            registry.register(TileSpec::new("")),
            Err(RegistrationError::MissingId)
        );
        assert_eq!(
            registry.register(TileSpec::new("   ")),
            Err(RegistrationError::MissingId)
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn registration_is_idempotent() {
        let mut registry = TileRegistry::new();
        let calls = Cell::new(0_u32);

        let first = registry.register_with(TileSpec::new("a").title("First"), |api| {
            calls.set(calls.get().saturating_add(1));
            api.set_value("one");
            Ok(())
        });
        let second = registry.register_with(TileSpec::new("a").title("Second"), |api| {
            calls.set(calls.get().saturating_add(1));
            api.set_value("two");
            Ok(())
        });

        assert_eq!(first.map(|h| h.was_created()), Ok(true));
        assert_eq!(second.map(|h| h.was_created()), Ok(false));
        assert_eq!(calls.get(), 1);
        assert_eq!(registry.len(), 1);

        let tile = registry.get("a");
        assert_eq!(tile.map(Tile::title), Some("First"));
        assert_eq!(tile.map(|t| t.body().text_content()), Some("one".to_owned()));
        assert_eq!(registry.render_html().matches("id=\"a\"").count(), 1);
    }

    #[test]
    fn mount_failure_keeps_tile() {
        let mut registry = TileRegistry::new();
        let handle = registry.register_with(TileSpec::new("broken"), |_| {
            Err(MountError::new("boom"))
        });
        assert!(handle.is_ok());
        assert!(registry.contains("broken"));
        assert!(registry.get("broken").is_some_and(|t| t.body().is_placeholder()));
    }

    #[test]
    fn mount_failure_keeps_partial_content() {
        let mut registry = TileRegistry::new();
        let _ = registry.register_with(TileSpec::new("partial"), |api| {
            api.set_value("half");
            Err(MountError::new("late failure"))
        });
        assert_eq!(
            registry.get("partial").map(|t| t.body().text_content()),
            Some("half".to_owned())
        );
    }

    #[test]
    fn body_mut_updates_without_remount() {
        let mut registry = TileRegistry::new();
        let _ = registry.register(TileSpec::new("s"));
        if let Some(body) = registry.body_mut("s") {
            body.set(Element::div().class("value").text("9 C"));
        }
        assert_eq!(
            registry.get("s").map(|t| t.body().render()),
            Some(r#"<div class="value">9 C</div>"#.to_owned())
        );
        assert!(registry.body_mut("missing").is_none());
    }

    #[test]
    fn order_follows_registration() {
        let mut registry = TileRegistry::new();
        for id in ["c", "a", "b"] {
            let _ = registry.register(TileSpec::new(id));
        }
        let _ = registry.register(TileSpec::new("a"));
        let ids: Vec<&str> = registry.iter().map(Tile::id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn size_normalized_on_registration() {
        let mut registry = TileRegistry::new();
        let _ = registry.register(TileSpec::new("big").size("2x3"));
        let _ = registry.register(TileSpec::new("odd").size("10x"));
        assert_eq!(registry.get("big").map(|t| t.size().to_string()), Some("2x3".to_owned()));
        assert_eq!(registry.get("odd").map(|t| t.size().to_string()), Some("1x1".to_owned()));
    }

    #[test]
    fn grid_container_attributes() {
        let registry = TileRegistry::new();
        assert_eq!(
            registry.render_html(),
            r#"<main id="dashboard" class="grid" role="grid"></main>"#
        );
    }
}
