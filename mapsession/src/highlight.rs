//! The highlight set of a surface: search results or routes drawn over the map.

use log::{debug, trace};
use mapsession_types::Color;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::engine::{MapEngine, SurfaceId};
use crate::model::{Landmark, Route};
use crate::operation::OperationId;

/// An item of a highlight set.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Highlight {
    /// A search result.
    Landmark(Landmark),
    /// A calculated route.
    Route(Route),
}

/// Appearance of a highlight set. Applied uniformly to every item of the set.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HighlightRenderSettings {
    /// Size of the label text in points.
    pub text_size: f32,
    /// Size of the landmark icon in points.
    pub image_size: f32,
    /// Color of the route line or the landmark marker.
    pub color: Color,
    /// Whether labels are drawn next to the items.
    pub show_labels: bool,
}

impl Default for HighlightRenderSettings {
    fn default() -> Self {
        Self {
            text_size: 12.0,
            image_size: 24.0,
            color: Color::rgba(0x1E, 0x88, 0xE5, 0xFF),
            show_labels: true,
        }
    }
}

impl HighlightRenderSettings {
    /// Sets the label text size.
    pub fn with_text_size(mut self, size: f32) -> Self {
        self.text_size = size;
        self
    }

    /// Sets the icon size.
    pub fn with_image_size(mut self, size: f32) -> Self {
        self.image_size = size;
        self
    }

    /// Sets the color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Sets whether labels are drawn.
    pub fn with_labels(mut self, show: bool) -> Self {
        self.show_labels = show;
        self
    }
}

/// Engine-side identifier of a drawn highlight set.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HighlightId(u64);

impl HighlightId {
    /// Raw value of the id.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Result of [`HighlightPresenter::present`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PresentResult {
    /// The previous set was cleared and the new one drawn.
    Applied,
    /// The set and settings are identical to the displayed ones, nothing was done.
    Unchanged,
    /// A newer owner already presented its set, the request was dropped.
    Outdated,
}

struct DisplayedSet {
    id: HighlightId,
    items: Vec<Highlight>,
    settings: HighlightRenderSettings,
}

/// Owner of the single highlight set of a surface.
///
/// Each presentation is tagged with the id of the operation that produced it. A presentation
/// from an older operation than the one currently displayed is rejected, so results that arrive
/// out of order never overwrite newer ones.
pub struct HighlightPresenter {
    surface: SurfaceId,
    owner: Option<OperationId>,
    current: Option<DisplayedSet>,
    last_id: u64,
}

impl HighlightPresenter {
    /// Creates an empty presenter for the surface.
    pub fn new(surface: SurfaceId) -> Self {
        Self {
            surface,
            owner: None,
            current: None,
            last_id: 0,
        }
    }

    /// Replaces the displayed set. The previous set is cleared before the new one is drawn.
    pub fn present(
        &mut self,
        engine: &dyn MapEngine,
        owner: OperationId,
        items: Vec<Highlight>,
        settings: &HighlightRenderSettings,
    ) -> PresentResult {
        if self.owner.is_some_and(|current| current > owner) {
            debug!(
                "Highlights from {owner} are outdated, {:?} is displayed",
                self.owner
            );
            return PresentResult::Outdated;
        }

        self.owner = Some(owner);

        let is_same = match &self.current {
            Some(current) => current.items == items && current.settings == *settings,
            None => items.is_empty(),
        };
        if is_same {
            trace!("Highlight set of {owner} is unchanged");
            return PresentResult::Unchanged;
        }

        self.clear_displayed(engine);

        if !items.is_empty() {
            self.last_id += 1;
            let id = HighlightId(self.last_id);
            engine.draw_highlights(self.surface, id, &items, settings);
            debug!("Drew {} highlights as {id:?} for {owner}", items.len());
            self.current = Some(DisplayedSet {
                id,
                items,
                settings: *settings,
            });
        }

        PresentResult::Applied
    }

    /// Removes the displayed set.
    pub fn clear(&mut self, engine: &dyn MapEngine, owner: OperationId) -> PresentResult {
        self.present(engine, owner, vec![], &HighlightRenderSettings::default())
    }

    /// Currently displayed items.
    pub fn current(&self) -> &[Highlight] {
        self.current
            .as_ref()
            .map(|set| &set.items[..])
            .unwrap_or(&[])
    }

    pub(crate) fn clear_displayed(&mut self, engine: &dyn MapEngine) {
        if let Some(displayed) = self.current.take() {
            engine.clear_highlights(self.surface, displayed.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use mapsession_types::latlon;

    use super::*;
    use crate::testing::ScriptedEngine;

    fn landmark(name: &str) -> Highlight {
        Highlight::Landmark(Landmark::new(name, latlon!(45.0, 25.0)))
    }

    fn presenter(engine: &ScriptedEngine) -> HighlightPresenter {
        let surface = engine
            .create_surface(std::sync::Arc::new(|_| {}))
            .expect("scripted engine always creates surfaces");
        HighlightPresenter::new(surface)
    }

    #[test]
    fn empty_then_full_set_leaves_only_the_full_set() {
        let engine = ScriptedEngine::new();
        let mut presenter = presenter(&engine);
        let settings = HighlightRenderSettings::default();

        presenter.present(&engine, OperationId::new(1), vec![], &settings);
        presenter.present(
            &engine,
            OperationId::new(2),
            vec![landmark("A"), landmark("B")],
            &settings,
        );

        assert_eq!(presenter.current(), &[landmark("A"), landmark("B")]);
        assert_eq!(
            engine.visible_highlights(presenter.surface),
            vec![landmark("A"), landmark("B")]
        );
    }

    #[test]
    fn identical_presentation_does_not_grow_resources() {
        let engine = ScriptedEngine::new();
        let mut presenter = presenter(&engine);
        let settings = HighlightRenderSettings::default();

        let first = presenter.present(&engine, OperationId::new(1), vec![landmark("A")], &settings);
        let second =
            presenter.present(&engine, OperationId::new(2), vec![landmark("A")], &settings);

        assert_eq!(first, PresentResult::Applied);
        assert_eq!(second, PresentResult::Unchanged);
        assert_eq!(engine.highlight_overlay_count(presenter.surface), 1);
        assert_eq!(engine.draw_highlight_calls(), 1);
    }

    #[test]
    fn new_set_replaces_previous_one() {
        let engine = ScriptedEngine::new();
        let mut presenter = presenter(&engine);
        let settings = HighlightRenderSettings::default();

        presenter.present(&engine, OperationId::new(1), vec![landmark("A")], &settings);
        presenter.present(&engine, OperationId::new(2), vec![landmark("B")], &settings);

        assert_eq!(engine.visible_highlights(presenter.surface), vec![landmark("B")]);
        assert_eq!(engine.highlight_overlay_count(presenter.surface), 1);
    }

    #[test]
    fn older_owner_is_rejected() {
        let engine = ScriptedEngine::new();
        let mut presenter = presenter(&engine);
        let settings = HighlightRenderSettings::default();

        presenter.present(&engine, OperationId::new(5), vec![landmark("new")], &settings);
        let result = presenter.present(&engine, OperationId::new(3), vec![landmark("old")], &settings);

        assert_eq!(result, PresentResult::Outdated);
        assert_eq!(engine.visible_highlights(presenter.surface), vec![landmark("new")]);
    }

    #[test]
    fn changed_settings_redraw_the_set() {
        let engine = ScriptedEngine::new();
        let mut presenter = presenter(&engine);
        let settings = HighlightRenderSettings::default();

        presenter.present(&engine, OperationId::new(1), vec![landmark("A")], &settings);
        let result = presenter.present(
            &engine,
            OperationId::new(2),
            vec![landmark("A")],
            &settings.with_color(Color::RED),
        );

        assert_eq!(result, PresentResult::Applied);
        assert_eq!(engine.highlight_overlay_count(presenter.surface), 1);
        assert_eq!(engine.draw_highlight_calls(), 2);
    }
}
