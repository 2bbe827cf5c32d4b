//! Owned native rendering surface.

use log::{debug, error, warn};

use crate::engine::{EngineHandle, SurfaceEventSink, SurfaceId};
use crate::error::SessionError;

/// Whether the engine renders into a surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RenderState {
    /// Nothing is rendered.
    Stopped,
    /// The engine renders frames into the surface.
    Rendering,
}

/// Handle to one native rendering context tied to a host view.
///
/// The surface is created stopped. The host starts rendering when its view becomes visible and
/// stops when it is hidden. Only these two calls touch display resources. Destroying a
/// rendering surface is a contract violation: rendering must be stopped first.
///
/// A surface that was not destroyed explicitly is stopped and destroyed when dropped.
#[derive(Debug)]
pub struct MapSurface {
    id: SurfaceId,
    engine: EngineHandle,
    render_state: RenderState,
    visible: bool,
    destroyed: bool,
}

impl MapSurface {
    /// Allocates a new surface in the engine.
    pub fn create(engine: &EngineHandle, events: SurfaceEventSink) -> Result<Self, SessionError> {
        let id = engine.engine().create_surface(events)?;
        debug!("Created {id}");

        Ok(Self {
            id,
            engine: engine.clone(),
            render_state: RenderState::Stopped,
            visible: false,
            destroyed: false,
        })
    }

    /// Engine id of the surface.
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Current render state.
    pub fn render_state(&self) -> RenderState {
        self.render_state
    }

    /// Whether the host view is visible.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the surface was destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Starts rendering. Does nothing if already rendering.
    pub fn start_render(&mut self) -> Result<(), SessionError> {
        self.ensure_alive()?;
        self.visible = true;
        if self.render_state == RenderState::Rendering {
            return Ok(());
        }

        self.engine.engine().start_render(self.id);
        self.render_state = RenderState::Rendering;
        debug!("{} is rendering", self.id);

        Ok(())
    }

    /// Stops rendering. Does nothing if already stopped.
    pub fn stop_render(&mut self) -> Result<(), SessionError> {
        self.ensure_alive()?;
        self.visible = false;
        if self.render_state == RenderState::Stopped {
            return Ok(());
        }

        self.engine.engine().stop_render(self.id);
        self.render_state = RenderState::Stopped;
        debug!("{} stopped rendering", self.id);

        Ok(())
    }

    /// Releases the surface. Fails without touching the surface if it is still rendering.
    pub fn destroy(&mut self) -> Result<(), SessionError> {
        self.ensure_alive()?;
        if self.render_state == RenderState::Rendering {
            error!("{} cannot be destroyed while rendering", self.id);
            return Err(SessionError::InvalidState(format!(
                "{} is destroyed while rendering",
                self.id
            )));
        }

        self.engine.engine().destroy_surface(self.id);
        self.destroyed = true;
        debug!("Destroyed {}", self.id);

        Ok(())
    }

    /// Fails with [`SessionError::InvalidState`] unless the surface is rendering.
    pub fn ensure_rendering(&self) -> Result<(), SessionError> {
        self.ensure_alive()?;
        if self.render_state != RenderState::Rendering {
            error!("Operation submitted while {} is not rendering", self.id);
            return Err(SessionError::InvalidState(format!(
                "{} is not rendering",
                self.id
            )));
        }

        Ok(())
    }

    pub(crate) fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    fn ensure_alive(&self) -> Result<(), SessionError> {
        if self.destroyed {
            return Err(SessionError::InvalidState(format!(
                "{} is destroyed",
                self.id
            )));
        }

        Ok(())
    }
}

impl Drop for MapSurface {
    fn drop(&mut self) {
        if self.destroyed {
            return;
        }

        warn!("{} dropped without being destroyed", self.id);
        let released = self.stop_render().and_then(|_| self.destroy());
        if let Err(err) = released {
            warn!("Failed to release {}: {err}", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;

    use super::*;
    use crate::testing::{EngineCall, ScriptedEngine};

    fn surface(engine: &ScriptedEngine) -> MapSurface {
        MapSurface::create(&EngineHandle::unmanaged(engine.clone()), Arc::new(|_| {}))
            .expect("scripted engine creates surfaces")
    }

    #[test]
    fn render_transitions_are_idempotent() {
        let engine = ScriptedEngine::new();
        let mut surface = surface(&engine);
        let id = surface.id();

        surface.start_render().expect("alive");
        surface.start_render().expect("alive");
        assert_eq!(surface.render_state(), RenderState::Rendering);
        assert!(surface.is_visible());

        surface.stop_render().expect("alive");
        surface.stop_render().expect("alive");
        assert_eq!(surface.render_state(), RenderState::Stopped);
        assert!(!surface.is_visible());

        let render_calls: Vec<_> = engine
            .calls()
            .into_iter()
            .filter(|call| matches!(call, EngineCall::StartRender(_) | EngineCall::StopRender(_)))
            .collect();
        assert_eq!(
            render_calls,
            vec![EngineCall::StartRender(id), EngineCall::StopRender(id)]
        );
    }

    #[test]
    fn destroy_while_rendering_fails() {
        let engine = ScriptedEngine::new();
        let mut surface = surface(&engine);
        surface.start_render().expect("alive");

        assert_matches!(surface.destroy(), Err(SessionError::InvalidState(_)));
        assert!(!surface.is_destroyed());
        assert!(engine.is_rendering(surface.id()));
    }

    #[test]
    fn stop_then_destroy_succeeds() {
        let engine = ScriptedEngine::new();
        let mut surface = surface(&engine);
        surface.start_render().expect("alive");

        surface.stop_render().expect("alive");
        surface.destroy().expect("stopped surface can be destroyed");

        assert!(engine.is_destroyed(surface.id()));
        assert_matches!(surface.start_render(), Err(SessionError::InvalidState(_)));
    }

    #[test]
    fn drop_releases_rendering_surface() {
        let engine = ScriptedEngine::new();
        let mut surface = surface(&engine);
        let id = surface.id();
        surface.start_render().expect("alive");

        drop(surface);

        assert!(!engine.is_rendering(id));
        assert!(engine.is_destroyed(id));
    }

    #[test]
    fn operations_require_rendering() {
        let engine = ScriptedEngine::new();
        let mut surface = surface(&engine);

        assert_matches!(surface.ensure_rendering(), Err(SessionError::InvalidState(_)));
        surface.start_render().expect("alive");
        assert!(surface.ensure_rendering().is_ok());
    }
}
