use std::sync::{Arc, Weak};

use log::debug;
use parking_lot::Mutex;

use super::shared::Shared;
use super::SessionCoordinator;
use crate::config::SessionConfig;
use crate::engine::{self, EngineHandle, SurfaceEventSink};
use crate::error::SessionError;
use crate::location::LocationProvider;
use crate::surface::MapSurface;

/// Creates a [`SessionCoordinator`] together with the surface it owns.
///
/// ```no_run
/// use mapsession::{SessionBuilder, SessionConfig};
///
/// # fn run() -> Result<(), mapsession::error::SessionError> {
/// let session = SessionBuilder::from_global()?
///     .with_config(SessionConfig::default().with_default_max_matches(20))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    engine: EngineHandle,
    config: SessionConfig,
    location: Option<Arc<dyn LocationProvider>>,
}

impl SessionBuilder {
    /// Starts building a session on the given engine.
    pub fn new(engine: EngineHandle) -> Self {
        Self {
            engine,
            config: SessionConfig::default(),
            location: None,
        }
    }

    /// Starts building a session on the process-wide engine.
    ///
    /// Fails with [`SessionError::InvalidState`] if [`engine::initialize`] was not called.
    pub fn from_global() -> Result<Self, SessionError> {
        engine::handle()
            .map(Self::new)
            .ok_or_else(|| SessionError::InvalidState("engine is not initialized".into()))
    }

    /// Sets the session configuration.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the location service consulted before following the device position. Without one,
    /// location access is assumed to be granted.
    pub fn with_location_provider(mut self, provider: impl LocationProvider + 'static) -> Self {
        self.location = Some(Arc::new(provider));
        self
    }

    /// Creates the surface and the session owning it. The surface is not rendering yet.
    pub fn build(self) -> Result<SessionCoordinator, SessionError> {
        let SessionBuilder {
            engine,
            config,
            location,
        } = self;

        let target: Arc<Mutex<Weak<Shared>>> = Arc::new(Mutex::new(Weak::new()));
        let sink_target = target.clone();
        let sink: SurfaceEventSink = Arc::new(move |event| {
            let shared = sink_target.lock().upgrade();
            match shared {
                Some(shared) => shared.handle_surface_event(event),
                None => debug!("Dropping surface event {event:?}, no session is attached"),
            }
        });

        let surface = MapSurface::create(&engine, sink)?;
        let shared = Arc::new(Shared::new(surface, config, location));
        *target.lock() = Arc::downgrade(&shared);

        Ok(SessionCoordinator { shared })
    }
}
