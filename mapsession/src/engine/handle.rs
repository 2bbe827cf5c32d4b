use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use lazy_static::lazy_static;
use log::{info, warn};
use parking_lot::RwLock;

use super::MapEngine;
use crate::error::InitError;

lazy_static! {
    static ref ENGINE: RwLock<Option<EngineHandle>> = RwLock::new(None);
}

/// Shared reference to an initialized engine. Cheap to clone.
#[derive(Clone)]
pub struct EngineHandle {
    engine: Arc<dyn MapEngine>,
}

impl EngineHandle {
    /// Wraps an engine without registering it as the process-wide engine.
    ///
    /// Use [`initialize`] in applications. This constructor is meant for hosts that manage the
    /// engine lifetime themselves and for tests.
    pub fn unmanaged(engine: impl MapEngine + 'static) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// The engine.
    pub fn engine(&self) -> &dyn MapEngine {
        &*self.engine
    }

    /// Returns true if both handles refer to the same engine instance.
    pub fn same_engine(&self, other: &EngineHandle) -> bool {
        Arc::ptr_eq(&self.engine, &other.engine)
    }
}

impl Debug for EngineHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle").finish_non_exhaustive()
    }
}

/// Initializes the process-wide engine with the given credential.
///
/// Must be called once, at process start, before any session is created. Later calls fail with
/// [`InitError::AlreadyInitialized`] until [`teardown`] is called.
pub fn initialize(
    token: &str,
    engine: impl MapEngine + 'static,
) -> Result<EngineHandle, InitError> {
    let mut slot = ENGINE.write();
    if slot.is_some() {
        warn!("Engine initialization requested twice");
        return Err(InitError::AlreadyInitialized);
    }

    if token.trim().is_empty() {
        return Err(InitError::EmptyToken);
    }

    engine.authorize(token).map_err(InitError::Rejected)?;

    let handle = EngineHandle::unmanaged(engine);
    *slot = Some(handle.clone());
    info!("Map engine initialized");

    Ok(handle)
}

/// The process-wide engine, if [`initialize`] succeeded.
pub fn handle() -> Option<EngineHandle> {
    ENGINE.read().clone()
}

/// Releases the process-wide engine. Sessions that still hold a handle keep the engine alive
/// until they are dropped. Returns false if no engine was initialized.
pub fn teardown() -> bool {
    let released = ENGINE.write().take().is_some();
    if released {
        info!("Map engine released");
    }

    released
}
