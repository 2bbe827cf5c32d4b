//! Mapsession is a session layer over a native map engine. It owns one rendering surface and
//! sequences the short-lived asynchronous work done against it: camera animations, landmark
//! searches, route calculations and highlight presentations.
//!
//! # Quick start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use mapsession::engine::{self, MapEngine};
//! use mapsession::operation::query::RouteRequest;
//! use mapsession::SessionBuilder;
//! use mapsession_types::latlon;
//!
//! # fn run(native_engine: impl MapEngine + 'static) -> anyhow::Result<()> {
//! engine::initialize("sdk-token", native_engine)?;
//!
//! let session = SessionBuilder::from_global()?.build()?;
//! session.start_render()?;
//!
//! let request = RouteRequest::new(vec![latlon!(45.65, 25.60), latlon!(44.43, 26.10)]);
//! session.calculate_route(request, |outcome| println!("{outcome:?}"))?;
//! # Ok(())
//! # }
//! ```
//!
//! # Main components
//!
//! * [`MapEngine`](engine::MapEngine) is the native engine doing the actual rendering, search
//!   and routing. It is initialized once per process with [`engine::initialize`].
//! * [`MapSurface`] is one native rendering context. It renders only while its host view is
//!   visible.
//! * [`SessionCoordinator`] owns a surface and is the only thing an application talks to. It
//!   makes sure that at most one camera animation runs at a time, that late search or routing
//!   results never overwrite newer ones, and that every completion callback is called exactly
//!   once.
//! * [`HighlightPresenter`](highlight::HighlightPresenter) keeps the single set of search
//!   results or routes drawn over the map.
//!
//! Session state changes and engine notifications are delivered as [`event::SessionEvent`]
//! streams.

mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod highlight;
pub mod location;
pub mod model;
pub mod operation;
mod session;
mod surface;

#[cfg(feature = "_tests")]
pub mod testing;

pub use config::SessionConfig;
pub use error::{EngineError, InitError, SessionError};
pub use mapsession_types;
pub use session::{SessionBuilder, SessionCoordinator, SessionState};
pub use surface::{MapSurface, RenderState};
