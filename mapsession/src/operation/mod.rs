//! Bookkeeping of in-flight engine operations.
//!
//! Every request a session sends to the engine is represented by an operation with a unique,
//! monotonically increasing [`OperationId`]. The id doubles as the submission sequence number:
//! an operation with a greater id was submitted later.
//!
//! Operations belong to one of two families:
//! * [animated operations](animated) that move the camera. All of them share a single camera
//!   channel per surface, and a new submission cancels the running one.
//! * [query operations](query) (search and route calculation) that run independently of the
//!   camera and of each other.
//!
//! Each submitted operation reports its result exactly once through its completion callback.

use std::fmt::{Display, Formatter};

use web_time::Instant;

use crate::error::SessionError;

pub mod animated;
pub mod query;

pub use animated::AnimationKind;
pub use query::QueryKind;

/// Identifier and submission sequence number of an operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(u64);

impl OperationId {
    /// Creates an id from its raw value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value of the id.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Display for OperationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Source of operation ids for one session.
#[derive(Debug, Default)]
pub(crate) struct OperationSequence {
    last: u64,
}

impl OperationSequence {
    pub(crate) fn next_id(&mut self) -> OperationId {
        self.last += 1;
        OperationId(self.last)
    }
}

/// Kind of an operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Camera channel operation.
    Animated(AnimationKind),
    /// Search or route calculation.
    Query(QueryKind),
}

/// Handle of a submitted operation.
///
/// The handle can be given to [`SessionCoordinator::cancel`](crate::SessionCoordinator::cancel)
/// to cancel the operation before it completes.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationHandle {
    id: OperationId,
    kind: OperationKind,
    started_at: Instant,
}

impl OperationHandle {
    pub(crate) fn new(id: OperationId, kind: OperationKind) -> Self {
        Self {
            id,
            kind,
            started_at: Instant::now(),
        }
    }

    /// Id of the operation.
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Kind of the operation.
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Moment the operation was submitted.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

/// Result of a camera channel operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    /// The camera reached its target.
    Succeeded,
    /// Superseded by a newer camera operation, explicitly cancelled, or the surface stopped
    /// rendering.
    Cancelled,
    /// The engine or the environment refused the operation.
    Failed(SessionError),
}

impl OperationOutcome {
    /// Converts the outcome into a result, mapping cancellation to [`SessionError::Cancelled`].
    pub fn into_result(self) -> Result<(), SessionError> {
        match self {
            Self::Succeeded => Ok(()),
            Self::Cancelled => Err(SessionError::Cancelled),
            Self::Failed(err) => Err(err),
        }
    }
}

/// Result of a query operation.
///
/// An empty `Completed` list is a successful query that found nothing. It is not the same as
/// `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome<T> {
    /// The query completed and its results were applied.
    Completed(Vec<T>),
    /// Superseded by a newer query, explicitly cancelled, or the surface stopped rendering.
    Cancelled,
    /// The backend returned an error.
    Failed(SessionError),
}

impl<T> QueryOutcome<T> {
    /// Converts the outcome into a result, mapping cancellation to [`SessionError::Cancelled`].
    pub fn into_result(self) -> Result<Vec<T>, SessionError> {
        match self {
            Self::Completed(items) => Ok(items),
            Self::Cancelled => Err(SessionError::Cancelled),
            Self::Failed(err) => Err(err),
        }
    }
}

/// Completion callback of a camera channel operation.
pub type CompletionCallback = Box<dyn FnOnce(OperationOutcome) + Send>;
