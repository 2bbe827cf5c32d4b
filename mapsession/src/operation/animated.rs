//! Camera channel: duration-bearing operations that move the camera of a surface.

use std::time::Duration;

use log::debug;

use super::{CompletionCallback, OperationHandle, OperationId, OperationOutcome};

/// Kind of a camera channel operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AnimationKind {
    /// Move the camera to a position and zoom level.
    CenterOn,
    /// Switch between 2D and 3D perspective.
    SetPerspective,
    /// Rotate the map so that north points up.
    AlignNorth,
    /// Start tracking the device position.
    FollowPosition,
    /// Fit the camera to presented routes.
    PresentRoutes,
}

/// A camera operation that is currently running.
pub(crate) struct AnimatedOperation {
    handle: OperationHandle,
    duration_hint: Duration,
    on_complete: CompletionCallback,
}

impl AnimatedOperation {
    pub(crate) fn new(
        handle: OperationHandle,
        duration_hint: Duration,
        on_complete: CompletionCallback,
    ) -> Self {
        Self {
            handle,
            duration_hint,
            on_complete,
        }
    }

    pub(crate) fn handle(&self) -> &OperationHandle {
        &self.handle
    }

    pub(crate) fn kind(&self) -> Option<AnimationKind> {
        match self.handle.kind() {
            super::OperationKind::Animated(kind) => Some(kind),
            super::OperationKind::Query(_) => None,
        }
    }

    /// Consumes the operation and fires its callback. Must be called without any session lock
    /// held, the callback may call back into the session.
    pub(crate) fn complete(self, outcome: OperationOutcome) {
        debug!(
            "Camera operation {} ({:?}, {:?}) finished: {:?}",
            self.handle.id(),
            self.kind(),
            self.duration_hint,
            outcome
        );
        (self.on_complete)(outcome)
    }
}

/// The single camera lane of a surface. Holds at most one running operation.
#[derive(Default)]
pub(crate) struct CameraChannel {
    current: Option<AnimatedOperation>,
}

impl CameraChannel {
    /// Makes `operation` the running one. Returns the operation it supersedes, which the caller
    /// must complete with [`OperationOutcome::Cancelled`].
    pub(crate) fn begin(&mut self, operation: AnimatedOperation) -> Option<AnimatedOperation> {
        self.current.replace(operation)
    }

    /// Removes the running operation if it has the given id. Completions of superseded
    /// operations do not match and return `None`.
    pub(crate) fn finish(&mut self, id: OperationId) -> Option<AnimatedOperation> {
        if self.current.as_ref().map(|op| op.handle.id()) == Some(id) {
            self.current.take()
        } else {
            None
        }
    }

    /// Removes the running operation regardless of its id.
    pub(crate) fn take(&mut self) -> Option<AnimatedOperation> {
        self.current.take()
    }

    pub(crate) fn current(&self) -> Option<&OperationHandle> {
        self.current.as_ref().map(|op| &op.handle)
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::operation::OperationKind;

    fn operation(
        id: u64,
        log: &Arc<Mutex<Vec<(u64, OperationOutcome)>>>,
    ) -> AnimatedOperation {
        let log = log.clone();
        AnimatedOperation::new(
            OperationHandle::new(
                OperationId::new(id),
                OperationKind::Animated(AnimationKind::SetPerspective),
            ),
            Duration::from_millis(100),
            Box::new(move |outcome| log.lock().push((id, outcome))),
        )
    }

    #[test]
    fn begin_returns_superseded_operation() {
        let log = Arc::new(Mutex::new(vec![]));
        let mut channel = CameraChannel::default();

        assert!(channel.begin(operation(1, &log)).is_none());
        let superseded = channel.begin(operation(2, &log)).expect("first is running");
        assert_eq!(superseded.handle().id(), OperationId::new(1));
        superseded.complete(OperationOutcome::Cancelled);

        assert_eq!(channel.current().map(|h| h.id()), Some(OperationId::new(2)));
        assert_eq!(*log.lock(), vec![(1, OperationOutcome::Cancelled)]);
    }

    #[test]
    fn finish_ignores_stale_ids() {
        let log = Arc::new(Mutex::new(vec![]));
        let mut channel = CameraChannel::default();
        channel.begin(operation(1, &log));
        channel.begin(operation(2, &log));

        assert!(channel.finish(OperationId::new(1)).is_none());
        assert!(channel.is_busy());

        channel
            .finish(OperationId::new(2))
            .expect("current operation")
            .complete(OperationOutcome::Succeeded);
        assert!(!channel.is_busy());
        assert_eq!(*log.lock(), vec![(2, OperationOutcome::Succeeded)]);
    }
}
