//! Session notifications.
//!
//! Observers register with [`SessionCoordinator::subscribe`](crate::SessionCoordinator::subscribe)
//! and receive a [`Subscription`], an endless stream of the events of one kind. The stream ends
//! only when the session is dropped.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::Stream;
use log::trace;
use mapsession_types::GeoPoint2d;

use crate::model::RouteStatus;
use crate::operation::OperationId;
use crate::session::SessionState;

/// Event published by a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The session moved to a new state.
    StateChanged(SessionState),
    /// The camera started or stopped following the device position.
    FollowingPositionChanged(bool),
    /// Progress of a running route calculation.
    RouteStatus {
        /// The route calculation operation.
        operation: OperationId,
        /// Reported status.
        status: RouteStatus,
    },
    /// The user tapped the map.
    MapTouched(GeoPoint2d),
    /// The highlight set was replaced. Contains the number of items now displayed.
    HighlightsChanged(usize),
}

/// Kind of [`SessionEvent`], used to subscribe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`SessionEvent::StateChanged`]
    StateChanged,
    /// [`SessionEvent::FollowingPositionChanged`]
    FollowingPositionChanged,
    /// [`SessionEvent::RouteStatus`]
    RouteStatus,
    /// [`SessionEvent::MapTouched`]
    MapTouched,
    /// [`SessionEvent::HighlightsChanged`]
    HighlightsChanged,
}

impl SessionEvent {
    /// Kind of the event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::StateChanged(_) => EventKind::StateChanged,
            Self::FollowingPositionChanged(_) => EventKind::FollowingPositionChanged,
            Self::RouteStatus { .. } => EventKind::RouteStatus,
            Self::MapTouched(_) => EventKind::MapTouched,
            Self::HighlightsChanged(_) => EventKind::HighlightsChanged,
        }
    }
}

/// Stream of session events of one kind.
pub struct Subscription {
    kind: EventKind,
    receiver: UnboundedReceiver<SessionEvent>,
}

impl Subscription {
    /// Kind of events delivered by this subscription.
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl Stream for Subscription {
    type Item = SessionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}

#[derive(Default)]
pub(crate) struct EventHub {
    subscribers: Vec<(EventKind, UnboundedSender<SessionEvent>)>,
}

impl EventHub {
    pub(crate) fn subscribe(&mut self, kind: EventKind) -> Subscription {
        let (sender, receiver) = unbounded();
        self.subscribers.push((kind, sender));
        Subscription { kind, receiver }
    }

    /// Sends the event to every subscriber of its kind. Subscribers that dropped their stream
    /// are forgotten.
    pub(crate) fn publish(&mut self, event: SessionEvent) {
        let kind = event.kind();
        trace!("Publishing {event:?}");
        self.subscribers.retain(|(subscribed, sender)| {
            if *subscribed != kind {
                return !sender.is_closed();
            }

            sender.unbounded_send(event.clone()).is_ok()
        });
    }
}

#[cfg(test)]
mod tests {
    use futures::{FutureExt, StreamExt};

    use super::*;

    #[test]
    fn delivers_only_subscribed_kind() {
        let mut hub = EventHub::default();
        let mut following = hub.subscribe(EventKind::FollowingPositionChanged);

        hub.publish(SessionEvent::HighlightsChanged(3));
        hub.publish(SessionEvent::FollowingPositionChanged(true));

        assert_eq!(
            following.next().now_or_never(),
            Some(Some(SessionEvent::FollowingPositionChanged(true)))
        );
        assert_eq!(following.next().now_or_never(), None);
    }

    #[test]
    fn dropped_subscriptions_are_forgotten() {
        let mut hub = EventHub::default();
        let subscription = hub.subscribe(EventKind::MapTouched);
        drop(subscription);

        hub.publish(SessionEvent::HighlightsChanged(0));
        assert!(hub.subscribers.is_empty());
    }

    #[test]
    fn stream_ends_when_hub_is_dropped() {
        let mut hub = EventHub::default();
        let mut subscription = hub.subscribe(EventKind::StateChanged);
        drop(hub);

        assert_eq!(subscription.next().now_or_never(), Some(None));
    }
}
