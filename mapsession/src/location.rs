//! Device location permission, consumed by the follow-position feature.

/// Authorization state of the device location service.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Authorization {
    /// The user was not asked yet.
    NotDetermined,
    /// The user refused access.
    Denied,
    /// Access is blocked by a policy the user cannot change.
    Restricted,
    /// Access is granted.
    Authorized,
}

impl Authorization {
    /// True if location updates can be used.
    pub fn is_granted(self) -> bool {
        self == Self::Authorized
    }
}

/// Callback receiving the answer to an authorization request.
pub type AuthorizationCallback = Box<dyn FnOnce(Authorization) + Send>;

/// Device location service as seen by a session.
///
/// The stream of location updates itself is consumed by the native engine. The session only
/// needs to know whether it is allowed to start following the position.
pub trait LocationProvider: Send + Sync {
    /// Current authorization state.
    fn authorization(&self) -> Authorization;

    /// Asks the user for access. `done` is called exactly once with the resulting state.
    fn request_authorization(&self, done: AuthorizationCallback);
}
