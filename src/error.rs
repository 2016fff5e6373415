use thiserror::Error;

/// Fatal wiring mistakes. These indicate a programming error in route
/// registration or bootstrap order, never a runtime condition, so they are
/// surfaced loudly instead of being degraded like storage or network
/// failures.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("root mount not set for router")]
    RootNotSet,

    #[error("no route matched {path} and no not-found handler is registered")]
    NotFoundUnregistered { path: String },

    #[error("duplicate route registered for {path}")]
    DuplicateRoute { path: String },
}
