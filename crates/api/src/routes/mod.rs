//! HTTP route handlers.

pub mod badges;
pub mod businesses;
pub mod events;
pub mod health;
pub mod metrics;
pub mod newsletters;

use common::CancellationToken;

/// A fresh token per request. A dropped request future is never polled
/// again, so nothing else needs to observe disconnects.
fn request_token() -> CancellationToken {
    CancellationToken::new()
}
