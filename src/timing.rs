//! Timer constants shared by both protocol variants.

use std::time::Duration;

/// Retransmission timeout for an unacknowledged frame.
pub const TIMEOUT: Duration = Duration::from_millis(50);

/// Quiescence window a closing socket waits out before releasing the port,
/// analogous to TCP's TIME_WAIT.
pub const TWAIT: Duration = Duration::from_millis(500);
