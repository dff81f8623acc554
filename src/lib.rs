//! Bulk-unsubscribe from Reddit communities.
//!
//! [`reddit`] lists a user's subscriptions and unsubscribes from a selection
//! of them in rate-limited batches; [`relay`] is an optional server-side hop
//! that attaches credentials to API calls on the caller's behalf.

pub mod config;
pub mod reddit;
pub mod relay;
pub mod util;
