//! Reddit subscription management: listing and bulk unsubscribe.
//!
//! - **Listing**: follow the `after` cursor of `/subreddits/mine/subscriber`
//!   until exhausted, normalizing each child into a [`Subreddit`]
//! - **Unsubscribing**: one authenticated `POST /api/subscribe` per subreddit,
//!   batched into fixed-size concurrent chunks separated by a cooldown
//!
//! # Architecture
//!
//! - [`transport`] - The [`Transport`] boundary every call goes through
//!   (direct to the API, or via a relay)
//! - [`endpoints`] - URL and form-body builders
//! - [`lister`] - Paginated listing
//! - [`mutator`] - Single and batched unsubscribe with progress reporting
//! - [`selection`] - Filtering a listing down to the names to unsubscribe
//!
//! # Example
//!
//! ```ignore
//! use reddit_cleaner::reddit::*;
//!
//! let transport = DirectTransport::new(reqwest::Client::new());
//! let endpoints = Endpoints::new(DEFAULT_API_BASE)?;
//!
//! let subs = fetch_subscriptions(&transport, &endpoints, &token, DEFAULT_MAX_PAGES).await?;
//! let names = Selection::from_iter(filter_subreddits(&subs, "memes")).into_names();
//!
//! batch_unsubscribe(&transport, &endpoints, &token, &names, BatchOptions::default(), |p| {
//!     println!("{}/{}", p.processed, p.total);
//! })
//! .await?;
//! ```

pub mod endpoints;
pub mod lister;
pub mod mutator;
pub mod selection;
pub mod transport;
mod types;

pub use endpoints::{Endpoints, DEFAULT_API_BASE};
pub use lister::{fetch_subscriptions, FetchError, DEFAULT_MAX_PAGES};
pub use mutator::{batch_unsubscribe, unsubscribe, BatchOptions, MutateError};
pub use selection::{filter_subreddits, Selection};
pub use transport::{
    ApiRequest, DirectTransport, RelayTransport, Transport, TransportError, DEFAULT_USER_AGENT,
};
pub use types::{BatchProgress, Subreddit};
