use serde::{Deserialize, Serialize};

// ============================================================================
// Domain Types
// ============================================================================

/// A subscribed community as returned by the listing endpoint.
///
/// Produced only by [`fetch_subscriptions`](super::fetch_subscriptions) and
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subreddit {
    /// Stable fullname (`t5_xxxxx`)
    pub id: String,
    /// Name without the `r/` prefix, used as the unsubscribe target
    pub display_name: String,
    pub subscribers: u64,
    pub description: String,
    /// Icon URL, empty when the community has none
    pub icon_url: String,
}

/// Cumulative progress of a batch job, emitted after every settled chunk.
///
/// Invariant: `processed <= total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub processed: usize,
    pub total: usize,
}

impl BatchProgress {
    /// Completion percentage in `0..=100`. An empty job counts as complete.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.processed * 100) / self.total).min(100) as u8
    }
}

// ============================================================================
// Wire Types
// ============================================================================

/// Envelope of `GET /subreddits/mine/subscriber`.
#[derive(Debug, Deserialize)]
pub(crate) struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingData {
    #[serde(default)]
    pub children: Vec<ListingChild>,
    #[serde(default)]
    pub after: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingChild {
    pub data: RawSubreddit,
}

/// Untrusted subreddit payload. Everything is optional here; required fields
/// are checked when converting to [`Subreddit`].
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawSubreddit {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub subscribers: Option<u64>,
    pub public_description: Option<String>,
    pub icon_img: Option<String>,
    pub community_icon: Option<String>,
}

impl RawSubreddit {
    /// Convert to a [`Subreddit`], returning the name of the first missing
    /// required field on failure.
    pub(crate) fn into_subreddit(self) -> Result<Subreddit, &'static str> {
        let id = self.name.filter(|s| !s.is_empty()).ok_or("name")?;
        let display_name = self
            .display_name
            .filter(|s| !s.is_empty())
            .ok_or("display_name")?;

        let icon = match self.icon_img {
            Some(icon) if !icon.is_empty() => icon,
            _ => self.community_icon.unwrap_or_default(),
        };

        Ok(Subreddit {
            id,
            display_name,
            subscribers: self.subscribers.unwrap_or(0),
            description: self.public_description.unwrap_or_default(),
            // community_icon comes back HTML-escaped
            icon_url: icon.replace("&amp;", "&"),
        })
    }
}
