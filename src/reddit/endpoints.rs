use url::Url;

/// Default OAuth API host.
pub const DEFAULT_API_BASE: &str = "https://oauth.reddit.com";

/// Page size requested from the listing endpoint (API maximum).
pub const PAGE_LIMIT: u32 = 100;

/// URL builders for the two API calls the cleaner makes.
///
/// The base is configurable so tests (and alternate deployments) can point
/// at a mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base: &str) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(base)?;
        // Url::join drops the last path segment unless it ends with '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    /// `GET /subreddits/mine/subscriber?limit=100[&after=<cursor>]`
    pub fn subscriptions_page(&self, after: Option<&str>) -> Url {
        let mut url = self.join("subreddits/mine/subscriber");
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &PAGE_LIMIT.to_string());
            if let Some(cursor) = after {
                query.append_pair("after", cursor);
            }
        }
        url
    }

    /// `POST /api/subscribe`
    pub fn subscribe(&self) -> Url {
        self.join("api/subscribe")
    }

    fn join(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(&format!("{}{}", self.base.path(), path));
        url
    }
}

/// Form body for unsubscribing from a single community.
pub fn unsubscribe_form(display_name: &str) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("action", "unsub")
        .append_pair("sr_name", display_name)
        .finish()
}
