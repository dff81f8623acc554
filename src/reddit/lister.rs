use super::endpoints::Endpoints;
use super::transport::{ApiRequest, Transport, TransportError};
use super::types::{Listing, Subreddit};
use secrecy::SecretString;
use thiserror::Error;

/// Default ceiling on listing pages (100 subreddits each).
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// Errors that can occur while listing subscriptions.
///
/// No partial listing is ever returned alongside an error.
#[derive(Debug, Error)]
pub enum FetchError {
    /// A page request failed (transport failure or non-2xx status)
    #[error("Failed to fetch subreddits: {0}")]
    Transport(#[from] TransportError),
    /// The listing body was malformed or lacked a required field
    #[error("Parse error: {0}")]
    Parse(String),
    /// The remote cursor was still set after the page ceiling was reached
    #[error("Listing did not end after {0} pages")]
    PageLimitExceeded(usize),
}

/// Fetches every subreddit the token's user is subscribed to.
///
/// Follows the `after` cursor from page to page until the listing reports no
/// further pages, preserving the API's ordering.
///
/// # Arguments
///
/// * `transport` - Transport used for every page request
/// * `endpoints` - API base the listing URL is built from
/// * `token` - OAuth bearer token
/// * `max_pages` - Upper bound on the number of page requests
///
/// # Errors
///
/// - [`FetchError::Transport`] - a page request failed; no retry is attempted
/// - [`FetchError::Parse`] - a page body was malformed or a child lacked `name`/`display_name`
/// - [`FetchError::PageLimitExceeded`] - the cursor never ran out within `max_pages`
pub async fn fetch_subscriptions(
    transport: &dyn Transport,
    endpoints: &Endpoints,
    token: &SecretString,
    max_pages: usize,
) -> Result<Vec<Subreddit>, FetchError> {
    let mut subreddits = Vec::new();
    let mut after: Option<String> = None;
    let mut pages = 0;

    loop {
        if pages >= max_pages {
            tracing::warn!(
                pages = pages,
                fetched = subreddits.len(),
                "Listing cursor still set at page ceiling, aborting"
            );
            return Err(FetchError::PageLimitExceeded(max_pages));
        }

        let url = endpoints.subscriptions_page(after.as_deref());
        let body = transport.send(token, ApiRequest::get(url)).await?;
        pages += 1;

        let listing: Listing = serde_json::from_value(body)
            .map_err(|e| FetchError::Parse(format!("page {}: {}", pages, e)))?;

        for child in listing.data.children {
            let subreddit = child.data.into_subreddit().map_err(|field| {
                FetchError::Parse(format!("page {}: listing child missing '{}'", pages, field))
            })?;
            subreddits.push(subreddit);
        }

        tracing::debug!(
            page = pages,
            total = subreddits.len(),
            has_more = listing.data.after.is_some(),
            "Fetched subscription page"
        );

        after = listing.data.after.filter(|cursor| !cursor.is_empty());
        if after.is_none() {
            break;
        }
    }

    tracing::info!(
        pages = pages,
        subreddits = subreddits.len(),
        "Fetched all subscriptions"
    );
    Ok(subreddits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reddit::transport::DirectTransport;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn child(id: &str, name: &str) -> Value {
        json!({
            "kind": "t5",
            "data": {
                "name": id,
                "display_name": name,
                "subscribers": 10,
                "public_description": format!("about {}", name),
                "icon_img": "",
                "community_icon": ""
            }
        })
    }

    fn page(children: Vec<Value>, after: Option<&str>) -> Value {
        json!({ "kind": "Listing", "data": { "children": children, "after": after } })
    }

    async fn setup() -> (MockServer, Endpoints) {
        let mock_server = MockServer::start().await;
        let endpoints = Endpoints::new(&mock_server.uri()).unwrap();
        (mock_server, endpoints)
    }

    fn token() -> SecretString {
        SecretString::from("test-token".to_string())
    }

    #[tokio::test]
    async fn test_follows_cursor_until_exhausted() {
        let (mock_server, endpoints) = setup().await;

        Mock::given(method("GET"))
            .and(path("/subreddits/mine/subscriber"))
            .and(query_param("limit", "100"))
            .and(query_param_is_missing("after"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(
                vec![child("t5_1", "one"), child("t5_2", "two")],
                Some("t5_2"),
            )))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("after", "t5_2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(
                vec![child("t5_3", "three")],
                None,
            )))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = DirectTransport::new(reqwest::Client::new());
        let subs = fetch_subscriptions(&transport, &endpoints, &token(), DEFAULT_MAX_PAGES)
            .await
            .unwrap();

        let names: Vec<&str> = subs.iter().map(|s| s.display_name.as_str()).collect();
        assert_eq!(names, vec!["one", "two", "three"]);
        assert_eq!(subs[0].description, "about one");
    }

    #[tokio::test]
    async fn test_empty_cursor_ends_listing() {
        let (mock_server, endpoints) = setup().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page(vec![child("t5_1", "one")], Some(""))),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = DirectTransport::new(reqwest::Client::new());
        let subs = fetch_subscriptions(&transport, &endpoints, &token(), DEFAULT_MAX_PAGES)
            .await
            .unwrap();
        assert_eq!(subs.len(), 1);
    }

    #[tokio::test]
    async fn test_http_error_fails_without_retry() {
        let (mock_server, endpoints) = setup().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = DirectTransport::new(reqwest::Client::new());
        let err = fetch_subscriptions(&transport, &endpoints, &token(), DEFAULT_MAX_PAGES)
            .await
            .unwrap_err();
        match err {
            FetchError::Transport(TransportError::HttpStatus { status: 500, .. }) => {}
            e => panic!("Expected HttpStatus(500), got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_error_on_later_page_discards_earlier_pages() {
        let (mock_server, endpoints) = setup().await;
        Mock::given(method("GET"))
            .and(query_param_is_missing("after"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page(vec![child("t5_1", "one")], Some("t5_1"))),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("after", "t5_1"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let transport = DirectTransport::new(reqwest::Client::new());
        let result =
            fetch_subscriptions(&transport, &endpoints, &token(), DEFAULT_MAX_PAGES).await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }

    #[tokio::test]
    async fn test_missing_display_name_is_parse_error() {
        let (mock_server, endpoints) = setup().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(
                vec![json!({ "data": { "name": "t5_1" } })],
                None,
            )))
            .mount(&mock_server)
            .await;

        let transport = DirectTransport::new(reqwest::Client::new());
        let err = fetch_subscriptions(&transport, &endpoints, &token(), DEFAULT_MAX_PAGES)
            .await
            .unwrap_err();
        match err {
            FetchError::Parse(msg) => assert!(msg.contains("display_name")),
            e => panic!("Expected Parse error, got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let (mock_server, endpoints) = setup().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
            .mount(&mock_server)
            .await;

        let transport = DirectTransport::new(reqwest::Client::new());
        let result =
            fetch_subscriptions(&transport, &endpoints, &token(), DEFAULT_MAX_PAGES).await;
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[tokio::test]
    async fn test_page_ceiling_stops_endless_cursor() {
        let (mock_server, endpoints) = setup().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page(vec![child("t5_1", "one")], Some("t5_1"))),
            )
            .expect(3)
            .mount(&mock_server)
            .await;

        let transport = DirectTransport::new(reqwest::Client::new());
        let err = fetch_subscriptions(&transport, &endpoints, &token(), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::PageLimitExceeded(3)));
    }
}
