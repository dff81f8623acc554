//! In-memory stand-in for the Reddit API.
//!
//! Serves listing pages keyed by cursor and records every unsubscribe call
//! with the (tokio) instant it started and finished, so tests can recover
//! the batch grouping and the gaps between batches.
#![allow(dead_code)]

use async_trait::async_trait;
use reddit_cleaner::reddit::{ApiRequest, Transport, TransportError};
use reqwest::Method;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Call {
    pub name: String,
    pub started: Instant,
    pub finished: Instant,
}

#[derive(Default)]
pub struct FakeApi {
    /// Listing pages keyed by the `after` cursor that requests them ("" = first page)
    pages: HashMap<String, Value>,
    failing: HashSet<String>,
    latency: Duration,
    calls: Mutex<Vec<Call>>,
    page_requests: Mutex<usize>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Chain of listing pages; page `i` holds `sizes[i]` subreddits.
    pub fn with_pages(mut self, sizes: &[usize]) -> Self {
        let mut next_id = 0;
        let mut cursor = String::new();
        for (i, size) in sizes.iter().enumerate() {
            let children: Vec<Value> = (next_id..next_id + size)
                .map(|n| {
                    json!({
                        "kind": "t5",
                        "data": {
                            "name": format!("t5_{}", n),
                            "display_name": format!("sub{}", n),
                            "subscribers": n * 10,
                            "public_description": "",
                            "icon_img": "",
                            "community_icon": format!("https://icons.example/{}.png", n)
                        }
                    })
                })
                .collect();
            next_id += size;
            let after = if i + 1 < sizes.len() {
                Some(format!("t5_{}", next_id - 1))
            } else {
                None
            };
            self.pages.insert(
                cursor.clone(),
                json!({ "kind": "Listing", "data": { "children": children, "after": after } }),
            );
            cursor = after.unwrap_or_default();
        }
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn page_requests(&self) -> usize {
        *self.page_requests.lock().unwrap()
    }

    /// Sizes of groups of calls that started at the same instant, in order.
    pub fn group_sizes(&self) -> Vec<usize> {
        let mut sizes: Vec<usize> = Vec::new();
        let mut current: Option<Instant> = None;
        for call in self.calls() {
            if current == Some(call.started) {
                if let Some(last) = sizes.last_mut() {
                    *last += 1;
                }
            } else {
                current = Some(call.started);
                sizes.push(1);
            }
        }
        sizes
    }
}

fn form_value(body: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(body.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

#[async_trait]
impl Transport for FakeApi {
    async fn send(
        &self,
        _token: &SecretString,
        request: ApiRequest,
    ) -> Result<Value, TransportError> {
        if request.method == Method::GET {
            *self.page_requests.lock().unwrap() += 1;
            let url = url::Url::parse(&request.url).expect("listing URL");
            let cursor = url
                .query_pairs()
                .find(|(k, _)| k == "after")
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default();
            return self
                .pages
                .get(&cursor)
                .cloned()
                .ok_or_else(|| TransportError::HttpStatus {
                    status: 404,
                    body: format!("no page for cursor '{}'", cursor),
                });
        }

        let name = request
            .body
            .as_deref()
            .and_then(|b| form_value(b, "sr_name"))
            .expect("sr_name in form body");
        let started = Instant::now();
        tokio::time::sleep(self.latency).await;
        self.calls.lock().unwrap().push(Call {
            name: name.clone(),
            started,
            finished: Instant::now(),
        });

        if self.failing.contains(&name) {
            return Err(TransportError::HttpStatus {
                status: 403,
                body: "forbidden".to_string(),
            });
        }
        Ok(json!({}))
    }
}

pub fn token() -> SecretString {
    SecretString::from("integration-token".to_string())
}

pub fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("sub{}", i)).collect()
}
