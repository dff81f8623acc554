//! Caller-side choice of which subreddits to unsubscribe from.
use super::types::Subreddit;
use std::collections::HashSet;

/// Subreddits whose display name or description contains `query`
/// (case-insensitive). An empty or whitespace-only query matches everything.
pub fn filter_subreddits<'a>(subreddits: &'a [Subreddit], query: &str) -> Vec<&'a Subreddit> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return subreddits.iter().collect();
    }
    subreddits
        .iter()
        .filter(|s| {
            s.display_name.to_lowercase().contains(&query)
                || s.description.to_lowercase().contains(&query)
        })
        .collect()
}

/// A set of display names picked for unsubscription.
///
/// Names compare case-insensitively, matching how the API resolves
/// `sr_name`. Insertion order is kept so the batch runs in the order the
/// user picked.
#[derive(Debug, Default, Clone)]
pub struct Selection {
    names: Vec<String>,
    seen: HashSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name`, ignoring blanks and duplicates. Returns whether it was added.
    pub fn insert(&mut self, name: &str) -> bool {
        let name = strip_prefix(name);
        if name.is_empty() || !self.seen.insert(name.to_lowercase()) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}

/// Trims whitespace and a leading `r/` in any case.
fn strip_prefix(name: &str) -> &str {
    let name = name.trim();
    match name.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("r/") => name[2..].trim_start(),
        _ => name,
    }
}

impl<'a> FromIterator<&'a Subreddit> for Selection {
    fn from_iter<I: IntoIterator<Item = &'a Subreddit>>(iter: I) -> Self {
        let mut selection = Selection::new();
        for subreddit in iter {
            selection.insert(&subreddit.display_name);
        }
        selection
    }
}

impl<S: AsRef<str>> Extend<S> for Selection {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for name in iter {
            self.insert(name.as_ref());
        }
    }
}
