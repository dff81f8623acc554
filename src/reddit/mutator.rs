use super::endpoints::{unsubscribe_form, Endpoints};
use super::transport::{ApiRequest, Transport, TransportError};
use super::types::BatchProgress;
use futures::future::join_all;
use secrecy::SecretString;
use std::time::Duration;
use thiserror::Error;

/// Items mutated concurrently per chunk.
pub const DEFAULT_BATCH_SIZE: usize = 5;
/// Pause between chunks.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(1000);

/// A single-item mutation failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to unsubscribe from {item_id}: {message}")]
pub struct MutateError {
    /// Display name of the subreddit that failed
    pub item_id: String,
    /// HTTP status, when the failure came with one
    pub status: Option<u16>,
    pub message: String,
}

impl MutateError {
    fn from_transport(item_id: &str, err: TransportError) -> Self {
        Self {
            item_id: item_id.to_string(),
            status: err.status(),
            message: err.to_string(),
        }
    }
}

/// Shape of a batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Maximum concurrent requests per chunk. Zero is treated as one.
    pub batch_size: usize,
    /// Fixed delay between chunks (none after the last)
    pub cooldown: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

/// Unsubscribes from a single subreddit by display name.
///
/// Any transport failure or non-2xx status is returned as a [`MutateError`].
/// No retry is attempted.
pub async fn unsubscribe(
    transport: &dyn Transport,
    endpoints: &Endpoints,
    token: &SecretString,
    display_name: &str,
) -> Result<(), MutateError> {
    let request = ApiRequest::post_form(endpoints.subscribe(), unsubscribe_form(display_name));
    transport
        .send(token, request)
        .await
        .map_err(|e| MutateError::from_transport(display_name, e))?;

    tracing::debug!(subreddit = %display_name, "Unsubscribed");
    Ok(())
}

/// Unsubscribes from every subreddit in `names`, in fixed-size chunks.
///
/// Each chunk is sent concurrently and fully settles before the next one
/// starts; chunks are separated by `options.cooldown`. After every settled
/// chunk, `on_progress` receives the cumulative count, so `processed` is
/// strictly increasing and ends at `total`.
///
/// # Errors
///
/// Fails fast: if any item in a chunk fails, the error of the first failing
/// item (in input order) is returned once the chunk settles, no progress is
/// reported for that chunk, and later chunks are never attempted. Exactly
/// the items counted by the last progress report are known to have
/// succeeded.
pub async fn batch_unsubscribe<F>(
    transport: &dyn Transport,
    endpoints: &Endpoints,
    token: &SecretString,
    names: &[String],
    options: BatchOptions,
    mut on_progress: F,
) -> Result<(), MutateError>
where
    F: FnMut(BatchProgress),
{
    let total = names.len();
    let batch_size = options.batch_size.max(1);
    let chunk_count = total.div_ceil(batch_size);
    let mut processed = 0;

    tracing::info!(
        total = total,
        batch_size = batch_size,
        chunks = chunk_count,
        cooldown_ms = options.cooldown.as_millis() as u64,
        "Starting batch unsubscribe"
    );

    for (index, chunk) in names.chunks(batch_size).enumerate() {
        let results = join_all(
            chunk
                .iter()
                .map(|name| unsubscribe(transport, endpoints, token, name)),
        )
        .await;

        if let Some(err) = results.into_iter().find_map(Result::err) {
            tracing::warn!(
                chunk = index,
                processed = processed,
                total = total,
                subreddit = %err.item_id,
                error = %err.message,
                "Batch unsubscribe aborted"
            );
            return Err(err);
        }

        processed += chunk.len();
        on_progress(BatchProgress { processed, total });

        if index + 1 < chunk_count {
            tokio::time::sleep(options.cooldown).await;
        }
    }

    tracing::info!(total = total, "Batch unsubscribe complete");
    Ok(())
}
