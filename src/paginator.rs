//! Cursor pagination with rate-limit backoff
//!
//! Drives a "fetch one page" function to completion, concatenating pages in
//! order. Rate-limited pages are retried in place after sleeping for the
//! server-supplied delay; the retry counter is per page, so a long fetch
//! that gets throttled on several pages still completes as long as no
//! single page exceeds the ceiling.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::errors::DirectoryError;
use crate::transport::{Page, TransportError};

/// Fetch every page from a cursor-based listing.
///
/// `page_fn` is called with `None` first, then with each returned cursor,
/// until a page comes back with an empty or absent cursor. `max_retries`
/// bounds the rate-limit retries for one page after its first attempt;
/// exceeding it fails the whole fetch with
/// [`DirectoryError::RateLimitExceeded`]. Non-rate-limit errors propagate
/// immediately.
pub async fn fetch_all<T, F, Fut>(mut page_fn: F, max_retries: u32) -> Result<Vec<T>, DirectoryError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, TransportError>>,
{
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let mut attempts: u32 = 0;
        let page = loop {
            attempts += 1;
            match page_fn(cursor.clone()).await {
                Ok(page) => break page,
                Err(TransportError::RateLimited { retry_after_secs }) => {
                    if attempts > max_retries {
                        warn!(attempts, "rate-limit retry ceiling exhausted");
                        return Err(DirectoryError::RateLimitExceeded { attempts });
                    }
                    debug!(retry_after_secs, attempt = attempts, "rate limited, backing off");
                    sleep(Duration::from_secs(retry_after_secs)).await;
                }
                Err(other) => return Err(other.into()),
            }
        };

        let last = page.is_last();
        cursor = page.next_cursor;
        records.extend(page.items);
        if last {
            break;
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    /// Serves `items` in pages of `page_size`, using the item index as cursor.
    fn paged_source(items: Vec<u32>, page_size: usize) -> impl FnMut(Option<String>) -> std::future::Ready<Result<Page<u32>, TransportError>> {
        move |cursor| {
            let start: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
            let end = (start + page_size).min(items.len());
            let next = if end < items.len() {
                Some(end.to_string())
            } else {
                Some(String::new())
            };
            std::future::ready(Ok(Page {
                items: items[start..end].to_vec(),
                next_cursor: next,
            }))
        }
    }

    #[tokio::test]
    async fn test_completeness_across_page_sizes() {
        let items: Vec<u32> = (0..97).collect();
        for page_size in [1, 7, 50, 97, 500] {
            let result = fetch_all(paged_source(items.clone(), page_size), 3)
                .await
                .unwrap();
            assert_eq!(result, items, "page size {page_size}");
        }
    }

    #[tokio::test]
    async fn test_empty_source() {
        let result = fetch_all(paged_source(vec![], 10), 3).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_bound_is_ceiling_plus_one() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<Vec<u32>, _> = fetch_all(
            move |_cursor| {
                counter.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Err(TransportError::RateLimited { retry_after_secs: 1 }))
            },
            3,
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result {
            Err(DirectoryError::RateLimitExceeded { attempts }) => assert_eq!(attempts, 4),
            other => panic!("expected RateLimitExceeded, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovery_sleeps_server_delay() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let start = Instant::now();

        let result = fetch_all(
            move |_cursor| {
                let call = counter.fetch_add(1, Ordering::SeqCst);
                std::future::ready(if call == 0 {
                    Err(TransportError::RateLimited { retry_after_secs: 30 })
                } else {
                    Ok(Page::last(vec![1u32, 2, 3]))
                })
            },
            3,
        )
        .await
        .unwrap();

        assert_eq!(result, vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        // Exactly one backoff, exactly the server-specified duration.
        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_counter_resets_per_page() {
        // Every page is rate limited 3 times before succeeding; a global
        // counter would trip the ceiling on page two.
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = fetch_all(
            move |cursor| {
                let call = counter.fetch_add(1, Ordering::SeqCst);
                std::future::ready(if call % 4 != 3 {
                    Err(TransportError::RateLimited { retry_after_secs: 1 })
                } else if cursor.is_none() {
                    Ok(Page {
                        items: vec![1u32],
                        next_cursor: Some("next".to_string()),
                    })
                } else {
                    Ok(Page::last(vec![2u32]))
                })
            },
            3,
        )
        .await
        .unwrap();

        assert_eq!(result, vec![1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn test_other_errors_propagate_without_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<Vec<u32>, _> = fetch_all(
            move |_cursor| {
                counter.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Err(TransportError::Api("invalid_auth".to_string())))
            },
            3,
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match result {
            Err(DirectoryError::Transport(TransportError::Api(msg))) => {
                assert_eq!(msg, "invalid_auth");
            }
            other => panic!("expected transport passthrough, got {other:?}"),
        }
    }
}
