use anyhow::Result;
use gam::error::{ApiError, GamError};
use gam::retry::{is_transient, with_exponential_backoff, RetryConfig};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

fn quick(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        initial_backoff_ms: 10,
        backoff_factor: 2.0,
        max_backoff_ms: 100,
        add_jitter: false,
    }
}

fn busy() -> GamError {
    ApiError::new(503, "ServerBusy").into()
}

#[tokio::test]
async fn test_server_busy_is_retried_until_success() -> Result<()> {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let value = with_exponential_backoff(
        || async {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(busy())
            } else {
                Ok("entry")
            }
        },
        is_transient,
        &quick(3),
    )
    .await?;

    assert_eq!(value, "entry");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn test_provider_rejections_are_not_retried() -> Result<()> {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let result: Result<(), GamError> = with_exponential_backoff(
        || async {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::new(400, "EntityDoesNotExist").into())
        },
        is_transient,
        &quick(5),
    )
    .await;

    assert!(matches!(result, Err(GamError::Api(ref e)) if e.is_reason("EntityDoesNotExist")));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_attempts_stop_at_max_retries() -> Result<()> {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let result: Result<(), GamError> = with_exponential_backoff(
        || async {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(busy())
        },
        is_transient,
        &quick(2),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn test_delays_grow_between_attempts() -> Result<()> {
    let stamps = Arc::new(Mutex::new(Vec::new()));
    let recorder = stamps.clone();

    let _: Result<(), GamError> = with_exponential_backoff(
        || async {
            recorder.lock().unwrap().push(Instant::now());
            Err(busy())
        },
        is_transient,
        &quick(3),
    )
    .await;

    let stamps = stamps.lock().unwrap();
    assert_eq!(stamps.len(), 3);
    let first = stamps[1].duration_since(stamps[0]);
    let second = stamps[2].duration_since(stamps[1]);
    assert!(
        second > first,
        "second delay {:?} should exceed first {:?}",
        second,
        first
    );
    Ok(())
}

#[test]
fn test_delay_is_capped() {
    let config = RetryConfig {
        max_retries: 6,
        initial_backoff_ms: 10,
        backoff_factor: 10.0,
        max_backoff_ms: 50,
        add_jitter: false,
    };
    assert_eq!(config.delay_ms(0), 10);
    assert_eq!(config.delay_ms(1), 50);
    assert_eq!(config.delay_ms(4), 50);
}

#[test]
fn test_transient_classification() {
    assert!(is_transient(&busy()));
    assert!(is_transient(&ApiError::new(429, "quota").into()));
    assert!(is_transient(&ApiError::new(500, "backend").into()));
    assert!(!is_transient(&ApiError::new(403, "Forbidden").into()));
    assert!(!is_transient(&GamError::usage("Error: expected a user")));
}
