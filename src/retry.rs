// Bounded retry for idempotent reads (nonce fetches). There is no other
// in-process retry: everything else fails once and is logged.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry `op` up to `attempts` times, doubling the delay between tries.
/// `op` receives the 1-based attempt number.
pub async fn retry_async<F, Fut, T, E>(
    mut op: F,
    attempts: usize,
    initial_delay: Duration,
) -> Result<T, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = initial_delay;
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(_) if attempt < attempts => {
                sleep(delay).await;
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_retries_until_success() {
        let counter = AtomicUsize::new(0);
        let res: Result<u32, ()> = retry_async(
            |_| {
                let current = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if current < 2 {
                        Err(())
                    } else {
                        Ok(7)
                    }
                }
            },
            3,
            Duration::from_millis(1),
        )
        .await;

        assert_eq!(res, Ok(7));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_attempts() {
        let counter = AtomicUsize::new(0);
        let res: Result<u32, &str> = retry_async(
            |attempt| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    assert!(attempt <= 3);
                    Err("down")
                }
            },
            3,
            Duration::from_millis(1),
        )
        .await;

        assert_eq!(res, Err("down"));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }
}
