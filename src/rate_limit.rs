//! Throttling for providers that report their remaining request quota.

use std::time::Duration;

use reqwest::header::HeaderMap;
use tracing::debug;

pub const REMAINING_HEADER: &str = "RateLimit-Remaining";
pub const RESET_HEADER: &str = "RateLimit-Reset";

/// Sleep used when the quota is nearly gone but the reset time is unknown or already past.
const EXHAUSTED_FALLBACK: Duration = Duration::from_secs(10);

/// How long to pause given `remaining` requests left and a reset time in epoch seconds.
///
/// | remaining | pause              |
/// |-----------|--------------------|
/// | <= 10     | until reset        |
/// | 11..=25   | 5s                 |
/// | 26..=50   | 2s                 |
/// | 51..=100  | 1s                 |
/// | 101..=400 | 250ms              |
/// | > 400     | none               |
pub fn backoff_for(remaining: u64, reset_epoch: Option<u64>, now_epoch: u64) -> Option<Duration> {
    match remaining {
        0..=10 => Some(match reset_epoch {
            Some(reset) if reset > now_epoch => Duration::from_secs(reset - now_epoch),
            _ => EXHAUSTED_FALLBACK,
        }),
        11..=25 => Some(Duration::from_secs(5)),
        26..=50 => Some(Duration::from_secs(2)),
        51..=100 => Some(Duration::from_secs(1)),
        101..=400 => Some(Duration::from_millis(250)),
        _ => None,
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Pause the calling worker according to the quota headers of a response.
/// Missing or unparsable headers mean no pause.
pub fn throttle(headers: &HeaderMap) {
    let Some(remaining) = header_u64(headers, REMAINING_HEADER) else {
        return;
    };
    let reset = header_u64(headers, RESET_HEADER);
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    if let Some(pause) = backoff_for(remaining, reset, now) {
        debug!("{remaining} API requests remaining; sleeping {pause:?}");
        std::thread::sleep(pause);
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn bands() {
        assert_eq!(backoff_for(1000, None, 0), None);
        assert_eq!(backoff_for(401, None, 0), None);
        assert_eq!(backoff_for(400, None, 0), Some(Duration::from_millis(250)));
        assert_eq!(backoff_for(100, None, 0), Some(Duration::from_secs(1)));
        assert_eq!(backoff_for(50, None, 0), Some(Duration::from_secs(2)));
        assert_eq!(backoff_for(11, None, 0), Some(Duration::from_secs(5)));
    }

    #[test]
    fn exhausted_waits_for_reset() {
        assert_eq!(backoff_for(3, Some(1_030), 1_000), Some(Duration::from_secs(30)));
        assert_eq!(backoff_for(0, Some(900), 1_000), Some(EXHAUSTED_FALLBACK));
        assert_eq!(backoff_for(10, None, 1_000), Some(EXHAUSTED_FALLBACK));
    }

    #[test]
    fn garbage_headers_do_not_pause() {
        let mut headers = HeaderMap::new();
        headers.insert(REMAINING_HEADER, HeaderValue::from_static("lots"));
        let started = std::time::Instant::now();
        throttle(&headers);
        throttle(&HeaderMap::new());
        assert!(started.elapsed() < Duration::from_millis(200));
    }
}
