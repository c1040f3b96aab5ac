//! Post identifier generation.
//!
//! Post ids are decimal strings of 100-nanosecond ticks since the Unix
//! epoch. A process-wide high-water mark makes consecutive calls strictly
//! increasing even when the clock does not advance between them, so ids are
//! unique and sort in creation order.

use std::sync::atomic::{AtomicI64, Ordering};

use time::OffsetDateTime;

static LAST_TICKS: AtomicI64 = AtomicI64::new(0);

/// Mint a fresh post id.
pub fn next_post_id() -> String {
    let now = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 100) as i64;
    let mut last = LAST_TICKS.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_TICKS.compare_exchange_weak(last, candidate, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return candidate.to_string(),
            Err(observed) => last = observed,
        }
    }
}
