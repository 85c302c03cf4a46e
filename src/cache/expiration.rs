//! Expiry calculation for cache profiles.

use chrono::Utc;

use crate::connections::CacheProfile;

/// Current time in seconds since the epoch.
pub fn now_secs() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}

/// Seconds the entry should live, before interval alignment.
///
/// The origin's `max-age` wins unless the profile overrides it.
pub fn ttl_secs(profile: &CacheProfile, origin_max_age: Option<u64>) -> u64 {
    match origin_max_age {
        Some(max_age) if !profile.override_origin_header_expiration => max_age,
        _ => profile.default_expiration_in_seconds,
    }
}

/// Absolute expiry (epoch seconds) for an entry stored at `now`.
///
/// Interval profiles expire on the next multiple of the TTL, counted from
/// midnight in the zone `offset_minutes` away from UTC, so a 600s profile
/// flips at :00, :10, :20 and so on. Returns `None` when nothing should be
/// stored.
pub fn expires_at(profile: &CacheProfile, origin_max_age: Option<u64>, now: u64, offset_minutes: i32) -> Option<u64> {
    let ttl = ttl_secs(profile, origin_max_age);
    if ttl == 0 {
        return None;
    }

    if !profile.expiration_is_on_interval {
        return Some(now.saturating_add(ttl));
    }

    let offset = i64::from(offset_minutes) * 60;
    let local = (now as i64).saturating_add(offset);
    let ttl = ttl as i64;
    let next_boundary = (local.div_euclid(ttl) + 1) * ttl;
    u64::try_from(next_boundary - offset).ok()
}
