//! Market context: session buckets and the liquidity window.

use crate::types::MarketSession;
use chrono::{DateTime, TimeZone, Timelike};

/// Session bucket for an hour of day (0-23).
///
/// `[2,8)` ASIAN, `[8,16)` LONDON, `[16,22)` NY, everything else OFF_HOURS.
pub fn session(hour: u32) -> MarketSession {
    match hour {
        2..=7 => MarketSession::Asian,
        8..=15 => MarketSession::London,
        16..=21 => MarketSession::Ny,
        _ => MarketSession::OffHours,
    }
}

/// Session bucket for a point in time, using its own clock's hour.
pub fn session_at<Tz: TimeZone>(now: &DateTime<Tz>) -> MarketSession {
    session(now.hour())
}

/// Whether new candidates are worth evaluating at this hour.
///
/// LONDON and NY qualify, plus hour 16 on its own as the NY-open overlap.
pub fn is_high_liquidity(hour: u32) -> bool {
    matches!(session(hour), MarketSession::London | MarketSession::Ny) || hour == 16
}
