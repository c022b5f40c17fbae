use chrono::{Duration, Utc};
use rand::RngCore;

use fiesta_types::models::Session;

/// Name of the HTTP-only cookie carrying the opaque session token.
pub const SESSION_COOKIE: &str = "fiesta_session";

const SESSION_TTL_DAYS: i64 = 7;

/// Mint a new session for `account_id`: 32 random bytes, hex-encoded, with
/// a 7-day expiry.
pub fn new_session(account_id: i64) -> Session {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);

    Session {
        token: hex::encode(bytes),
        account_id,
        expires_at: Utc::now() + Duration::days(SESSION_TTL_DAYS),
    }
}

pub fn ttl() -> time::Duration {
    time::Duration::days(SESSION_TTL_DAYS)
}
