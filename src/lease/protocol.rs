//! Decision rules for the two conditional operations.
//!
//! These are the bodies every [`ConditionalStore`](crate::store::ConditionalStore)
//! runs inside its critical section. They are pure: the store supplies the
//! record it read and its own `now`, and applies whatever is decided.

use crate::error::{LeaseError, Result};
use crate::store::{GrantKind, LeaseRecord};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// What a conditional set should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetDecision {
    /// Write the new token.
    Write(GrantKind),
    /// Leave the record alone; an unexpired lease belongs to someone else.
    NotExpired,
}

/// Decide `lease/set-if-expired` for `current`.
///
/// The first matching rule wins: vacant slot, reentrant renewal with
/// `old_token`, then expiry (`last_write_at + ttl_ms < now`, strictly).
pub fn decide_set(
    current: Option<&LeaseRecord>,
    old_token: Option<Uuid>,
    new_token: Uuid,
    ttl_ms: u64,
    now: DateTime<Utc>,
) -> Result<SetDecision> {
    let Some(record) = current else {
        return Ok(SetDecision::Write(GrantKind::Vacant));
    };

    let Some(holder) = record.holder_token else {
        return Ok(SetDecision::Write(GrantKind::Vacant));
    };

    if holder == new_token {
        return Err(LeaseError::InvalidNewValue(new_token));
    }

    if old_token == Some(holder) {
        return Ok(SetDecision::Write(GrantKind::Renewed));
    }

    if record.is_expired_at(ttl_ms, now) {
        return Ok(SetDecision::Write(GrantKind::Seized));
    }

    Ok(SetDecision::NotExpired)
}

/// Decide `lease/delete-if-match`: clear only our own token.
pub fn decide_delete(current: Option<&LeaseRecord>, expected: Uuid) -> bool {
    current.and_then(|r| r.holder_token) == Some(expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LeaseKey;
    use chrono::Duration;

    fn t(ms: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::milliseconds(ms)
    }

    fn held_by(token: Option<Uuid>, at_ms: i64) -> LeaseRecord {
        let key = LeaseKey::new("db", "holder").unwrap();
        LeaseRecord::new(&key, token, t(at_ms))
    }

    #[test]
    fn missing_record_is_vacant() {
        let decision = decide_set(None, None, Uuid::new_v4(), 1_000, t(0)).unwrap();
        assert_eq!(decision, SetDecision::Write(GrantKind::Vacant));
    }

    #[test]
    fn released_record_is_vacant() {
        let record = held_by(None, 0);
        let decision = decide_set(Some(&record), None, Uuid::new_v4(), 1_000, t(10)).unwrap();
        assert_eq!(decision, SetDecision::Write(GrantKind::Vacant));
    }

    #[test]
    fn holder_presenting_its_token_renews() {
        let mine = Uuid::new_v4();
        let record = held_by(Some(mine), 0);
        let decision =
            decide_set(Some(&record), Some(mine), Uuid::new_v4(), 1_000, t(500)).unwrap();
        assert_eq!(decision, SetDecision::Write(GrantKind::Renewed));
    }

    #[test]
    fn stranger_before_expiry_is_refused() {
        let record = held_by(Some(Uuid::new_v4()), 0);
        let decision =
            decide_set(Some(&record), Some(Uuid::new_v4()), Uuid::new_v4(), 1_000, t(500))
                .unwrap();
        assert_eq!(decision, SetDecision::NotExpired);
    }

    #[test]
    fn expiry_boundary_is_strict() {
        let record = held_by(Some(Uuid::new_v4()), 0);

        let at_ttl = decide_set(Some(&record), None, Uuid::new_v4(), 1_000, t(1_000)).unwrap();
        assert_eq!(at_ttl, SetDecision::NotExpired);

        let past_ttl = decide_set(Some(&record), None, Uuid::new_v4(), 1_000, t(1_001)).unwrap();
        assert_eq!(past_ttl, SetDecision::Write(GrantKind::Seized));
    }

    #[test]
    fn colliding_new_token_is_an_error() {
        let token = Uuid::new_v4();
        let record = held_by(Some(token), 0);

        let err = decide_set(Some(&record), Some(token), token, 1_000, t(10)).unwrap_err();
        assert!(matches!(err, LeaseError::InvalidNewValue(t) if t == token));
    }

    #[test]
    fn delete_matches_only_the_stored_token() {
        let mine = Uuid::new_v4();
        let record = held_by(Some(mine), 0);

        assert!(decide_delete(Some(&record), mine));
        assert!(!decide_delete(Some(&record), Uuid::new_v4()));
        assert!(!decide_delete(Some(&held_by(None, 0)), mine));
        assert!(!decide_delete(None, mine));
    }
}
