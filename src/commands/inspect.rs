//! Read-only commands: `status` and `history`.

use super::{StoreContext, emit, emit_json};
use crate::cli::{HistoryArgs, StatusArgs};
use crate::error::Result;
use crate::exit_codes;
use crate::store::{Clock, ConditionalStore, LeaseKey, SystemClock};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use uuid::Uuid;

/// What `status` prints for an existing record.
#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    resource: &'a str,
    attribute: &'a str,
    holder_token: Option<Uuid>,
    last_write_at: DateTime<Utc>,
    ttl_ms: u64,
    expired: bool,
}

pub(super) fn cmd_status(ctx: &StoreContext, args: StatusArgs, out: &mut dyn Write) -> Result<i32> {
    let key = LeaseKey::new(args.target.resource.as_str(), ctx.attribute(&args.target))?;
    let ttl_ms = ctx.ttl_ms(args.ttl_ms);

    let Some(record) = ctx.store.read(&key)? else {
        emit(out, "null")?;
        return Ok(exit_codes::SUCCESS);
    };

    let report = StatusReport {
        resource: key.resource_id(),
        attribute: key.attribute(),
        holder_token: record.holder_token,
        last_write_at: record.last_write_at,
        ttl_ms,
        expired: record.holder_token.is_none()
            || record.is_expired_at(ttl_ms, SystemClock.now()),
    };
    emit_json(out, &report)?;
    Ok(exit_codes::SUCCESS)
}

pub(super) fn cmd_history(
    ctx: &StoreContext,
    args: HistoryArgs,
    out: &mut dyn Write,
) -> Result<i32> {
    let events: Vec<_> = ctx
        .store
        .read_events()?
        .into_iter()
        .filter(|e| match &args.resource {
            Some(resource) => e.resource.as_deref() == Some(resource.as_str()),
            None => true,
        })
        .collect();

    let skip = args
        .limit
        .map(|limit| events.len().saturating_sub(limit))
        .unwrap_or(0);

    for event in events.iter().skip(skip) {
        emit(out, event)?;
    }
    Ok(exit_codes::SUCCESS)
}
