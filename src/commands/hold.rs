//! `hold`: a renewal loop around `acquire()`.

use super::{StoreContext, emit, emit_json};
use crate::cli::HoldArgs;
use crate::error::{LeaseError, Result};
use crate::exit_codes;
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::warn;

/// Smallest ttl that leaves room for a 1ms renewal interval.
const MIN_HOLD_TTL_MS: u64 = 2;

pub(super) fn cmd_hold(ctx: &StoreContext, args: HoldArgs, out: &mut dyn Write) -> Result<i32> {
    let ttl_ms = ctx.ttl_ms(args.ttl_ms);
    if ttl_ms < MIN_HOLD_TTL_MS {
        return Err(LeaseError::UserError(format!(
            "ttl ({}ms) is too short to renew within; hold needs at least {}ms",
            ttl_ms, MIN_HOLD_TTL_MS
        )));
    }
    let renew_every_ms = args.renew_every_ms.unwrap_or(ttl_ms / 3).max(1);
    if renew_every_ms >= ttl_ms {
        return Err(LeaseError::UserError(format!(
            "--renew-every-ms ({}) must be shorter than the ttl ({}ms)",
            renew_every_ms, ttl_ms
        )));
    }

    let lease = ctx.handle(&args.target, Some(ttl_ms), None)?;
    let deadline = Instant::now() + Duration::from_millis(args.for_ms);

    let Some(grant) = lease.acquire()? else {
        emit(out, "false")?;
        return Ok(exit_codes::NOT_HELD);
    };
    emit_json(out, &grant)?;

    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep(Duration::from_millis(renew_every_ms).min(deadline - now));
        if Instant::now() >= deadline {
            break;
        }

        match lease.acquire()? {
            Some(grant) => emit_json(out, &grant)?,
            None => {
                warn!(key = %lease.key(), "lease lost while holding");
                lease.release()?;
                emit(out, "false")?;
                return Ok(exit_codes::NOT_HELD);
            }
        }
    }

    emit(out, lease.release()?)?;
    Ok(exit_codes::SUCCESS)
}
