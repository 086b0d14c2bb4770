//! `install`, `acquire` and `release`.

use super::{StoreContext, emit, emit_json};
use crate::cli::{AcquireArgs, ReleaseArgs};
use crate::error::Result;
use crate::exit_codes;
use std::io::Write;

pub(super) fn cmd_install(ctx: &StoreContext, out: &mut dyn Write) -> Result<i32> {
    ctx.connection.ensure_installed()?;
    emit(
        out,
        format_args!(
            "conditional operations installed in {}",
            ctx.store.root().display()
        ),
    )?;
    Ok(exit_codes::SUCCESS)
}

pub(super) fn cmd_acquire(
    ctx: &StoreContext,
    args: AcquireArgs,
    out: &mut dyn Write,
) -> Result<i32> {
    let lease = ctx.handle(&args.target, args.ttl_ms, args.token)?;

    match lease.acquire()? {
        Some(grant) => {
            emit_json(out, &grant)?;
            Ok(exit_codes::SUCCESS)
        }
        None => {
            emit(out, "false")?;
            Ok(exit_codes::NOT_HELD)
        }
    }
}

pub(super) fn cmd_release(
    ctx: &StoreContext,
    args: ReleaseArgs,
    out: &mut dyn Write,
) -> Result<i32> {
    let lease = ctx.handle(&args.target, None, Some(args.token))?;
    let released = lease.release()?;
    emit(out, released)?;
    Ok(exit_codes::SUCCESS)
}
