//! Middleware shipped with the crate.

use crate::context::Context;
use crate::handler::Handler;
use std::time::Instant;
use tracing::info;

/// Logs method, path, final status and elapsed time of every request it wraps.
pub fn logger() -> impl Handler {
    |ctx: &mut Context| {
        let start = Instant::now();
        ctx.next();
        info!(
            method = %ctx.method(),
            path = %ctx.path(),
            status = ctx.response_status().as_u16(),
            elapsed = ?start.elapsed(),
            "request handled"
        );
    }
}
