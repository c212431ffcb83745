use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output_briefing;

/// Handle `tdg latest`.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let stored = ctx
        .db
        .latest_briefing()
        .await?
        .context("no briefing stored yet; run `tdg run` first")?;
    output_briefing(&stored, flags.format)
}
