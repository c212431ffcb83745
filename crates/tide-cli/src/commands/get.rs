use tide_core::errors::CoreError;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::GetArgs;
use crate::context::AppContext;
use crate::output::output_briefing;

/// Handle `tdg get <id>`.
pub async fn handle(args: &GetArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let stored = ctx
        .db
        .get_briefing(&args.id)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity_type: "briefing".into(),
            id: args.id.clone(),
        })?;
    output_briefing(&stored, flags.format)
}
