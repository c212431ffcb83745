use crate::cli::GlobalFlags;
use crate::cli::root_commands::ArchiveArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `tdg archive`.
pub async fn handle(args: &ArchiveArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let entries = ctx.db.list_archive(args.limit).await?;
    output(&entries, flags.format)
}
