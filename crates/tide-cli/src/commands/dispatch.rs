use crate::cli::{Commands, GlobalFlags};
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Run(args) => commands::run::handle(&args, ctx, flags).await,
        Commands::Latest => commands::latest::handle(ctx, flags).await,
        Commands::Get(args) => commands::get::handle(&args, ctx, flags).await,
        Commands::Archive(args) => commands::archive::handle(&args, ctx, flags).await,
        Commands::Ingest(args) => commands::ingest::handle(&args, ctx, flags).await,
    }
}
