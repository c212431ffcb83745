use tide_llm::{ChatClient, ModelExtractor, ModelSynthesizer};
use tide_pipeline::{BriefingPipeline, PipelineSettings, RunOptions};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RunArgs;
use crate::context::AppContext;
use crate::output::output_briefing;
use crate::progress::Progress;

fn run_options(args: &RunArgs) -> RunOptions {
    RunOptions {
        window_start: args.window_start,
        window_end: args.window_end,
        window_hours: args.window_hours,
        max_emails: args.max_emails,
        map_batch_size: args.batch_size,
    }
}

/// Handle `tdg run`.
pub async fn handle(args: &RunArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let llm = &ctx.config.llm;
    llm.ensure_configured()?;

    let client = ChatClient::from_config(llm)?;
    let pipeline = BriefingPipeline::new(
        &ctx.db,
        ModelExtractor::new(client.clone(), llm),
        ModelSynthesizer::new(client, llm),
        PipelineSettings::from(&ctx.config.pipeline),
    );

    let progress = Progress::spinner("generating briefing");
    match pipeline.run(&run_options(args)).await {
        Ok(stored) => {
            progress.finish_ok(&format!(
                "stored {} from {} newsletters",
                stored.id, stored.email_count
            ));
            output_briefing(&stored, flags.format)
        }
        Err(error) => {
            progress.finish_err("briefing run failed");
            Err(error.into())
        }
    }
}
