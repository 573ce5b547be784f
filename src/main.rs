use stagekit::cli::{objectives, ports, run, CommandLine, Commands};
use stagekit::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    init_logging()?;
    tracing::debug!(
        "stagekit {} (built {})",
        stagekit::VERSION,
        stagekit::BUILD_DATE
    );

    match commands.command {
        Commands::Ports => ports::ports(),
        Commands::Objectives { file } => objectives::objectives(&file),
        Commands::Run(args) => run::run(args).await,
    }
}
