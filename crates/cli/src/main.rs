use clap::Parser;
use hmi_arbiter::{
    cli::Cli,
    daemon::{self, ConfigSource},
};
use std::io::Write;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "jemalloc")]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let filter = EnvFilter::builder()
        .with_default_directive(cli.verbosity.tracing_level_filter().into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    debug!(config = ?cli);

    let source = ConfigSource {
        conffile: cli.conffile,
        statefile: cli.statefile,
    };
    let config = source.load()?;

    if cli.dump_config {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "{}", config.to_toml()?)?;
        return Ok(());
    }

    daemon::run(source, config).await?;
    Ok(())
}
