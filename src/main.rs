use anyhow::Result;
use clap::Parser;
use nse_dashboard::{api, logging, offline};

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    logging::init_logging();

    match cli.command {
        cli::Command::Serve(config) => api::serve(config).await,
        cli::Command::Forecast {
            file,
            days,
            years,
            detail,
        } => {
            let horizon = offline::Horizon::from_flags(days, years, detail)?;
            let view = tokio::task::spawn_blocking(move || offline::forecast(&file, horizon)).await??;
            println!("{}", serde_json::to_string_pretty(&view)?);
            Ok(())
        }
        cli::Command::Inspect { file, rows } => {
            let summary = offline::inspect(&file, rows)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}
