use clap::{Parser, Subcommand};
use nse_dashboard::ServerConfig;
use std::path::PathBuf;

/// NSE closing-price forecasting dashboard
#[derive(Parser)]
#[command(name = "nse-dashboard", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the dashboard over HTTP
    Serve(ServerConfig),

    /// Run a forecast page on a file and print its JSON
    Forecast {
        /// Exchange export (.csv, .txt or .xlsx)
        file: PathBuf,

        /// Forecast 1-31 days ahead
        #[arg(long, conflicts_with = "years", required_unless_present = "years")]
        days: Option<u32>,

        /// Forecast 1-10 years ahead, with MACD and RSI
        #[arg(long)]
        years: Option<u32>,

        /// Include the long-range forecast table and figures
        #[arg(long, requires = "years")]
        detail: bool,
    },

    /// Load a file and print its preview, columns and coercion report
    Inspect {
        /// Exchange export (.csv, .txt or .xlsx)
        file: PathBuf,

        /// Rows to preview
        #[arg(long, default_value_t = 5)]
        rows: usize,
    },
}
