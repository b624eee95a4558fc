use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::models::{PartNumber, Vendor, VendorResult};
use crate::orchestrator::{NoopReporter, SearchOrchestrator};
use crate::report;
use crate::utils::error::{AppError, Result};

/// Looks up programmer socket adapters for electronic part numbers
#[derive(Parser, Debug)]
#[command(name = "socket-finder", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(about = "Run the web UI and search API (default)")]
    Serve(ServeArgs),

    #[command(
        about = "Search one vendor from the command line",
        long_about = "Searches a single vendor site, prints the outcome and overwrites the \
                      result file with a snapshot of it.\n\n\
                      Examples:\n  \
                      socket-finder search AT89C51\n  \
                      socket-finder search AT89C51AC --site bpmicro -o result.txt"
    )]
    Search(SearchArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    #[arg(long, help = "Address to bind (overrides configuration)")]
    pub host: Option<String>,

    #[arg(short, long, help = "Port to listen on (overrides configuration)")]
    pub port: Option<u16>,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[arg(value_name = "PART_NUMBER")]
    pub part_number: String,

    #[arg(short, long, value_enum, default_value = "systemgeneral", help = "Vendor site to search")]
    pub site: SiteArg,

    #[arg(short, long, value_name = "FILE", help = "Result file (defaults to the configured path)")]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteArg {
    Systemgeneral,
    Dataio,
    Bpmicro,
}

impl From<SiteArg> for Vendor {
    fn from(site: SiteArg) -> Self {
        match site {
            SiteArg::Systemgeneral => Vendor::SystemGeneral,
            SiteArg::Dataio => Vendor::DataIo,
            SiteArg::Bpmicro => Vendor::BpMicro,
        }
    }
}

/// Runs a one-off search, prints the summary and writes the result file.
pub async fn run_search(
    orchestrator: &SearchOrchestrator,
    args: &SearchArgs,
    default_output: &str,
) -> Result<VendorResult> {
    let part_number = PartNumber::new(&args.part_number)?;
    let vendor = Vendor::from(args.site);

    println!("Searching {} for part number: {}", vendor, part_number);
    let mut results = orchestrator.run(&part_number, &[vendor], &NoopReporter).await?;
    let result = results
        .pop()
        .ok_or_else(|| AppError::Internal(format!("No result returned for {}", vendor)))?;

    println!("{}", report::render_console_summary(&part_number, &result));

    let output = args.output.clone().unwrap_or_else(|| PathBuf::from(default_output));
    report::write_result_file(&output, &part_number, &result).await?;

    Ok(result)
}
