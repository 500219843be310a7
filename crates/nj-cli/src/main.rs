mod cli;
mod input;
mod transcode;

use clap::Parser;
use tracing::info;

use nj_core::Dispatcher;
use nj_model::JobSeq;
use nj_observe::logger_init;

use crate::cli::{Cli, ReportFormat};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1) Logger
    logger_init(&cli.logger_config())?;
    info!(target: "nj.cli", "logger initialized");

    // 2) Jobs and hosts
    let seq = JobSeq::new();
    let jobs = match &cli.dir {
        Some(dir) => transcode::jobs(dir, &seq)?,
        None => input::read_jobs(&cli.jobs, &seq)?,
    };
    let hosts = input::read_list(&cli.hosts)?;

    // 3) Transport + dispatcher
    let transport = cli.transport();
    let cfg = cli.dispatch_config();
    info!(
        target: "nj.cli",
        hosts = hosts.len(),
        jobs = seq.issued(),
        transport = transport.name(),
        on_failure = %cfg.failure,
        "starting run"
    );
    let mut dispatcher = Dispatcher::new(hosts, jobs, transport, cfg);

    // 4) Run to completion
    let report = dispatcher.run().await?;
    if !cli.quiet {
        match cli.report {
            ReportFormat::Text => println!("{report}"),
            ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        }
    }
    Ok(())
}
