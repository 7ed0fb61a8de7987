use anyhow::Context;
use clap::{Parser, Subcommand};
use generator::template::{build_template, TemplateConfig};
use rulcore::Subsystem;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::ConsoleConfig;
use workflow::runner::Runner;

mod generator;
mod report;
mod stub;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Operator console for aircraft subsystem RUL predictions")]
struct Args {
    /// Load console settings from YAML
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Prediction service address
    #[arg(long, env = "RUL_API_BASE", global = true)]
    base_url: Option<String>,
    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict one record from the form defaults, overridden by FIELD=VALUE pairs
    Predict {
        subsystem: Subsystem,
        fields: Vec<String>,
    },
    /// Run a CSV file through the batch pipeline and print the merged rows
    Batch {
        subsystem: Subsystem,
        file: PathBuf,
        /// Print merged rows as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write a CSV template with the required header and synthetic rows
    Template {
        subsystem: Subsystem,
        #[arg(long, default_value_t = 5)]
        rows: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Destination file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Query the prediction service health endpoint
    Health,
    /// Interactive session keeping batch results and KPIs between commands
    Repl,
    /// Serve the loopback stub prediction service (Ctrl+C to stop)
    ServeStub {
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
}

async fn interrupted() {
    let _ = signal::ctrl_c().await;
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = ConsoleConfig::resolve(args.config.as_deref(), args.base_url, args.timeout_secs)?;

    match args.command {
        Command::Template {
            subsystem,
            rows,
            seed,
            output,
        } => {
            let text = build_template(&TemplateConfig::new(subsystem, rows, seed))?;
            match output {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(&path, text)
                        .with_context(|| format!("writing template {}", path.display()))?;
                    println!("{} template written to {}", subsystem.label(), path.display());
                }
                None => print!("{text}"),
            }
        }
        Command::ServeStub { port } => {
            let addr = SocketAddr::from(([127, 0, 0, 1], port));
            stub::serve(addr, interrupted()).await?;
        }
        Command::Health => {
            let runner = Runner::from_config(&config)?;
            println!("{}", runner.health().await?);
        }
        Command::Predict { subsystem, fields } => {
            let mut runner = Runner::from_config(&config)?;
            println!("{}", runner.predict(subsystem, &fields, interrupted()).await?);
        }
        Command::Batch {
            subsystem,
            file,
            json,
        } => {
            let mut runner = Runner::from_config(&config)?;
            let table = runner.batch(subsystem, &file, interrupted()).await?;
            if json {
                println!("{}", runner.rows_json(subsystem)?);
            } else {
                print!("{table}");
            }
        }
        Command::Repl => {
            let mut runner = Runner::from_config(&config)?;
            workflow::repl::run(&mut runner).await?;
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    // One cooperative thread: every suspension point is a network call.
    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating console runtime")?;
    runtime.block_on(run(args))
}
