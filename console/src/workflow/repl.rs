use crate::workflow::runner::Runner;
use anyhow::{anyhow, bail};
use rulcore::Subsystem;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;

const HELP: &str = "\
commands:
  predict <subsystem> [FIELD=VALUE ...]   single prediction from the form defaults
  batch <subsystem> <file.csv>            run a CSV file through the batch pipeline
  rows <subsystem> [json]                 stored merged rows of the latest batch
  summary                                 KPI cards and batch statistics
  health                                  query the prediction service
  help                                    this text
  quit                                    leave the console
subsystems: engine, hydraulics, landing-gear
Ctrl+C while a request is pending abandons it.";

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Predict {
        subsystem: Subsystem,
        fields: Vec<String>,
    },
    Batch {
        subsystem: Subsystem,
        path: PathBuf,
    },
    Rows {
        subsystem: Subsystem,
        json: bool,
    },
    Summary,
    Health,
    Help,
    Quit,
    Empty,
}

fn subsystem_arg(arg: Option<&str>) -> anyhow::Result<Subsystem> {
    let raw = arg.ok_or_else(|| anyhow!("missing subsystem"))?;
    Ok(raw.parse::<Subsystem>()?)
}

pub fn parse_command(line: &str) -> anyhow::Result<ReplCommand> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(ReplCommand::Empty);
    };
    let command = match verb.to_ascii_lowercase().as_str() {
        "predict" => ReplCommand::Predict {
            subsystem: subsystem_arg(words.next())?,
            fields: words.by_ref().map(str::to_string).collect(),
        },
        "batch" => {
            let subsystem = subsystem_arg(words.next())?;
            let path = words.next().ok_or_else(|| anyhow!("missing file path"))?;
            ReplCommand::Batch {
                subsystem,
                path: PathBuf::from(path),
            }
        }
        "rows" => ReplCommand::Rows {
            subsystem: subsystem_arg(words.next())?,
            json: matches!(words.next(), Some("json")),
        },
        "summary" | "dashboard" => ReplCommand::Summary,
        "health" => ReplCommand::Health,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => bail!("unknown command '{other}' (try 'help')"),
    };
    if let Some(extra) = words.next() {
        bail!("unexpected argument '{extra}'");
    }
    Ok(command)
}

async fn interrupted() {
    let _ = signal::ctrl_c().await;
}

/// Interactive session over stdin. Command failures are printed and the
/// session keeps going; only stdin errors end it.
pub async fn run(runner: &mut Runner) -> anyhow::Result<()> {
    println!("RUL console connected to {} (type 'help')", runner.base_url());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("rul> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let result = match parse_command(&line) {
            Ok(ReplCommand::Quit) => break,
            Ok(ReplCommand::Empty) => continue,
            Ok(ReplCommand::Help) => Ok(HELP.to_string()),
            Ok(ReplCommand::Summary) => Ok(runner.summary()),
            Ok(ReplCommand::Health) => runner.health().await,
            Ok(ReplCommand::Rows { subsystem, json }) => {
                if json {
                    runner.rows_json(subsystem)
                } else {
                    runner.rows(subsystem)
                }
            }
            Ok(ReplCommand::Predict { subsystem, fields }) => {
                runner.predict(subsystem, &fields, interrupted()).await
            }
            Ok(ReplCommand::Batch { subsystem, path }) => {
                runner.batch(subsystem, &path, interrupted()).await
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(output) => println!("{}", output.trim_end()),
            Err(err) => eprintln!("error: {err:#}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_predict_with_overrides() {
        assert_eq!(
            parse_command("predict lg tire_pressure=30 load_during_landing=70").unwrap(),
            ReplCommand::Predict {
                subsystem: Subsystem::LandingGear,
                fields: vec!["tire_pressure=30".into(), "load_during_landing=70".into()],
            }
        );
    }

    #[test]
    fn parses_batch_rows_and_bare_commands() {
        assert_eq!(
            parse_command("batch hydraulics data/hyd.csv").unwrap(),
            ReplCommand::Batch {
                subsystem: Subsystem::Hydraulics,
                path: PathBuf::from("data/hyd.csv"),
            }
        );
        assert_eq!(
            parse_command("rows engine json").unwrap(),
            ReplCommand::Rows {
                subsystem: Subsystem::Engine,
                json: true
            }
        );
        assert_eq!(parse_command("  ").unwrap(), ReplCommand::Empty);
        assert_eq!(parse_command("EXIT").unwrap(), ReplCommand::Quit);
    }

    #[test]
    fn rejects_unknown_commands_and_missing_arguments() {
        assert!(parse_command("launch engine").is_err());
        assert!(parse_command("batch engine").is_err());
        assert!(parse_command("rows").is_err());
        assert!(parse_command("summary now").is_err());
    }
}
