use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use textcore::logging::{self, Logger};
use textcore::script::EditScript;
use textcore::CoreConfig;

const USAGE: &str = "usage: textcore replay <script.json> [--config <path>]";

struct Options {
    script: PathBuf,
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// 再生して一致していれば `true`
fn run() -> anyhow::Result<bool> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_args(&args)?;

    let config = CoreConfig::load_or_default(options.config.as_deref())
        .context("failed to load configuration")?;
    logging::init(Logger::new(logging::parse_level(&config.log_level)));

    let raw = std::fs::read_to_string(&options.script)
        .with_context(|| format!("failed to read {}", options.script.display()))?;
    let script = EditScript::from_json(&raw).context("failed to parse edit script")?;
    let report = script.replay(&config)?;

    println!("{}", report.text);
    match report.divergence {
        None => {
            eprintln!("{} steps applied, all representations agree", report.steps_applied);
            Ok(true)
        }
        Some(divergence) => {
            eprintln!("representations diverged at step {}", divergence.step);
            for (repr, text) in divergence.texts {
                eprintln!("  {:<12} {:?}", repr.name(), text);
            }
            Ok(false)
        }
    }
}

fn parse_args(args: &[String]) -> anyhow::Result<Options> {
    let mut iter = args.iter();
    match iter.next().map(String::as_str) {
        Some("replay") => {}
        _ => bail!(USAGE),
    }

    let mut script = None;
    let mut config = None;
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => match iter.next() {
                Some(path) => config = Some(PathBuf::from(path)),
                None => bail!("--config requires a path\n{}", USAGE),
            },
            other if script.is_none() && !other.starts_with('-') => {
                script = Some(PathBuf::from(other));
            }
            other => bail!("unexpected argument: {}\n{}", other, USAGE),
        }
    }

    match script {
        Some(script) => Ok(Options { script, config }),
        None => bail!(USAGE),
    }
}
