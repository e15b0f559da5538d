use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{LevelFilter, debug};
use mathguard_core::report::{self, format_errors};
use mathguard_core::{
    DelimiterTable, KatexEngine, MacroMap, NoOpEngine, RenderEngine, ValidationResponse,
    Validator, ValidatorConfig, respond, segment,
};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "mathguard")]
#[command(about = "Validate LaTeX math embedded in text", long_about = None)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every math span in a text file
    Check {
        /// Path to the text, or `-` for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the JSON response instead of the report
        #[arg(long)]
        json: bool,

        #[arg(long, value_enum, default_value_t = Strategy::Direct)]
        strategy: Strategy,

        #[command(flatten)]
        validator: ValidatorArgs,
    },
    /// Answer a JSON validation request ({"text", "delimiters"?, "macros"?})
    Request {
        /// Path to the request body, or `-` for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(long, value_enum, default_value_t = EngineKind::Katex)]
        engine: EngineKind,
    },
    /// Print the segmentation of a text file as JSON
    Segments {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// JSON file with `delimiters` and `macros`
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Run both validation strategies and list where they disagree
    Compare {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        validator: ValidatorArgs,
    },
}

#[derive(Args)]
struct ValidatorArgs {
    /// JSON file with `delimiters` and `macros`
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Define a macro, e.g. --macro '\RR=\mathbb{R}' (repeatable)
    #[arg(long = "macro", value_name = "NAME=BODY", value_parser = parse_macro)]
    macros: Vec<(String, String)>,

    #[arg(long, value_enum, default_value_t = EngineKind::Katex)]
    engine: EngineKind,
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    /// Scan the text directly (exact positions, reports unclosed delimiters)
    Direct,
    /// Validate segment by segment
    Segmented,
}

#[derive(Clone, Copy, ValueEnum)]
enum EngineKind {
    /// Render with KaTeX
    Katex,
    /// Accept every span; only delimiters are checked
    #[value(name = "none")]
    NoOp,
}

impl EngineKind {
    fn engine(self) -> &'static dyn RenderEngine {
        match self {
            EngineKind::Katex => &KatexEngine,
            EngineKind::NoOp => &NoOpEngine,
        }
    }
}

impl ValidatorArgs {
    fn load(&self) -> Result<(DelimiterTable, Option<MacroMap>)> {
        let mut config = load_config(self.config.as_deref())?;
        for (name, body) in &self.macros {
            config.define_macro(name.as_str(), body.as_str());
        }
        let table = config
            .delimiter_table()
            .context("invalid delimiter table in config")?;
        Ok((table, config.macros))
    }
}

fn load_config(path: Option<&Path>) -> Result<ValidatorConfig> {
    match path {
        Some(path) => {
            debug!("Loading config from {}", path.display());
            Ok(ValidatorConfig::load(path)?)
        }
        None => Ok(ValidatorConfig::default()),
    }
}

fn parse_macro(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, body)) if !name.is_empty() => Ok((name.to_string(), body.to_string())),
        _ => Err(format!("expected NAME=BODY, got {arg:?}")),
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn exit_status(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Check {
            input,
            json,
            strategy,
            validator,
        } => {
            let text = read_input(input)?;
            let (table, macros) = validator.load()?;
            let checker = Validator::new(validator.engine.engine())
                .with_table(&table)
                .with_macros(macros.as_ref());

            let result = match strategy {
                Strategy::Direct => checker.validate(&text),
                Strategy::Segmented => checker.validate_segmented(&text),
            };
            let valid = result.is_valid;

            if *json {
                let response = ValidationResponse::from(result);
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else if valid {
                println!("{}", report::VALID);
            } else {
                println!("{}", format_errors(&text, &result.errors));
            }
            Ok(exit_status(valid))
        }
        Commands::Request { input, engine } => {
            let body = read_input(input)?;
            let response = respond(&body, engine.engine());
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(exit_status(response.valid))
        }
        Commands::Segments { input, config } => {
            let text = read_input(input)?;
            let table = load_config(config.as_deref())?
                .delimiter_table()
                .context("invalid delimiter table in config")?;
            let segments = segment(&text, &table)?;
            println!("{}", serde_json::to_string_pretty(&segments)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Compare { input, validator } => {
            let text = read_input(input)?;
            let (table, macros) = validator.load()?;
            let comparison = Validator::new(validator.engine.engine())
                .with_table(&table)
                .with_macros(macros.as_ref())
                .compare(&text);

            let disagreements = comparison.disagreements();
            let summary = serde_json::json!({
                "verdictsAgree": comparison.verdicts_agree(),
                "direct": comparison.direct,
                "segmented": comparison.segmented,
                "disagreements": disagreements,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(exit_status(disagreements.is_empty()))
        }
    }
}
