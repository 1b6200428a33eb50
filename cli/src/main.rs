use std::fs;
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use mdblock_core::{
    Finding, Outcome, OutcomeState, Overrides, Severity, SeverityConfig, check_schema, emit,
    normalize,
};
use mdblock_input::{InputKind, guess_input_kind, load_tsv, load_yaml};

// Exit codes: 0 all inputs pass, 1 lint errors found, 2 usage or I/O
// failure.
const EXIT_FAIL: i32 = 1;
const EXIT_USAGE: i32 = 2;

#[derive(Debug, Parser)]
#[command(name = "mdblock", version)]
#[command(about = "Lint and convert Dataverse metadata block definitions")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check metadata block files and report findings.
    Check(CheckArgs),
    /// Convert a YAML metadata block definition to TSV.
    Convert(ConvertArgs),
}

/// Severity overrides shared by both subcommands. Rules may be named
/// by their short code ("e004") or full name ("no_trailing_spaces").
#[derive(Debug, Args)]
struct RuleOverrideArgs {
    /// Rules to skip entirely.
    #[arg(long, value_name = "RULE")]
    skip: Vec<String>,

    /// Rules to demote to warning severity.
    #[arg(long, value_name = "RULE")]
    warn: Vec<String>,

    /// Rules to promote to error severity.
    #[arg(long, value_name = "RULE")]
    error: Vec<String>,
}

impl RuleOverrideArgs {
    fn resolve(&self) -> Result<SeverityConfig, mdblock_core::ConfigError> {
        SeverityConfig::resolve(&Overrides {
            skip: self.skip.clone(),
            warn: self.warn.clone(),
            error: self.error.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Files to check (.yml, .yaml, or .tsv).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Report format.
    #[arg(long, default_value = "text")]
    format: ReportFormat,

    #[command(flatten)]
    overrides: RuleOverrideArgs,
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// YAML metadata block definition.
    input: PathBuf,

    /// Output TSV path (default: the input path with a .tsv extension).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Withhold the TSV when warnings remain, not only on errors.
    #[arg(long)]
    strict: bool,

    #[command(flatten)]
    overrides: RuleOverrideArgs,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Convert(args) => run_convert(args),
    };
    exit(code);
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into()),
        1 => "mdblock=debug,mdblock_core=debug,mdblock_input=debug".into(),
        _ => "trace".into(),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_check(args: CheckArgs) -> i32 {
    let config = match args.overrides.resolve() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return EXIT_USAGE;
        }
    };

    let mut results = Vec::new();
    for path in &args.inputs {
        match check_file(path, &config) {
            Ok(outcome) => results.push((path, outcome)),
            Err(err) => {
                eprintln!("error: {}: {err}", path.display());
                return EXIT_USAGE;
            }
        }
    }

    match args.format {
        ReportFormat::Text => {
            for (index, (path, outcome)) in results.iter().enumerate() {
                if index > 0 {
                    println!();
                }
                print_text_report(path, outcome);
            }
        }
        ReportFormat::Json => {
            let report: Vec<_> = results
                .iter()
                .map(|(path, outcome)| {
                    serde_json::json!({
                        "path": path.display().to_string(),
                        "state": outcome.state(),
                        "errors": outcome.error_count(),
                        "warnings": outcome.warning_count(),
                        "findings": outcome.findings,
                    })
                })
                .collect();
            // Serialization of plain data cannot fail.
            println!("{}", serde_json::to_string_pretty(&report).unwrap());
        }
    }

    if results.iter().any(|(_, o)| o.state() == OutcomeState::Fail) {
        EXIT_FAIL
    } else {
        0
    }
}

fn run_convert(args: ConvertArgs) -> i32 {
    let config = match args.overrides.resolve() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return EXIT_USAGE;
        }
    };

    let (kind, _) = guess_input_kind(&args.input);
    if kind != Some(InputKind::Yaml) {
        eprintln!(
            "error: convert expects a YAML input (.yml or .yaml), got '{}'",
            args.input.display()
        );
        return EXIT_USAGE;
    }

    let source = match fs::read_to_string(&args.input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: {}: {err}", args.input.display());
            return EXIT_USAGE;
        }
    };
    let document = match load_yaml(&source) {
        Ok(document) => document,
        Err(err) => {
            eprintln!("error: {}: {err}", args.input.display());
            return EXIT_USAGE;
        }
    };

    let schema = normalize(document);
    let findings = check_schema(&schema, &config);
    let outcome = Outcome::resolve(findings, &config);
    print_text_report(&args.input, &outcome);

    if outcome.state() == OutcomeState::Fail
        || (args.strict && outcome.state() == OutcomeState::PassWithWarnings)
    {
        eprintln!("Errors detected. No TSV file was written.");
        return EXIT_FAIL;
    }

    let tsv = match emit(&schema, &outcome) {
        Ok(tsv) => tsv,
        Err(err) => {
            eprintln!("error: {err}");
            return EXIT_FAIL;
        }
    };
    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension("tsv"));
    if let Err(err) = fs::write(&output, tsv) {
        eprintln!("error: {}: {err}", output.display());
        return EXIT_USAGE;
    }
    println!("Wrote {}", output.display());
    0
}

/// Loads, normalizes, and checks a single file. Format guesses and
/// parse failures surface as findings so that broken input and broken
/// content read the same way in reports.
fn check_file(path: &Path, config: &SeverityConfig) -> Result<Outcome, std::io::Error> {
    let (kind, mut findings) = guess_input_kind(path);
    let Some(kind) = kind else {
        return Ok(Outcome::resolve(findings, config));
    };

    let source = fs::read_to_string(path)?;
    let parsed = match kind {
        InputKind::Yaml => load_yaml(&source),
        InputKind::Tsv => load_tsv(&source),
    };
    match parsed {
        Ok(document) => {
            let schema = normalize(document);
            debug!(path = %path.display(), blocks = schema.blocks.len(), "checking schema");
            findings.extend(check_schema(&schema, config));
        }
        Err(err) => findings.push(Finding::new(
            "document_parse",
            "i002",
            Severity::Error,
            err.to_string(),
        )),
    }
    Ok(Outcome::resolve(findings, config))
}

fn print_text_report(path: &Path, outcome: &Outcome) {
    let heading = path.display().to_string();
    println!("{heading}");
    println!("{}", "-".repeat(heading.len()));
    for finding in &outcome.findings {
        println!("{finding}");
    }
    println!(
        "{} error(s), {} warning(s): {}",
        outcome.error_count(),
        outcome.warning_count(),
        outcome.state()
    );
}
