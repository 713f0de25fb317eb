use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pump_curves::{
    config::AnalysisConfig,
    models::pump::format_rpm,
    project::Project,
    report::{self, PersistenceError, Report},
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Pump curve analysis and reporting", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the workbook report for a project
    Report(ReportArgs),
    /// Print the operating points of a project
    OperatingPoints(OperatingPointsArgs),
    /// Derive a rotor at a new speed with the affinity laws
    Scale(ScaleArgs),
}

#[derive(Parser, Debug)]
struct ReportArgs {
    /// Project file (TOML)
    #[arg(value_hint = ValueHint::FilePath)]
    project: PathBuf,

    /// Output workbook path (defaults next to the project)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Analysis settings (TOML)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Accept the fallback path without asking if the output cannot be written
    #[arg(short, long, action = ArgAction::SetTrue)]
    yes: bool,
}

#[derive(Parser, Debug)]
struct OperatingPointsArgs {
    /// Project file (TOML)
    #[arg(value_hint = ValueHint::FilePath)]
    project: PathBuf,

    /// Analysis settings (TOML)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ScaleArgs {
    /// Project file (TOML)
    #[arg(value_hint = ValueHint::FilePath)]
    project: PathBuf,

    /// Source rotor name
    #[arg(long)]
    rotor: String,

    /// New rotational speed (rpm)
    #[arg(long)]
    rpm: f64,

    /// Where to write the updated project (defaults to overwriting the input)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Analysis settings (TOML)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Report(args) => handle_report(args),
        Command::OperatingPoints(args) => handle_operating_points(args),
        Command::Scale(args) => handle_scale(args),
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    AnalysisConfig::load_or_default(path).context("failed to load analysis settings")
}

fn load_report(project: &Path, config: &AnalysisConfig) -> Result<Report> {
    let session = Project::load(project)
        .and_then(|p| p.into_session(config))
        .with_context(|| format!("failed to read project {}", project.display()))?;
    let report = report::assemble_report(&session, config)?;
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    Ok(report)
}

fn handle_report(args: ReportArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let report = load_report(&args.project, &config)?;

    let output = args
        .output
        .unwrap_or_else(|| args.project.with_extension("xlsx"));
    let yes = args.yes;
    let written = report::write_report(&report, &output, |fallback, err| {
        yes || ask_fallback(fallback, err)
    })
    .with_context(|| format!("failed to write report {}", output.display()))?;

    info!(path = %written.display(), "report complete");
    println!("{}", written.display());
    Ok(())
}

fn ask_fallback(fallback: &Path, err: &PersistenceError) -> bool {
    eprint!(
        "{err}. Save to {} instead? [y/N] ",
        fallback.display()
    );
    if io::stderr().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes" | "s" | "sim")
}

fn handle_operating_points(args: OperatingPointsArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let report = load_report(&args.project, &config)?;

    if report.intersections.is_empty() {
        warn!("no system curve configured");
        return Ok(());
    }

    let mut out = io::stdout().lock();
    for block in &report.intersections {
        writeln!(out, "System curve {}", block.system_curve)?;
        if block.points.is_empty() {
            writeln!(out, "  no operating points")?;
            continue;
        }
        writeln!(
            out,
            "  {:<28} {:>10} {:>10} {:>8} {:>12} {:>12}",
            "rotor", "Q (m³/h)", "H (m)", "η (%)", "P_hyd (W)", "P_mec (W)"
        )?;
        for point in &block.points {
            writeln!(
                out,
                "  {:<28} {:>10.2} {:>10.2} {:>8.2} {:>12.1} {:>12.1}",
                point.rotor,
                point.flow,
                point.head,
                point.efficiency,
                point.hydraulic_watts(),
                point.mechanical_watts()
            )?;
        }
    }
    Ok(())
}

fn handle_scale(args: ScaleArgs) -> Result<()> {
    if !(args.rpm.is_finite() && args.rpm > 0.0) {
        bail!("speed must be positive and finite, got {}", format_rpm(args.rpm));
    }
    let config = load_config(args.config.as_deref())?;

    let mut project = Project::load(&args.project)
        .with_context(|| format!("failed to read project {}", args.project.display()))?;
    let name = project
        .add_speed_variant(&args.rotor, args.rpm, &config)
        .with_context(|| format!("failed to scale rotor `{}`", args.rotor))?;

    let output = args.output.unwrap_or(args.project);
    project
        .save(&output)
        .with_context(|| format!("failed to write project {}", output.display()))?;

    info!(rotor = %name, path = %output.display(), "added speed variant");
    println!("{name}");
    Ok(())
}
