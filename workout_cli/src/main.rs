use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use workout_core::*;

#[derive(Parser)]
#[command(name = "wktc")]
#[command(about = "Structured workout compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a workout description and write the encoder handoff
    Compile {
        /// Workout description (.yaml, .yml or .json)
        file: PathBuf,

        /// Output directory (defaults to [output].dir, then the current dir)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Dry run - compile and show the summary without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate a workout description without writing anything
    Check {
        /// Workout description (.yaml, .yml or .json)
        file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Handoff document for the binary encoder
    Json,
    /// Flat record table
    Csv,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        workout_core::logging::init_with_level("debug");
    } else {
        workout_core::logging::init();
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Compile(err)) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Compile {
            file,
            out,
            format,
            dry_run,
        } => cmd_compile(&file, out, format, dry_run, &config),
        Commands::Check { file } => cmd_check(&file, &config),
    }
}

fn cmd_compile(
    file: &Path,
    out: Option<PathBuf>,
    format: OutputFormat,
    dry_run: bool,
    config: &Config,
) -> Result<()> {
    let compiled = compile_file(file, config)?;
    display_workout(&compiled);

    if dry_run {
        println!("\n[Dry run - nothing written]");
        return Ok(());
    }

    let out_dir = out
        .or_else(|| config.output.dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let path = out_dir.join(format!("{}.{}", compiled.file_stem(), format.extension()));

    match format {
        OutputFormat::Json => {
            Handoff::new(compiled, chrono::Utc::now()).write(&path)?;
        }
        OutputFormat::Csv => {
            workout_core::table::write_records_to(&path, &compiled)?;
        }
    }

    println!("\n✓ Wrote {}", path.display());
    Ok(())
}

fn cmd_check(file: &Path, config: &Config) -> Result<()> {
    let compiled = compile_file(file, config)?;
    display_workout(&compiled);
    println!("\n✓ {} is valid", file.display());
    Ok(())
}

fn compile_file(file: &Path, config: &Config) -> Result<CompiledWorkout> {
    let document = load_document(file)?;
    let workout = parse_workout(&document, &config.workout_defaults())?;
    tracing::debug!(
        "Parsed {:?}: version {}, {} top-level steps",
        file,
        workout.version,
        workout.steps.len()
    );
    let compiled = assemble(&workout, &config.compile_settings())?;
    Ok(compiled)
}

/// Read a description file into a generic document tree
///
/// `.json` files go through serde_json, everything else through serde_yaml.
fn load_document(path: &Path) -> Result<serde_json::Value> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Other(format!("failed to read {}: {}", path.display(), e)))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    tracing::debug!(
        "Reading {:?} as {}",
        path,
        if is_json { "JSON" } else { "YAML" }
    );

    if is_json {
        Ok(serde_json::from_str(&contents)?)
    } else {
        serde_yaml::from_str(&contents)
            .map_err(|e| Error::Other(format!("YAML error in {}: {}", path.display(), e)))
    }
}

fn display_workout(compiled: &CompiledWorkout) {
    let summary = compiled.summary();

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", compiled.header.name);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Sport: {:?}", compiled.header.sport);
    println!("  Steps: {}", summary.steps);
    println!("  Repeat controllers: {}", summary.controllers);
    println!("  Description chunks: {}", summary.description_chunks);
    println!("  Note chunks: {}", summary.note_chunks);
    println!();

    for record in &compiled.records {
        match record {
            CompiledRecord::Step(step) => {
                println!(
                    "  {:>3}  {:<15}  {:?} {:?}={} {:?}={} [{}-{}]",
                    step.index,
                    step.name,
                    step.intensity,
                    step.duration_kind,
                    step.duration_value,
                    step.target.kind,
                    step.target.value,
                    step.target.custom_low,
                    step.target.custom_high
                );
            }
            CompiledRecord::RepeatController(controller) => {
                println!(
                    "  {:>3}  ↻ repeat from {} ({} total, encoded {})",
                    controller.index,
                    controller.start_index,
                    controller.total_repeats,
                    controller.repeat_value
                );
            }
        }
    }
}
