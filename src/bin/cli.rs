// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Hotuiti Contributors

//! Hotuiti CLI

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use hotuiti::analysis::pipeline::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_FACTOR};
use hotuiti::io::{load_mesh, MeshFormat};
use hotuiti::report::{describe_lean, ConsoleReporter, HtmlReporter, RasterReporter, ReportContext, Reporter};
use hotuiti::{analyze, analyze_with_retry, AnalysisConfig, AnalysisReport, BoundaryMethod, FrontAxis, MassModel, Mesh};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "hotuiti")]
#[command(version, about = "Statue center of mass and static stability analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all logging
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one mesh and print a summary
    Analyze {
        /// Input STL or OBJ file
        input: PathBuf,

        #[command(flatten)]
        options: AnalysisArgs,

        /// Print the report as JSON instead of the summary
        #[arg(long)]
        json: bool,

        /// Write a PNG figure
        #[arg(long, value_name = "FILE")]
        png: Option<PathBuf>,

        /// Write an interactive HTML figure
        #[arg(long, value_name = "FILE")]
        html: Option<PathBuf>,
    },

    /// Print only the lean of a mesh
    Lean {
        /// Input STL or OBJ file
        input: PathBuf,

        #[command(flatten)]
        options: AnalysisArgs,
    },

    /// Analyze every STL and OBJ file under a directory
    Batch {
        /// Directory to scan
        dir: PathBuf,

        #[command(flatten)]
        options: AnalysisArgs,

        /// Write all reports to a JSON file
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Show the effective configuration, or write it to a file
    Config {
        #[command(flatten)]
        options: AnalysisArgs,

        /// Write the configuration to this file instead of printing it
        #[arg(long, value_name = "FILE")]
        init: Option<PathBuf>,
    },
}

/// Options shared by every analysis command; flags override the config file
#[derive(Args, Clone)]
struct AnalysisArgs {
    /// Configuration file (defaults to ./hotuiti.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Model units to meters
    #[arg(short, long)]
    scale: Option<f64>,

    /// Use the reference moai scale
    #[arg(long, conflicts_with = "scale")]
    moai: bool,

    /// Base band height as a fraction of total height
    #[arg(short, long)]
    tolerance: Option<f64>,

    /// Trace the outline from a slice this fraction of the height above the base
    #[arg(long, value_name = "FRACTION")]
    slice: Option<f64>,

    /// Footprint tracer: hull, radial[:BINS], grid[:RES[:SMOOTH]]
    #[arg(short, long)]
    boundary: Option<BoundaryMethod>,

    /// Direction the statue faces: +x, -x, +z, -z
    #[arg(short, long, allow_hyphen_values = true)]
    front: Option<FrontAxis>,

    /// Center of mass model: surface or solid
    #[arg(short, long)]
    model: Option<MassModel>,

    /// Widen the base band and retry when the footprint is too thin
    #[arg(long)]
    retry: bool,
}

impl AnalysisArgs {
    fn config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = AnalysisConfig::from_file(path)?;
                config.apply_env_overrides()?;
                config
            }
            None => AnalysisConfig::load()?,
        };

        if self.moai {
            config.scale_factor = hotuiti::config::MOAI_SCALE_FACTOR;
        }
        if let Some(scale) = self.scale {
            config.scale_factor = scale;
        }
        if let Some(tolerance) = self.tolerance {
            config.base_tolerance = tolerance;
        }
        if let Some(fraction) = self.slice {
            config.outline_slice = Some(fraction);
        }
        if let Some(boundary) = self.boundary {
            config.boundary = boundary;
        }
        if let Some(front) = self.front {
            config.front_axis = front;
        }
        if let Some(model) = self.model {
            config.mass_model = model;
        }

        config.validate()?;
        Ok(config)
    }

    fn run(&self, mesh: &Mesh, config: &AnalysisConfig) -> Result<AnalysisReport> {
        let report = if self.retry {
            analyze_with_retry(mesh, config, DEFAULT_RETRY_FACTOR, DEFAULT_RETRY_ATTEMPTS)?
        } else {
            analyze(mesh, config)?
        };
        Ok(report)
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "hotuiti=info",
            2 => "hotuiti=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match &cli.command {
        Commands::Analyze {
            input,
            options,
            json,
            png,
            html,
        } => analyze_command(input, options, *json, png.as_deref(), html.as_deref()),
        Commands::Lean { input, options } => lean_command(input, options),
        Commands::Batch { dir, options, out } => batch_command(dir, options, out.as_deref()),
        Commands::Config { options, init } => config_command(options, init.as_deref()),
    }
}

fn load(input: &Path) -> Result<Mesh> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }
    load_mesh(input)
}

fn title_of(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("statue")
        .to_string()
}

fn analyze_command(
    input: &Path,
    options: &AnalysisArgs,
    json: bool,
    png: Option<&Path>,
    html: Option<&Path>,
) -> Result<()> {
    let config = options.config()?;
    let mesh = load(input)?;
    let report = options
        .run(&mesh, &config)
        .with_context(|| format!("Failed to analyze {}", input.display()))?
        .with_source(input.display().to_string());

    let title = title_of(input);
    let ctx = ReportContext::new(&mesh, &report, &title);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        ConsoleReporter.print_summary(&ctx)?;
    }

    if let Some(path) = png {
        RasterReporter::default().render_static(&ctx, path)?;
        println!("{} {}", "Figure:".bright_black(), path.display().to_string().cyan());
    }
    if let Some(path) = html {
        HtmlReporter.render_interactive(&ctx, path)?;
        println!("{} {}", "Interactive:".bright_black(), path.display().to_string().cyan());
    }

    Ok(())
}

fn lean_command(input: &Path, options: &AnalysisArgs) -> Result<()> {
    let config = options.config()?;
    let mesh = load(input)?;
    let report = options.run(&mesh, &config)?;

    println!(
        "{} {} ({:.2}° total, {:+.2}° forward, {:+.2}° lateral)",
        format!("{}:", title_of(input)).bold(),
        describe_lean(&report),
        report.lean_angle_deg,
        report.forward_lean_deg,
        report.lateral_lean_deg
    );
    println!(
        "  {} {:.4} along the front axis, {:.4} to the side",
        "Offset:".bright_black(),
        report.longitudinal_offset,
        report.lateral_offset
    );
    Ok(())
}

fn batch_command(dir: &Path, options: &AnalysisArgs, out: Option<&Path>) -> Result<()> {
    if !dir.is_dir() {
        bail!("Not a directory: {}", dir.display());
    }
    let config = options.config()?;

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| MeshFormat::from_path(path).is_some())
        .collect();
    files.sort();

    if files.is_empty() {
        warn!("No STL or OBJ files under {}", dir.display());
        return Ok(());
    }

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    // Analyze in parallel; output order still follows the sorted file list
    let results: Vec<Result<AnalysisReport>> = files
        .par_iter()
        .map(|path| {
            progress.set_message(title_of(path));
            let result = load_mesh(path).and_then(|mesh| options.run(&mesh, &config));
            progress.inc(1);
            result
        })
        .collect();
    progress.finish_and_clear();

    let mut reports = Vec::new();
    let mut failed = 0;
    for (path, result) in files.iter().zip(results) {
        match result {
            Ok(report) => {
                let verdict = if report.stable {
                    "stable".green()
                } else {
                    "UNSTABLE".red()
                };
                println!(
                    "{:<40} {:>9} {:>6.1}% {:>7.2}°",
                    path.strip_prefix(dir).unwrap_or(path).display(),
                    verdict,
                    report.height_fraction,
                    report.lean_angle_deg
                );
                reports.push(report.with_source(path.display().to_string()));
            }
            Err(err) => {
                error!("{}: {:#}", path.display(), err);
                println!("{:<40} {:>9}", path.display(), "error".yellow());
                failed += 1;
            }
        }
    }

    let unstable = reports.iter().filter(|r| !r.stable).count();
    println!(
        "\n{} analyzed, {} unstable, {} failed",
        reports.len(),
        unstable,
        failed
    );

    if let Some(path) = out {
        let json = serde_json::to_string_pretty(&reports)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write reports to {}", path.display()))?;
    }

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn config_command(options: &AnalysisArgs, init: Option<&Path>) -> Result<()> {
    let config = options.config()?;
    match init {
        Some(path) => {
            config.save(path)?;
            println!("{} {}", "Wrote".green(), path.display());
        }
        None => print!("{}", toml::to_string_pretty(&config)?),
    }
    Ok(())
}
