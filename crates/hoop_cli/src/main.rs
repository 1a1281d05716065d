//! Hoop CLI
//!
//! Session JSON (detections, keypoints, team labels) -> analysis report JSON

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "hoop")]
#[command(about = "Basketball possession, pass and motion analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Analyze one session file
    Analyze {
        /// Input session JSON file path
        #[arg(long)]
        input: PathBuf,

        /// Analysis config YAML (defaults to $HOOP_CONFIG, then built-in defaults)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output report JSON file path
        #[arg(long)]
        out: Option<PathBuf>,

        /// Run twice and fail if the report digests differ
        #[arg(long, default_value = "false")]
        verify: bool,
    },

    /// Load and validate a config file
    CheckConfig {
        /// Analysis config YAML
        #[arg(long)]
        config: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hoop=info,hoop_cli=info,hoop_core=info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { input, config, out, verify } => {
            println!("🏀 Analyzing session...");
            println!("   Input:  {}", input.display());

            let session = hoop_cli::load_session(&input)?;
            let config = hoop_cli::load_config(config.as_deref())?;
            let analysis = hoop_cli::run_analysis(&session, &config)?;
            let summary = hoop_cli::summarize(&analysis)?;

            print_summary(&summary);

            if verify {
                verify_determinism(&session, &config, &summary.digest)?;
            }

            if let Some(out) = out {
                hoop_cli::write_report(&out, &analysis)?;
                println!("\n📄 Report saved to: {}", out.display());
            }
        }

        Commands::CheckConfig { config } => {
            let cfg = hoop_cli::load_config(Some(config.as_path()))?;
            println!("✅ Config OK: {}", config.display());
            println!("   Possession threshold: {:.1} px", cfg.possession.distance_threshold_px);
            println!("   Grace frames:         {}", cfg.possession.grace_frames);
            println!("   Max event gap:        {} frames", cfg.events.max_gap_frames);
            println!("   FPS:                  {:.2}", cfg.motion.fps);
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn print_summary(summary: &hoop_cli::ReportSummary) {
    println!("\n✅ Analysis complete (hoop_core {})", summary.core_version);
    println!("   Frames:        {}", summary.frames);
    println!("   Possessions:   {}", summary.possessions);
    println!("   Passes:        {}", summary.passes);
    println!("   Interceptions: {}", summary.interceptions);
    println!("   Tracks:        {}", summary.tracks);
    println!("   Digest:        {}", summary.digest);
}

#[cfg(feature = "cli")]
fn verify_determinism(
    session: &hoop_cli::Session,
    config: &hoop_core::AnalysisConfig,
    expected: &str,
) -> Result<()> {
    println!("\n🔍 Verifying determinism...");
    let rerun = hoop_cli::summarize(&hoop_cli::run_analysis(session, config)?)?;

    if rerun.digest == expected {
        println!("✅ Rerun digest matches");
        Ok(())
    } else {
        anyhow::bail!("❌ Rerun digest mismatch: {} != {}", rerun.digest, expected)
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("hoop CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
