use anyhow::Context;
use clap::Parser;
use paidsearch_did::config::InputSource;
use paidsearch_did::core::report::summary_lines;
use paidsearch_did::core::ConfigProvider;
use paidsearch_did::utils::{logger, validation::Validate};
use paidsearch_did::{AnalysisEngine, DidPipeline, LocalStorage, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-did")]
#[command(about = "Run the DID analysis from a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "did-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    logger::init_logger(config.log_format(), args.verbose);
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config)?;

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No files will be read or written");
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = DidPipeline::new(LocalStorage::default(), config);
    let engine = AnalysisEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(outcome) => {
            for line in summary_lines(&outcome.estimate) {
                println!("{}", line);
            }
            println!("📁 Output saved to: {}", outcome.output_path);
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ DID analysis failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code().max(1));
        }
    }
}

fn display_config_summary(config: &TomlConfig) -> anyhow::Result<()> {
    println!("📋 Configuration Summary:");
    println!("  Analysis: {}", config.analysis.name);
    if let Some(description) = &config.analysis.description {
        println!("  Description: {}", description);
    }

    match config.input_source()? {
        InputSource::Raw { path } => {
            let columns = config.columns();
            println!("  Input: {} (raw observations)", path);
            println!(
                "  Columns: region={}, date={}, revenue={}, period={}, group={}",
                columns.region, columns.date, columns.revenue, columns.period, columns.group
            );
            println!("  Treated when {} = {}", columns.group, config.input.treated_group_flag);
        }
        InputSource::Pivots { treated, untreated } => {
            println!("  Input: {} / {} (pivot tables)", treated, untreated);
        }
    }

    println!("  Confidence z: {:.4}", config.confidence_z()?);
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output_formats().join(", "));
    if let Some(dir) = config.pivot_dir() {
        println!("  Pivot tables: {}", dir);
    }
    if config.export_series() {
        println!("  Daily series: enabled");
    }
    println!();

    Ok(())
}
