use clap::Parser;
use sigma_edge::cli::{Cli, Commands};
use sigma_edge::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::from_toml(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Initialize telemetry
    sigma_edge::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting decision engine");
            args.execute(config).await?;
        }
        Commands::Replay(args) => {
            tracing::info!("Starting replay");
            args.execute(config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Detector: {} bar window, |z| >= {}, volume > {}x hourly median",
                config.detector.window_bars,
                config.detector.z_threshold,
                config.detector.volume_ratio_threshold
            );
            println!(
                "  Regime: low-vol < {}, high-vol > {}",
                config.regime.low_vol_ceiling, config.regime.high_vol_floor
            );
            println!("  Drawdown thresholds: {:?}", config.drawdown.thresholds);
            println!(
                "  Sizing: risk {} clamped to [{}, {}]",
                config.sizing.risk_amount, config.sizing.min_size, config.sizing.max_size
            );
            println!(
                "  Timing: wait {}-{} min, expiry {} min, enabled={}",
                config.timing.min_wait_minutes,
                config.timing.max_wait_minutes,
                config.timing.expiry_minutes,
                config.timing.enabled
            );
        }
    }

    Ok(())
}
