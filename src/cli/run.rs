//! Run command implementation

use chrono::Utc;
use clap::Args;
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use super::replay::BarRecord;
use crate::config::Config;
use crate::engine::StrategyEngine;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Seconds between health evaluations
    #[arg(long, default_value = "60")]
    pub health_interval_secs: u64,

    /// Account equity supplied to the risk layers
    #[arg(long, default_value = "10000")]
    pub equity: Decimal,

    /// Volatility indicator supplied to the regime model
    #[arg(long)]
    pub vol_indicator: Option<f64>,
}

impl RunArgs {
    /// Drive the engine from JSON-line bar records on stdin until the
    /// input closes or shutdown is requested
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let mut engine = StrategyEngine::new(config);
        engine.on_account_update(Utc::now(), self.equity, self.vol_indicator);
        engine.drain_events();

        let mut tick =
            tokio::time::interval(std::time::Duration::from_secs(self.health_interval_secs));
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        info!("decision engine up, reading bars from stdin");

        loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<BarRecord>(&line) {
                            Ok(record) => {
                                let now = record.bar.timestamp;
                                let close = record.bar.close;
                                engine.on_bar(&record.symbol, record.bar);
                                if let Some(signal) =
                                    engine.poll_pending(&record.symbol, now, close)
                                {
                                    info!(
                                        id = %signal.id,
                                        symbol = %signal.symbol,
                                        size = %signal.size,
                                        "signal approved"
                                    );
                                }
                                for event in engine.drain_events() {
                                    info!(?event, "strategy event");
                                }
                            }
                            Err(e) => {
                                warn!(error = %e, "dropping malformed bar record");
                                engine.record_operational_error(Utc::now());
                            }
                        }
                    }
                    Ok(None) => {
                        info!("input closed, shutting down");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "stdin read failed");
                        engine.record_operational_error(Utc::now());
                    }
                },
                _ = tick.tick() => {
                    let report = engine.health_check(Utc::now());
                    for check in report.failures() {
                        warn!(check = check.name, detail = %check.detail, "health check failing");
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown requested");
                    break;
                }
            }
        }

        Ok(())
    }
}
