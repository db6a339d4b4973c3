//! Replay command implementation

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::Config;
use crate::engine::StrategyEngine;
use crate::market::Bar;
use crate::telemetry::StrategyEvent;

/// One line of bar input: the symbol plus the bar fields inline
#[derive(Debug, Deserialize)]
pub(crate) struct BarRecord {
    pub symbol: String,
    #[serde(flatten)]
    pub bar: Bar,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON-lines file of bars
    #[arg(long)]
    pub bars: PathBuf,

    /// Account equity supplied to the risk layers
    #[arg(long, default_value = "10000")]
    pub equity: Decimal,

    /// Volatility indicator supplied to the regime model
    #[arg(long)]
    pub vol_indicator: Option<f64>,
}

impl ReplayArgs {
    /// Feed every recorded bar through the engine and print the event
    /// stream as JSON lines
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let file = File::open(&self.bars)
            .with_context(|| format!("open bar file {}", self.bars.display()))?;
        let reader = BufReader::new(file);

        let mut engine = StrategyEngine::new(config);
        let mut bars = 0usize;
        let mut detections = 0usize;
        let mut approved = 0usize;
        let mut vetoed = 0usize;
        let mut primed = false;

        for (number, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("read line {}", number + 1))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: BarRecord = serde_json::from_str(&line)
                .with_context(|| format!("parse bar record on line {}", number + 1))?;

            if !primed {
                engine.on_account_update(record.bar.timestamp, self.equity, self.vol_indicator);
                primed = true;
            }

            let now = record.bar.timestamp;
            let close = record.bar.close;
            let outcome = engine.on_bar(&record.symbol, record.bar);
            if outcome.is_fired() {
                detections += 1;
            }
            engine.poll_pending(&record.symbol, now, close);
            bars += 1;

            for event in engine.drain_events() {
                match &event {
                    StrategyEvent::SignalApproved { .. } => approved += 1,
                    StrategyEvent::SignalVetoed { .. } => vetoed += 1,
                    _ => {}
                }
                println!("{}", serde_json::to_string(&event)?);
            }
        }

        tracing::info!(bars, detections, approved, vetoed, "replay finished");
        Ok(())
    }
}
