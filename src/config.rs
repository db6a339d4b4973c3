//! Configuration types for sigma-edge
//!
//! Every tunable lives in one typed structure, deserialized from TOML once
//! at startup and validated before any component is constructed. Call sites
//! read named fields; nothing is looked up by string key at runtime.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Root configuration structure
///
/// Every section has full defaults, so an empty file is a valid
/// conservative configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub regime: RegimeConfig,
    #[serde(default)]
    pub anchor: AnchorConfig,
    #[serde(default)]
    pub drawdown: DrawdownConfig,
    #[serde(default)]
    pub pvs: PvsConfig,
    #[serde(default)]
    pub cascade: CascadeConfig,
    #[serde(default)]
    pub sizing: SizingConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Engine-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Maximum concurrently open positions
    #[serde(default = "default_max_open_positions")]
    pub max_open_positions: usize,

    /// Seed for the engine's random source; None draws from entropy
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_max_open_positions() -> usize {
    3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_open_positions: 3,
            rng_seed: None,
        }
    }
}

/// Time-of-day window during which the detector's volume bar is raised
#[derive(Debug, Clone, Deserialize)]
pub struct AuctionWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl AuctionWindow {
    /// True if `t` falls inside the window; windows may wrap midnight
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start <= self.end {
            t >= self.start && t < self.end
        } else {
            t >= self.start || t < self.end
        }
    }
}

/// Extreme move detection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Trailing window length in bars
    #[serde(default = "default_window_bars")]
    pub window_bars: usize,

    /// Minimum |z| for a move to count as extreme
    #[serde(default = "default_z_threshold")]
    pub z_threshold: f64,

    /// Window volume must exceed this multiple of the hourly median
    #[serde(default = "default_volume_ratio_threshold")]
    pub volume_ratio_threshold: f64,

    /// Raised volume multiple applied inside auction windows
    #[serde(default = "default_auction_volume_ratio_threshold")]
    pub auction_volume_ratio_threshold: f64,

    /// Time-of-day windows where the raised threshold applies
    #[serde(default)]
    pub auction_windows: Vec<AuctionWindow>,

    /// Prior samples an hour bucket needs before volume can be judged
    #[serde(default = "default_min_volume_samples")]
    pub min_volume_samples: usize,

    /// Rolling samples retained per hour bucket
    #[serde(default = "default_volume_history_per_hour")]
    pub volume_history_per_hour: usize,

    /// Minimum minutes between detections for one symbol
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: i64,
}

fn default_window_bars() -> usize {
    60
}
fn default_z_threshold() -> f64 {
    2.0
}
fn default_volume_ratio_threshold() -> f64 {
    1.5
}
fn default_auction_volume_ratio_threshold() -> f64 {
    2.0
}
fn default_min_volume_samples() -> usize {
    5
}
fn default_volume_history_per_hour() -> usize {
    30
}
fn default_cooldown_minutes() -> i64 {
    15
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_bars: default_window_bars(),
            z_threshold: default_z_threshold(),
            volume_ratio_threshold: default_volume_ratio_threshold(),
            auction_volume_ratio_threshold: default_auction_volume_ratio_threshold(),
            auction_windows: Vec::new(),
            min_volume_samples: default_min_volume_samples(),
            volume_history_per_hour: default_volume_history_per_hour(),
            cooldown_minutes: default_cooldown_minutes(),
        }
    }
}

impl DetectorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.window_bars < 2 {
            return Err(invalid("detector.window_bars", "must be at least 2"));
        }
        if self.z_threshold <= 0.0 {
            return Err(invalid("detector.z_threshold", "must be positive"));
        }
        if self.volume_ratio_threshold <= 0.0 {
            return Err(invalid("detector.volume_ratio_threshold", "must be positive"));
        }
        if self.min_volume_samples == 0 {
            return Err(invalid("detector.min_volume_samples", "must be at least 1"));
        }
        if self.volume_history_per_hour < self.min_volume_samples {
            return Err(invalid(
                "detector.volume_history_per_hour",
                "must hold at least min_volume_samples entries",
            ));
        }
        if self.cooldown_minutes < 0 {
            return Err(invalid("detector.cooldown_minutes", "must not be negative"));
        }
        Ok(())
    }
}

/// Regime classification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RegimeConfig {
    /// Indicator readings below this are low volatility
    #[serde(default = "default_low_vol_ceiling")]
    pub low_vol_ceiling: f64,

    /// Indicator readings above this are high volatility
    #[serde(default = "default_high_vol_floor")]
    pub high_vol_floor: f64,

    #[serde(default = "default_low_vol_multiplier")]
    pub low_vol_multiplier: Decimal,

    #[serde(default = "default_high_vol_multiplier")]
    pub high_vol_multiplier: Decimal,

    #[serde(default = "default_trending_multiplier")]
    pub trending_multiplier: Decimal,
}

fn default_low_vol_ceiling() -> f64 {
    15.0
}
fn default_high_vol_floor() -> f64 {
    25.0
}
fn default_low_vol_multiplier() -> Decimal {
    Decimal::ONE
}
fn default_high_vol_multiplier() -> Decimal {
    Decimal::new(3, 1) // 0.3
}
fn default_trending_multiplier() -> Decimal {
    Decimal::new(8, 1) // 0.8
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            low_vol_ceiling: default_low_vol_ceiling(),
            high_vol_floor: default_high_vol_floor(),
            low_vol_multiplier: default_low_vol_multiplier(),
            high_vol_multiplier: default_high_vol_multiplier(),
            trending_multiplier: default_trending_multiplier(),
        }
    }
}

impl RegimeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.low_vol_ceiling >= self.high_vol_floor {
            return Err(invalid(
                "regime.low_vol_ceiling",
                "must be below high_vol_floor",
            ));
        }
        for (field, value) in [
            ("regime.low_vol_multiplier", self.low_vol_multiplier),
            ("regime.high_vol_multiplier", self.high_vol_multiplier),
            ("regime.trending_multiplier", self.trending_multiplier),
        ] {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(invalid(field, "must be within [0, 1]"));
            }
        }
        Ok(())
    }
}

/// Anchored reference tracking configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnchorConfig {
    /// Deactivate a track after this many hours of bars since the anchor
    #[serde(default = "default_time_stop_hours")]
    pub time_stop_hours: u64,

    /// Divergence stop band around VWAP against the move direction
    #[serde(default = "default_divergence_band")]
    pub divergence_band: Decimal,
}

fn default_time_stop_hours() -> u64 {
    4
}
fn default_divergence_band() -> Decimal {
    Decimal::new(2, 2) // 0.02 = 2%
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            time_stop_hours: default_time_stop_hours(),
            divergence_band: default_divergence_band(),
        }
    }
}

impl AnchorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.time_stop_hours == 0 {
            return Err(invalid("anchor.time_stop_hours", "must be at least 1"));
        }
        if self.divergence_band <= Decimal::ZERO {
            return Err(invalid("anchor.divergence_band", "must be positive"));
        }
        Ok(())
    }
}

/// Drawdown ladder configuration
///
/// Thresholds are |drawdown| fractions, strictly ascending; multipliers
/// pair with them one-to-one and must be non-increasing.
#[derive(Debug, Clone, Deserialize)]
pub struct DrawdownConfig {
    #[serde(default = "default_drawdown_thresholds")]
    pub thresholds: Vec<Decimal>,

    #[serde(default = "default_drawdown_multipliers")]
    pub multipliers: Vec<Decimal>,
}

fn default_drawdown_thresholds() -> Vec<Decimal> {
    vec![
        Decimal::new(10, 2),
        Decimal::new(20, 2),
        Decimal::new(30, 2),
        Decimal::new(40, 2),
    ]
}
fn default_drawdown_multipliers() -> Vec<Decimal> {
    vec![
        Decimal::new(75, 2),
        Decimal::new(50, 2),
        Decimal::new(25, 2),
        Decimal::ZERO,
    ]
}

impl Default for DrawdownConfig {
    fn default() -> Self {
        Self {
            thresholds: default_drawdown_thresholds(),
            multipliers: default_drawdown_multipliers(),
        }
    }
}

impl DrawdownConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.thresholds.is_empty() {
            return Err(invalid("drawdown.thresholds", "must not be empty"));
        }
        if self.thresholds.len() != self.multipliers.len() {
            return Err(invalid(
                "drawdown.multipliers",
                "must pair one-to-one with thresholds",
            ));
        }
        for pair in self.thresholds.windows(2) {
            if pair[1] <= pair[0] {
                return Err(invalid("drawdown.thresholds", "must be strictly ascending"));
            }
        }
        for threshold in &self.thresholds {
            if *threshold <= Decimal::ZERO || *threshold > Decimal::ONE {
                return Err(invalid("drawdown.thresholds", "must be within (0, 1]"));
            }
        }
        for pair in self.multipliers.windows(2) {
            if pair[1] > pair[0] {
                return Err(invalid("drawdown.multipliers", "must be non-increasing"));
            }
        }
        for multiplier in &self.multipliers {
            if *multiplier < Decimal::ZERO || *multiplier > Decimal::ONE {
                return Err(invalid("drawdown.multipliers", "must be within [0, 1]"));
            }
        }
        Ok(())
    }
}

/// Psychological risk score configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PvsConfig {
    /// Accounts below this equity get the small-account score multiplier
    #[serde(default = "default_small_account_threshold")]
    pub small_account_threshold: Decimal,

    /// Composite score at which the level becomes Elevated
    #[serde(default = "default_elevated_threshold")]
    pub elevated_threshold: f64,

    /// Composite score at which the level becomes Warning
    #[serde(default = "default_warning_threshold")]
    pub warning_threshold: f64,

    /// Composite score at which the level becomes Critical and halts entries
    #[serde(default = "default_halt_threshold")]
    pub halt_threshold: f64,

    /// Trades at or after this time count toward fatigue
    #[serde(default = "default_late_session_cutoff")]
    pub late_session_cutoff: NaiveTime,

    /// Volatility indicator readings above this add fear
    #[serde(default = "default_vol_spike_threshold")]
    pub vol_spike_threshold: f64,

    /// Minimum minutes between repeated alerts at the same level
    #[serde(default = "default_alert_interval_minutes")]
    pub alert_interval_minutes: i64,
}

fn default_small_account_threshold() -> Decimal {
    Decimal::new(5000, 0)
}
fn default_elevated_threshold() -> f64 {
    5.0
}
fn default_warning_threshold() -> f64 {
    7.0
}
fn default_halt_threshold() -> f64 {
    9.0
}
fn default_late_session_cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(20, 0, 0).expect("20:00:00 is a valid time")
}
fn default_vol_spike_threshold() -> f64 {
    30.0
}
fn default_alert_interval_minutes() -> i64 {
    60
}

impl Default for PvsConfig {
    fn default() -> Self {
        Self {
            small_account_threshold: default_small_account_threshold(),
            elevated_threshold: default_elevated_threshold(),
            warning_threshold: default_warning_threshold(),
            halt_threshold: default_halt_threshold(),
            late_session_cutoff: default_late_session_cutoff(),
            vol_spike_threshold: default_vol_spike_threshold(),
            alert_interval_minutes: default_alert_interval_minutes(),
        }
    }
}

impl PvsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.elevated_threshold < self.warning_threshold
            && self.warning_threshold < self.halt_threshold)
        {
            return Err(invalid(
                "pvs.elevated_threshold",
                "level thresholds must be strictly ascending",
            ));
        }
        if self.halt_threshold > 10.0 {
            return Err(invalid("pvs.halt_threshold", "score never exceeds 10"));
        }
        if self.alert_interval_minutes < 0 {
            return Err(invalid("pvs.alert_interval_minutes", "must not be negative"));
        }
        Ok(())
    }
}

/// Cascade veto configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CascadeConfig {
    /// |z| below this counts as a weak signal
    #[serde(default = "default_edge_z_threshold")]
    pub edge_z_threshold: f64,

    /// Consecutive losses at or above this count as a violation
    #[serde(default = "default_max_consecutive_losses")]
    pub max_consecutive_losses: u32,

    /// PVS score at or above this counts as a violation
    #[serde(default = "default_cascade_pvs_threshold")]
    pub pvs_threshold: f64,

    /// Trades in the trailing hour above this count as overtrading
    #[serde(default = "default_max_trades_per_hour")]
    pub max_trades_per_hour: usize,

    /// Regime confidence below this counts as a violation
    #[serde(default = "default_min_regime_confidence")]
    pub min_regime_confidence: f64,

    /// Number of simultaneous violations that trips the veto
    #[serde(default = "default_cascade_threshold")]
    pub cascade_threshold: usize,
}

fn default_edge_z_threshold() -> f64 {
    2.0
}
fn default_max_consecutive_losses() -> u32 {
    2
}
fn default_cascade_pvs_threshold() -> f64 {
    7.0
}
fn default_max_trades_per_hour() -> usize {
    5
}
fn default_min_regime_confidence() -> f64 {
    0.5
}
fn default_cascade_threshold() -> usize {
    2
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            edge_z_threshold: default_edge_z_threshold(),
            max_consecutive_losses: default_max_consecutive_losses(),
            pvs_threshold: default_cascade_pvs_threshold(),
            max_trades_per_hour: default_max_trades_per_hour(),
            min_regime_confidence: default_min_regime_confidence(),
            cascade_threshold: default_cascade_threshold(),
        }
    }
}

impl CascadeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.cascade_threshold == 0 {
            return Err(invalid("cascade.cascade_threshold", "must be at least 1"));
        }
        if self.edge_z_threshold <= 0.0 {
            return Err(invalid("cascade.edge_z_threshold", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.min_regime_confidence) {
            return Err(invalid(
                "cascade.min_regime_confidence",
                "must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

/// Position sizing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SizingConfig {
    /// Capital risked per unit of normalized volatility
    #[serde(default = "default_risk_amount")]
    pub risk_amount: Decimal,

    /// Smallest size worth submitting
    #[serde(default = "default_min_size")]
    pub min_size: Decimal,

    /// Hard cap on a single entry
    #[serde(default = "default_max_size")]
    pub max_size: Decimal,

    /// Divide the base size by the ATR ratio instead of using it flat
    #[serde(default)]
    pub volatility_normalized: bool,

    /// ATR lookback in bars
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,

    /// Floor on the ATR ratio to keep quiet markets from exploding size
    #[serde(default = "default_atr_floor")]
    pub atr_floor: Decimal,
}

fn default_risk_amount() -> Decimal {
    Decimal::new(100, 0)
}
fn default_min_size() -> Decimal {
    Decimal::new(10, 0)
}
fn default_max_size() -> Decimal {
    Decimal::new(1000, 0)
}
fn default_atr_period() -> usize {
    20
}
fn default_atr_floor() -> Decimal {
    Decimal::new(5, 3) // 0.005
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            risk_amount: default_risk_amount(),
            min_size: default_min_size(),
            max_size: default_max_size(),
            volatility_normalized: false,
            atr_period: default_atr_period(),
            atr_floor: default_atr_floor(),
        }
    }
}

impl SizingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.risk_amount <= Decimal::ZERO {
            return Err(invalid("sizing.risk_amount", "must be positive"));
        }
        if self.min_size > self.max_size {
            return Err(invalid("sizing.min_size", "must not exceed max_size"));
        }
        if self.atr_period == 0 {
            return Err(invalid("sizing.atr_period", "must be at least 1"));
        }
        if self.atr_floor <= Decimal::ZERO {
            return Err(invalid("sizing.atr_floor", "must be positive"));
        }
        Ok(())
    }
}

/// Entry timing gate configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// Disable to approve entries immediately on signal
    #[serde(default = "default_timing_enabled")]
    pub enabled: bool,

    /// Shortest randomized wait in minutes
    #[serde(default = "default_min_wait_minutes")]
    pub min_wait_minutes: i64,

    /// Longest randomized wait in minutes
    #[serde(default = "default_max_wait_minutes")]
    pub max_wait_minutes: i64,

    /// Reject execution when this fraction of the move has retraced
    #[serde(default = "default_max_retracement")]
    pub max_retracement: f64,

    /// Approve immediately when price is within this band of the reference
    #[serde(default = "default_immediate_band")]
    pub immediate_band: Decimal,

    /// Drop a pending entry after this many minutes
    #[serde(default = "default_expiry_minutes")]
    pub expiry_minutes: i64,
}

fn default_timing_enabled() -> bool {
    true
}
fn default_min_wait_minutes() -> i64 {
    15
}
fn default_max_wait_minutes() -> i64 {
    30
}
fn default_max_retracement() -> f64 {
    0.5
}
fn default_immediate_band() -> Decimal {
    Decimal::new(5, 3) // 0.005 = 0.5%
}
fn default_expiry_minutes() -> i64 {
    60
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_wait_minutes: default_min_wait_minutes(),
            max_wait_minutes: default_max_wait_minutes(),
            max_retracement: default_max_retracement(),
            immediate_band: default_immediate_band(),
            expiry_minutes: default_expiry_minutes(),
        }
    }
}

impl TimingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_wait_minutes < 0 {
            return Err(invalid("timing.min_wait_minutes", "must not be negative"));
        }
        if self.min_wait_minutes > self.max_wait_minutes {
            return Err(invalid(
                "timing.min_wait_minutes",
                "must not exceed max_wait_minutes",
            ));
        }
        if !(0.0..=1.0).contains(&self.max_retracement) {
            return Err(invalid("timing.max_retracement", "must be within [0, 1]"));
        }
        if self.immediate_band < Decimal::ZERO {
            return Err(invalid("timing.immediate_band", "must not be negative"));
        }
        if self.expiry_minutes < self.max_wait_minutes {
            return Err(invalid(
                "timing.expiry_minutes",
                "must cover the longest possible wait",
            ));
        }
        Ok(())
    }
}

/// Recovery circuit breaker configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RecoveryConfig {
    /// Consecutive failures that open the circuit
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Seconds an open circuit refuses attempts
    #[serde(default = "default_open_duration_secs")]
    pub open_duration_secs: u64,

    /// Base backoff between attempts in seconds
    #[serde(default = "default_base_backoff_secs")]
    pub base_backoff_secs: u64,

    /// Cap on the exponential backoff in seconds
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,

    /// Random jitter added to backoff, as a fraction of the backoff
    #[serde(default = "default_jitter_fraction")]
    pub jitter_fraction: f64,
}

fn default_max_attempts() -> u32 {
    5
}
fn default_open_duration_secs() -> u64 {
    3600
}
fn default_base_backoff_secs() -> u64 {
    60
}
fn default_max_backoff_secs() -> u64 {
    900
}
fn default_jitter_fraction() -> f64 {
    0.3
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            open_duration_secs: default_open_duration_secs(),
            base_backoff_secs: default_base_backoff_secs(),
            max_backoff_secs: default_max_backoff_secs(),
            jitter_fraction: default_jitter_fraction(),
        }
    }
}

impl RecoveryConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(invalid("recovery.max_attempts", "must be at least 1"));
        }
        if self.open_duration_secs == 0 {
            return Err(invalid("recovery.open_duration_secs", "must be positive"));
        }
        if self.base_backoff_secs > self.max_backoff_secs {
            return Err(invalid(
                "recovery.base_backoff_secs",
                "must not exceed max_backoff_secs",
            ));
        }
        if !(0.0..=1.0).contains(&self.jitter_fraction) {
            return Err(invalid("recovery.jitter_fraction", "must be within [0, 1]"));
        }
        Ok(())
    }
}

/// Health monitoring configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    /// Bar data older than this is considered stale
    #[serde(default = "default_max_data_age_secs")]
    pub max_data_age_secs: u64,

    /// Symbol-state entries above this indicate unbounded growth
    #[serde(default = "default_max_tracked_symbols")]
    pub max_tracked_symbols: usize,

    /// Sliding window for operational error counting
    #[serde(default = "default_error_window_secs")]
    pub error_window_secs: u64,

    /// Errors inside the window above which the error-rate check fails
    #[serde(default = "default_max_errors_in_window")]
    pub max_errors_in_window: usize,
}

fn default_max_data_age_secs() -> u64 {
    120
}
fn default_max_tracked_symbols() -> usize {
    50
}
fn default_error_window_secs() -> u64 {
    300
}
fn default_max_errors_in_window() -> usize {
    10
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            max_data_age_secs: default_max_data_age_secs(),
            max_tracked_symbols: default_max_tracked_symbols(),
            error_window_secs: default_error_window_secs(),
            max_errors_in_window: default_max_errors_in_window(),
        }
    }
}

impl HealthConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_data_age_secs == 0 {
            return Err(invalid("health.max_data_age_secs", "must be positive"));
        }
        if self.error_window_secs == 0 {
            return Err(invalid("health.error_window_secs", "must be positive"));
        }
        Ok(())
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and validate it
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string and validate it
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section for out-of-range values; fails fast at startup
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.max_open_positions == 0 {
            return Err(invalid("engine.max_open_positions", "must be at least 1"));
        }
        self.detector.validate()?;
        self.regime.validate()?;
        self.anchor.validate()?;
        self.drawdown.validate()?;
        self.pvs.validate()?;
        self.cascade.validate()?;
        self.sizing.validate()?;
        self.timing.validate()?;
        self.recovery.validate()?;
        self.health.validate()?;
        Ok(())
    }
}
