//! Domain error types.
//!
//! Two classes: fatal errors (bad parameters, unusable config, missing data
//! series) abort a run at startup; recoverable errors (warmup windows, bad
//! prices, broker call failures) degrade to "hold this bar" so a single bad
//! observation never corrupts portfolio state or kills a long-running loop.

/// Top-level error type for pairtrader.
#[derive(Debug, thiserror::Error)]
pub enum PairtraderError {
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("insufficient data for {what}: have {have} bars, need {need}")]
    InsufficientData {
        what: String,
        have: usize,
        need: usize,
    },

    #[error("invalid price for {symbol}: {price}")]
    InvalidPrice { symbol: String, price: f64 },

    #[error("execution failure during {action}: {reason}")]
    ExecutionFailure { action: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PairtraderError {
    /// Recoverable errors cause the driver to hold for one bar or tick;
    /// everything else terminates the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PairtraderError::InsufficientData { .. }
                | PairtraderError::InvalidPrice { .. }
                | PairtraderError::ExecutionFailure { .. }
        )
    }
}

impl From<&PairtraderError> for std::process::ExitCode {
    fn from(err: &PairtraderError) -> Self {
        let code: u8 = match err {
            PairtraderError::Io(_) => 1,
            PairtraderError::ConfigParse { .. }
            | PairtraderError::ConfigMissing { .. }
            | PairtraderError::ConfigInvalid { .. } => 2,
            PairtraderError::InvalidParameter { .. } => 3,
            PairtraderError::NoData { .. }
            | PairtraderError::DataSource { .. }
            | PairtraderError::InsufficientData { .. } => 4,
            PairtraderError::InvalidPrice { .. } | PairtraderError::ExecutionFailure { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
