//! Report generation port trait.

use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::PairtraderError;
use crate::domain::strategy::PairStrategy;

/// Port for persisting backtest output.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        strategy: &PairStrategy,
        output_dir: &Path,
    ) -> Result<(), PairtraderError>;
}
