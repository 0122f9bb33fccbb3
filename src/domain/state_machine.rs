//! Spread position state machine.
//!
//! Wraps a strategy's per-bar signal with stateful hysteresis: tracks which
//! spread position is open and converts signals into at most one transition
//! per bar, in fixed precedence. An exit never combines with a same-bar
//! re-entry; a bar that exits ends flat and any surviving entry signal fires
//! on the next bar.

use std::fmt;

use super::strategy::Signal;

/// The one open spread position (or none). Never more than one concurrent
/// position per strategy instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadPosition {
    Flat,
    LongAShortB,
    ShortALongB,
}

impl SpreadPosition {
    pub fn is_open(&self) -> bool {
        !matches!(self, SpreadPosition::Flat)
    }
}

impl fmt::Display for SpreadPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SpreadPosition::Flat => "FLAT",
            SpreadPosition::LongAShortB => "LONG_A_SHORT_B",
            SpreadPosition::ShortALongB => "SHORT_A_LONG_B",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeKind {
    Enter,
    Exit,
    StopLoss,
    PanicExit,
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeKind::Enter => "ENTER",
            TradeKind::Exit => "EXIT",
            TradeKind::StopLoss => "STOP_LOSS",
            TradeKind::PanicExit => "PANIC_EXIT",
        };
        write!(f, "{}", s)
    }
}

/// One position change. `Enter` always carries a non-flat target; `Exit`
/// covers the three flattening kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Enter {
        target: SpreadPosition,
        size: f64,
        indicator: f64,
    },
    Exit {
        kind: TradeKind,
        indicator: f64,
    },
}

impl Transition {
    pub fn kind(&self) -> TradeKind {
        match self {
            Transition::Enter { .. } => TradeKind::Enter,
            Transition::Exit { kind, .. } => *kind,
        }
    }

    pub fn indicator(&self) -> f64 {
        match self {
            Transition::Enter { indicator, .. } | Transition::Exit { indicator, .. } => *indicator,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PositionStateMachine {
    position: SpreadPosition,
    stop_loss_pct: Option<f64>,
}

impl PositionStateMachine {
    pub fn new(stop_loss_pct: Option<f64>) -> Self {
        PositionStateMachine {
            position: SpreadPosition::Flat,
            stop_loss_pct,
        }
    }

    pub fn position(&self) -> SpreadPosition {
        self.position
    }

    /// Evaluate one bar's signal against the open position. Precedence,
    /// first match wins:
    /// 1. regime kill-switch, 2. stop-loss, 3. mean-reversion exit,
    /// 4. entry (from flat only), 5. hold.
    pub fn evaluate(
        &self,
        signal: &Signal,
        current_value: f64,
        entry_value: f64,
    ) -> Option<Transition> {
        let open = self.position.is_open();

        if open && !signal.regime_safe {
            return Some(Transition::Exit {
                kind: TradeKind::PanicExit,
                indicator: signal.indicator,
            });
        }

        if open {
            if let Some(stop) = self.stop_loss_pct {
                if entry_value > 0.0 && (current_value - entry_value) / entry_value < -stop {
                    return Some(Transition::Exit {
                        kind: TradeKind::StopLoss,
                        indicator: signal.indicator,
                    });
                }
            }
        }

        if open && signal.target == Some(SpreadPosition::Flat) {
            return Some(Transition::Exit {
                kind: TradeKind::Exit,
                indicator: signal.indicator,
            });
        }

        if !open && signal.regime_safe && signal.size > 0.0 {
            if let Some(target) = signal.target {
                if target.is_open() {
                    return Some(Transition::Enter {
                        target,
                        size: signal.size,
                        indicator: signal.indicator,
                    });
                }
            }
        }

        None
    }

    /// Advance the position. Called only after the portfolio accepted the
    /// transition.
    pub fn apply(&mut self, transition: &Transition) {
        self.position = match transition {
            Transition::Enter { target, .. } => *target,
            Transition::Exit { .. } => SpreadPosition::Flat,
        };
    }
}
