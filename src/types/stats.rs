use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `wins / total * 100`, or zero when nothing was recorded.
pub fn win_rate(wins: u32, total: u32) -> f64 {
    if total > 0 {
        (wins as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Win/loss tally for a single symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolStats {
    pub wins: u32,
    pub total: u32,
    pub win_rate: f64,
}

impl SymbolStats {
    pub fn record_outcome(&mut self, win: bool) {
        self.total += 1;
        if win {
            self.wins += 1;
        }
        self.win_rate = win_rate(self.wins, self.total);
    }
}

/// Rolling performance window, reset at each daily report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub total_signals: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
    pub per_symbol: BTreeMap<String, SymbolStats>,
}

impl PerformanceStats {
    /// Fold one resolved outcome into the overall and per-symbol tallies.
    pub fn record_outcome(&mut self, symbol: &str, win: bool) {
        self.total_signals += 1;
        if win {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.win_rate = win_rate(self.wins, self.total_signals);

        self.per_symbol
            .entry(symbol.to_string())
            .or_default()
            .record_outcome(win);
    }

    pub fn is_empty(&self) -> bool {
        self.total_signals == 0
    }
}
