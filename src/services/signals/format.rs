//! Notification text for signals, outcomes and reports (Telegram HTML).

use crate::config::SignalSettings;
use crate::types::{round_to, ActiveSignal, EvaluatedSignal, PerformanceStats, SignalOutcome};

/// Stake per gale level: `base * multiplier^i`, rounded to cents.
pub fn gale_stakes(levels: &[String], base: f64, multiplier: f64) -> Vec<(String, f64)> {
    levels
        .iter()
        .enumerate()
        .map(|(i, level)| (level.clone(), round_to(base * multiplier.powi(i as i32), 2)))
        .collect()
}

/// Message announcing an admitted signal.
pub fn signal_message(signal: &EvaluatedSignal, settings: &SignalSettings) -> String {
    let c = &signal.candidate;
    let v = &signal.verification;

    let mut lines = vec![
        format!("{} <b>{} - {}</b>", c.direction.emoji(), c.symbol, c.direction),
        format!(
            "⏰ {} | ⏳ {}min",
            c.entry_time(),
            settings.settings.expiration_minutes
        ),
        format!(
            "{} {} | Score: {}/{}",
            c.strength.emoji(),
            c.strength,
            v.score,
            v.max_score
        ),
        format!("📊 RSI: {:.1} | Trend: {}", c.display.rsi, c.snapshot.trend),
        format!(
            "📈 MACD: {:.6} | BB: {}",
            c.display.macd_line,
            c.bb_position.label()
        ),
        format!("🌍 {} | 💰 ${:.5}", c.snapshot.session, c.entry_price),
        String::new(),
        "🎲 GALES:".to_string(),
    ];

    let advanced = &settings.advanced;
    for (level, stake) in gale_stakes(
        &settings.gale_levels,
        advanced.gale_base_stake,
        advanced.gale_multiplier,
    ) {
        lines.push(format!("   {}: ${:.2}", level, stake));
    }

    lines.join("\n")
}

/// One-line outcome, e.g. `🟢 WIN - $1.08300 (+0.13%)`.
pub fn result_message(outcome: &SignalOutcome) -> String {
    let (emoji, label) = if outcome.win {
        ("🟢", "WIN")
    } else {
        ("🔴", "LOSS")
    };
    format!(
        "{} {} - ${:.5} ({:+.2}%)",
        emoji, label, outcome.close_price, outcome.percentage_change
    )
}

/// Replacement text for the original signal message once it resolved.
pub fn resolved_signal_message(signal: &ActiveSignal, outcome: &SignalOutcome) -> String {
    format!(
        "{} <b>{} - {}</b>\n⏰ {} | 💰 ${:.5}\n{}",
        signal.direction.emoji(),
        signal.symbol,
        signal.direction,
        signal.entry_time,
        signal.entry_price,
        result_message(outcome)
    )
}

/// Daily summary, or `None` when nothing resolved.
pub fn daily_report(stats: &PerformanceStats) -> Option<String> {
    if stats.is_empty() {
        return None;
    }

    let mut report = format!(
        "📊 <b>DAILY REPORT</b>\n━━━━━━━━━━━━━━━━━━\n\
         🎯 <b>Signals</b>: {} | ✅ <b>Wins</b>: {} | ❌ <b>Losses</b>: {}\n\
         📈 <b>Win rate</b>: {:.1}%\n\n📌 <b>By pair</b>:\n",
        stats.total_signals, stats.wins, stats.losses, stats.win_rate
    );
    for (symbol, s) in &stats.per_symbol {
        report.push_str(&format!(
            "• {}: {:.1}% ({}/{})\n",
            symbol, s.win_rate, s.wins, s.total
        ));
    }

    Some(report)
}

/// Audit message for a candidate the quality gate refused.
pub fn rejection_message(signal: &EvaluatedSignal) -> String {
    let c = &signal.candidate;
    let v = &signal.verification;

    let mut lines = vec![
        format!("⚠️ <b>{} - {}</b> rejected", c.symbol, c.direction),
        format!("Score: {}/{}", v.score, v.max_score),
    ];
    lines.extend(v.issues.iter().map(|issue| format!("• {}", issue)));
    lines.join("\n")
}
