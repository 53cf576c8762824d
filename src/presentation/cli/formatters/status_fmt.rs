use colored::{ColoredString, Colorize};

use crate::domain::value_objects::health::{RiskLevel, TrendDirection};

/// Bar for a health score in `[0, 1]`; green when healthy, red when critical.
#[must_use]
pub fn health_bar(score: f64, width: usize) -> String {
    let ratio = score.clamp(0.0, 1.0);
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);

    let bar_filled = "\u{2588}".repeat(filled);
    let bar_empty = "\u{2591}".repeat(empty);

    let colored_bar = match RiskLevel::from_score(ratio) {
        RiskLevel::Low => bar_filled.green(),
        RiskLevel::Medium => bar_filled.yellow(),
        RiskLevel::High => bar_filled.bright_red(),
        RiskLevel::Critical => bar_filled.red().bold(),
    };

    format!("{colored_bar}{bar_empty}")
}

#[must_use]
pub fn colorize_score(score: f64) -> ColoredString {
    let text = format!("{:.1}%", score * 100.0);
    match RiskLevel::from_score(score) {
        RiskLevel::Low => text.green(),
        RiskLevel::Medium => text.yellow(),
        RiskLevel::High => text.bright_red(),
        RiskLevel::Critical => text.red().bold(),
    }
}

#[must_use]
pub fn risk_label(risk: RiskLevel) -> ColoredString {
    let text = risk.as_str();
    match risk {
        RiskLevel::Low => text.green(),
        RiskLevel::Medium => text.yellow(),
        RiskLevel::High => text.bright_red().bold(),
        RiskLevel::Critical => text.on_red().white().bold(),
    }
}

#[must_use]
pub fn trend_arrow(trend: TrendDirection) -> ColoredString {
    match trend {
        TrendDirection::Improving => "\u{2197} improving".green(),
        TrendDirection::Stable => "\u{2192} stable".normal(),
        TrendDirection::Declining => "\u{2198} declining".red(),
    }
}

pub fn print_section_header(title: &str) {
    println!("{}", title.bold().cyan());
    let display_width = title.chars().count();
    println!("{}", "\u{2500}".repeat(display_width).cyan());
}
