//! Terminal rendering of the dashboard.

use std::fmt;

use chrono::Local;
use rust_decimal::Decimal;

use crate::models::Denomination;
use crate::polling::ViewState;

use super::projection::{project, AgentCard, DashboardView, LeaderboardRow};

pub const LOADING_MESSAGE: &str = "Loading dashboard...";

/// Render whatever the view state allows: a loading line until the first
/// snapshot arrives, the full dashboard afterwards.
pub fn render_state(state: &ViewState, leaderboard_limit: usize) -> String {
    match state {
        ViewState::Idle | ViewState::Loading => LOADING_MESSAGE.to_string(),
        ViewState::Ready {
            snapshot,
            refreshing,
            ..
        } => {
            let rendered = project(snapshot, leaderboard_limit).to_string();
            if *refreshing {
                format!("{}\n(refreshing...)", rendered)
            } else {
                rendered
            }
        }
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let totals = &self.totals;
        let denom = totals.denomination;

        writeln!(f, "=== Agent Arena: Trading Simulation ===")?;
        write!(
            f,
            "Total Net PnL: {} | Population: {} Agents",
            format_signed(totals.total_pnl, denom),
            totals.agent_count
        )?;
        if let Some(price) = totals.reference_price {
            write!(f, " | SPX: {:.2}", price)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Last updated: {}",
            totals.fetched_at.with_timezone(&Local).format("%H:%M:%S")
        )?;

        writeln!(f, "\n--- Leaderboard ---")?;
        writeln!(f, "{:<4} {:<20} {:>16}", "#", "AGENT", format!("PNL ({})", denom))?;
        writeln!(f, "{}", "-".repeat(42))?;
        for row in &self.ranked_agents {
            write_row(f, row, denom)?;
        }

        writeln!(f, "\n--- Agent Status Overview ---")?;
        for card in &self.card_agents {
            write_card(f, card, denom)?;
        }

        Ok(())
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, row: &LeaderboardRow, denom: Denomination) -> fmt::Result {
    writeln!(
        f,
        "{:<4} {:<20} {:>16}",
        row.rank,
        truncate(&row.short_name, 20),
        format_signed(row.pnl, denom)
    )
}

fn write_card(f: &mut fmt::Formatter<'_>, card: &AgentCard, denom: Denomination) -> fmt::Result {
    writeln!(
        f,
        "\n[{}] {}  Gen {} - {}",
        card.id, card.name, card.generation, card.status
    )?;
    writeln!(
        f,
        "    PnL: {}   Bal: {}",
        format_signed(card.pnl, denom),
        format_amount(card.balance, denom)
    )?;

    if card.positions.is_empty() {
        return writeln!(f, "    No active trades");
    }

    writeln!(f, "    {:<10} {:>10} {:>12} {:>8}", "CONTRACT", "SIZE", "ENTRY", "PNL")?;
    for pos in &card.positions {
        writeln!(
            f,
            "    {:<10} {:>10} {:>12} {:>8}",
            truncate(&pos.symbol, 10),
            pos.quantity.normalize(),
            format!("{:.2}", pos.reference_price),
            format_percent(pos.pnl_percent)
        )?;
    }

    Ok(())
}

/// Money in the snapshot's unit: `$1,234.56` for USD, three decimals for SPX.
pub fn format_amount(value: Decimal, denom: Denomination) -> String {
    let places = match denom {
        Denomination::Usd => 2,
        Denomination::Spx => 3,
    };

    // Sign comes from the rounded value so -0.001 prints as zero
    let rounded = value.round_dp(places);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };

    match denom {
        Denomination::Usd => {
            let fixed = format!("{:.2}", rounded.abs());
            format!("{}${}", sign, group_thousands(&fixed))
        }
        Denomination::Spx => format!("{}{:.3}", sign, rounded.abs()),
    }
}

/// Like `format_amount`, with an explicit `+` for non-negative values.
pub fn format_signed(value: Decimal, denom: Denomination) -> String {
    let amount = format_amount(value, denom);
    if amount.starts_with('-') {
        amount
    } else {
        format!("+{}", amount)
    }
}

pub fn format_percent(value: Decimal) -> String {
    let rounded = value.round_dp(1);
    let rounded = if rounded.is_zero() { Decimal::ZERO } else { rounded };
    let sign = if rounded >= Decimal::ZERO { "+" } else { "" };
    format!("{}{:.1}%", sign, rounded)
}

/// Insert thousands separators into the integer part of a plain number.
fn group_thousands(number: &str) -> String {
    let (int_part, frac_part) = match number.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (number, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}.{}", grouped, frac),
        None => grouped,
    }
}

/// Truncate a string with ellipsis if too long.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgentStatus, AgentView, DashboardSnapshot, PositionView};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn snapshot() -> DashboardSnapshot {
        let agents = vec![
            AgentView {
                id: 4,
                name: "Momentum_Gen2_731".to_string(),
                status: AgentStatus::Active,
                generation: 2,
                pnl: dec!(830.25),
                balance: dec!(100830.25),
                positions: vec![PositionView {
                    symbol: "NVDA".to_string(),
                    quantity: dec!(12.50),
                    reference_price: dec!(120.4),
                    pnl_percent: dec!(3.1),
                }],
            },
            AgentView {
                id: 9,
                name: "MeanRev_Gen1_118".to_string(),
                status: AgentStatus::Inactive,
                generation: 1,
                pnl: dec!(-2080.75),
                balance: dec!(97919.25),
                positions: Vec::new(),
            },
        ];
        DashboardSnapshot::new(dec!(-1250.5), agents, Denomination::Usd, Some(dec!(512.34)), Utc::now())
    }

    #[test]
    fn test_format_amount_usd() {
        assert_eq!(format_amount(dec!(0), Denomination::Usd), "$0.00");
        assert_eq!(format_amount(dec!(999.5), Denomination::Usd), "$999.50");
        assert_eq!(format_amount(dec!(1234.567), Denomination::Usd), "$1,234.57");
        assert_eq!(format_amount(dec!(-1234567.8), Denomination::Usd), "-$1,234,567.80");
    }

    #[test]
    fn test_format_amount_spx() {
        assert_eq!(format_amount(dec!(1.62), Denomination::Spx), "1.620");
        assert_eq!(format_amount(dec!(-4.0612), Denomination::Spx), "-4.061");
    }

    #[test]
    fn test_format_signed() {
        assert_eq!(format_signed(dec!(0), Denomination::Usd), "+$0.00");
        assert_eq!(format_signed(dec!(830.25), Denomination::Usd), "+$830.25");
        assert_eq!(format_signed(dec!(-3), Denomination::Usd), "-$3.00");
        assert_eq!(format_signed(dec!(1.62), Denomination::Spx), "+1.620");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(dec!(3.14)), "+3.1%");
        assert_eq!(format_percent(dec!(-0.25)), "-0.2%");
        assert_eq!(format_percent(dec!(0)), "+0.0%");
        assert_eq!(format_percent(dec!(-0.04)), "+0.0%");
    }

    #[test]
    fn test_negative_values_rounding_to_zero_are_unsigned() {
        assert_eq!(format_amount(dec!(-0.001), Denomination::Usd), "$0.00");
        assert_eq!(format_signed(dec!(-0.001), Denomination::Usd), "+$0.00");
        assert_eq!(format_signed(dec!(-0.0004), Denomination::Spx), "+0.000");
        assert_eq!(format_signed(dec!(-0.006), Denomination::Usd), "-$0.01");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Momentum", 10), "Momentum");
        assert_eq!(truncate("ExtremelyLongAgentName", 10), "Extreme...");
    }

    #[test]
    fn test_render_dashboard() {
        let rendered = project(&snapshot(), 15).to_string();

        assert!(rendered.contains("Total Net PnL: -$1,250.50 | Population: 2 Agents | SPX: 512.34"));
        assert!(rendered.contains("Last updated: "));
        assert!(rendered.contains("PNL (USD)"));
        assert!(rendered.contains("Momentum"));
        assert!(rendered.contains("+$830.25"));
        assert!(rendered.contains("[9] MeanRev_Gen1_118  Gen 1 - inactive"));
        assert!(rendered.contains("No active trades"));
        assert!(rendered.contains("NVDA"));
        assert!(rendered.contains("+3.1%"));

        let leaderboard = rendered.find("--- Leaderboard ---").unwrap();
        let first = rendered[leaderboard..].find("Momentum").unwrap();
        let second = rendered[leaderboard..].find("MeanRev").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_render_state() {
        assert_eq!(render_state(&ViewState::Idle, 15), LOADING_MESSAGE);
        assert_eq!(render_state(&ViewState::Loading, 15), LOADING_MESSAGE);

        let ready = ViewState::Ready {
            snapshot: Arc::new(snapshot()),
            generation: 3,
            refreshing: true,
        };
        let rendered = render_state(&ready, 1);

        assert!(rendered.ends_with("(refreshing...)"));
        let leaderboard = &rendered[rendered.find("--- Leaderboard ---").unwrap()
            ..rendered.find("--- Agent Status Overview ---").unwrap()];
        assert!(leaderboard.contains("Momentum"));
        assert!(!leaderboard.contains("MeanRev"));
    }
}
