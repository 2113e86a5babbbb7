use super::ui;
use crate::core::ledger::{DATE_FORMAT, LedgerEntry};
use crate::core::lookback::Lookback;
use crate::core::normalize::NormalizedLedgerEntry;
use crate::core::report::format_money;
use crate::core::stats::{LedgerStats, PeriodChange};
use chrono::NaiveDate;
use comfy_table::{Cell, CellAlignment, Table};
use rust_decimal::Decimal;

/// Number formatting for a value column: money for the primary ledger, plain
/// four-decimal figures for the normalized one.
fn format_value(value: Decimal, normalized: bool) -> String {
    if normalized {
        format!("{:.4}", value.round_dp(4))
    } else {
        format_money(value)
    }
}

/// Table of the last `limit` rows, oldest first.
pub fn history_table<R>(
    rows: &[R],
    limit: usize,
    normalized: bool,
    value_of: impl Fn(&R) -> Option<Decimal>,
) -> Table
where
    R: AsRef<LedgerEntry>,
{
    let mut table = ui::new_styled_table();
    let mut header = vec![
        ui::header_cell("Checked"),
        ui::header_cell("Effective"),
        ui::header_cell("Value"),
        ui::header_cell("Change"),
    ];
    if normalized {
        header.push(ui::header_cell("Normalized"));
    }
    table.set_header(header);

    let start = rows.len().saturating_sub(limit);
    for row in &rows[start..] {
        let entry = row.as_ref();
        let mut cells = vec![
            Cell::new(entry.check_date.format(DATE_FORMAT)),
            Cell::new(entry.effective_date.format("%Y-%m-%d %H:%M")),
            Cell::new(format_money(entry.value)).set_alignment(CellAlignment::Right),
            entry.percent_change.map_or_else(ui::na_cell, ui::change_cell),
        ];
        if normalized {
            cells.push(ui::format_optional_cell(value_of(row), |v| {
                format_value(v, true)
            }));
        }
        table.add_row(cells);
    }
    table
}

fn period_line(label: &str, change: &PeriodChange, normalized: bool) -> String {
    let percent = change
        .percent_delta
        .map_or("n/a".to_string(), |p| format!("{:.2}%", p.round_dp(2)));
    format!(
        "{label}: {} ({percent}) since {}",
        format_value(change.delta, normalized),
        change.from_date.format(DATE_FORMAT)
    )
}

/// Statistics block printed under the history table.
pub fn stats_lines(stats: &LedgerStats, normalized: bool) -> Vec<String> {
    let mut lines = vec![format!(
        "Latest: {} on {}",
        format_value(stats.latest_value, normalized),
        stats.latest_date.format(DATE_FORMAT)
    )];
    if let Some(daily) = &stats.daily {
        lines.push(period_line("Previous check", daily, normalized));
    }
    match &stats.lookback {
        Lookback::Available(reference) => {
            let percent = if reference.percent_undefined {
                "n/a".to_string()
            } else {
                format!("{:.2}%", reference.percent_delta.round_dp(2))
            };
            let suffix = if reference.degraded {
                " (oldest available)"
            } else {
                ""
            };
            lines.push(format!(
                "{} days ago: {} ({percent}){suffix}",
                reference.reference_age_days,
                format_value(reference.delta, normalized),
            ));
        }
        Lookback::Unavailable => lines.push("Lookback: not enough history".to_string()),
    }
    lines.push(period_line("Year to date", &stats.year_to_date, normalized));
    lines.push(format!(
        "Year high: {} on {} / low: {} on {}",
        format_value(stats.year_max.1, normalized),
        stats.year_max.0.format(DATE_FORMAT),
        format_value(stats.year_min.1, normalized),
        stats.year_min.0.format(DATE_FORMAT),
    ));
    lines.push(format!("Changes this year: {}", stats.changes_in_year));
    lines
}

fn print_history<R: AsRef<LedgerEntry>>(
    rows: &[R],
    limit: usize,
    normalized: bool,
    today: NaiveDate,
    horizon_days: i64,
    value_of: impl Fn(&R) -> Option<Decimal> + Copy,
) {
    if rows.is_empty() {
        println!("{}", ui::style_text("No price history recorded yet.", ui::StyleType::Subtle));
        return;
    }

    let title = if normalized {
        "Normalized price history"
    } else {
        "Price history"
    };
    println!("\n{}", ui::style_text(title, ui::StyleType::Title));
    println!("{}", history_table(rows, limit, normalized, value_of));

    ui::print_separator();
    match LedgerStats::from_entries(rows, today, horizon_days, value_of) {
        Some(stats) => {
            for line in stats_lines(&stats, normalized) {
                let (label, value) = line.split_once(':').unwrap_or((line.as_str(), ""));
                println!(
                    "{}:{}",
                    ui::style_text(label, ui::StyleType::TotalLabel),
                    ui::style_text(value, ui::StyleType::TotalValue)
                );
            }
        }
        None => println!(
            "{}",
            ui::style_text("No values to summarise.", ui::StyleType::Subtle)
        ),
    }
}

pub fn run_primary(rows: &[LedgerEntry], limit: usize, today: NaiveDate, horizon_days: i64) {
    print_history(rows, limit, false, today, horizon_days, |e: &LedgerEntry| {
        Some(e.value)
    });
}

pub fn run_normalized(
    rows: &[NormalizedLedgerEntry],
    limit: usize,
    today: NaiveDate,
    horizon_days: i64,
) {
    print_history(rows, limit, true, today, horizon_days, |r: &NormalizedLedgerEntry| {
        r.normalized_value
    });
}
