//! Plain-text reports handed to notifiers

use crate::core::change::{ChangeKind, DailyChange};
use crate::core::lookback::Lookback;
use crate::core::price::PriceObservation;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;

const RULE: &str = "--------------------------";
const DISPLAY_DATE_TIME: &str = "%d/%m/%Y %H:%M";

/// Renders `value` as `$1,234.56`.
pub fn format_money(value: Decimal) -> String {
    let rendered = format!("{:.2}", value.abs().round_dp(2));
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((&rendered, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value.is_sign_negative() && !value.round_dp(2).is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{frac_part}")
}

fn marker(delta: Decimal) -> &'static str {
    if delta.is_sign_positive() && !delta.is_zero() {
        "▲"
    } else {
        "▼"
    }
}

/// The message sent on every accepted run.
pub fn daily_report(
    label: &str,
    observation: &PriceObservation,
    change: &DailyChange,
    checked_at: NaiveDateTime,
) -> String {
    let effective = observation.effective_date.format(DISPLAY_DATE_TIME);
    match change.kind {
        ChangeKind::FirstObservation => format!(
            "TRACKING STARTED\n{label}\nSource: {}\nInitial price: {}",
            observation.source_label,
            format_money(change.new_value),
        ),
        ChangeKind::NoChange => format!(
            "NO PRICE CHANGE\n{RULE}\n{label}\n\nCurrent price: {}\nStatus: stable\nEffective since: {effective}\nChecked: {}",
            format_money(change.new_value),
            checked_at.format(DISPLAY_DATE_TIME),
        ),
        ChangeKind::Increase | ChangeKind::Decrease => {
            let m = marker(change.delta);
            format!(
                "{m} PRICE CHANGE DETECTED\n{RULE}\n{label}\n\nPrevious price: {}\nNew price: {}\nChange: {m} {} ({:.2}%)\n\nEffective since: {effective}",
                format_money(change.previous_value.unwrap_or_default()),
                format_money(change.new_value),
                format_money(change.delta),
                change.percent_delta.round_dp(2),
            )
        }
    }
}

/// The follow-up comparison against the lookback reference, if there is one.
pub fn monthly_report(lookback: &Lookback) -> Option<String> {
    let reference = lookback.reference()?;
    let m = marker(reference.delta);
    let percent = if reference.percent_undefined {
        "n/a".to_string()
    } else {
        format!("{:.2}%", reference.percent_delta.round_dp(2))
    };

    Some(format!(
        "MONTHLY COMPARISON\n{RULE}\nPrice {} days ago: {}\nNominal change: {m} {}\nPercent change: {m} {percent}",
        reference.reference_age_days,
        format_money(reference.reference_value),
        format_money(reference.delta),
    ))
}
