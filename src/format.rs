//! Display strings for trip responses: rupee amounts with Indian digit
//! grouping and calendar dates.

use chrono::NaiveDate;

pub const RUPEE: char = '₹';

/// `₹1,23,456.5` style amount. Fractions are kept to at most two places.
pub fn format_inr(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push(RUPEE);
    out.push_str(&group_indian(whole));
    if fraction != 0 {
        let digits = format!("{fraction:02}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

/// Last three digits, then groups of two: 12,34,56,789.
fn group_indian(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (left, right) = rest.split_at(rest.len() - 2);
        groups.push(right);
        rest = left;
    }
    groups.push(rest);
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

pub fn display_date(date: NaiveDate) -> String {
    date.format("%-d/%-m/%Y").to_string()
}

pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `d/m/yyyy - d/m/yyyy`, or `None` when either end is missing.
pub fn date_span(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<String> {
    match (start, end) {
        (Some(start), Some(end)) => Some(format!("{} - {}", display_date(start), display_date(end))),
        _ => None,
    }
}

/// Zero and missing amounts both count as "not set".
pub fn budget_text(budget: Option<f64>) -> Option<String> {
    budget.filter(|amount| *amount != 0.0).map(format_inr)
}

pub fn duration_text(days: Option<i64>) -> Option<String> {
    days.filter(|days| *days != 0).map(|days| format!("{days} days"))
}
