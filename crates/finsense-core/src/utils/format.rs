use chrono::{DateTime, NaiveDate};

/// Placeholder shown for missing values
pub const MISSING: &str = "—";

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an API date as e.g. "January 5, 2024".
/// Unparseable input is returned as-is; missing input becomes a dash.
pub fn format_date(date: Option<&str>) -> String {
    let Some(date) = date.filter(|d| !d.trim().is_empty()) else {
        return MISSING.to_string();
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        dt.format("%B %-d, %Y").to_string()
    } else if let Some(day) = date.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()) {
        day.format("%B %-d, %Y").to_string()
    } else {
        date.to_string()
    }
}

/// Format a rupee amount with thousands separators, e.g. "₹12,345.50".
/// Whole amounts are shown without decimals.
pub fn format_amount(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if fraction == 0 {
        format!("{}₹{}", sign, grouped)
    } else {
        format!("{}₹{}.{:02}", sign, grouped, fraction)
    }
}
