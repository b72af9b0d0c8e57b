// Display formatting for dashboard values

/// Formats minutes as `"{hours}h {minutes}m"`, minutes rounded to one decimal.
pub fn format_minutes(minutes: f64) -> String {
    let hours = (minutes / 60.0).floor();
    let rest = minutes - hours * 60.0;
    let rounded = (rest * 10.0).round() / 10.0;
    format!("{}h {}m", hours as i64, rounded)
}

/// Integer with thousands separators, e.g. `12,345`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_rate(rate: f64) -> String {
    format!("{:.1}%", rate)
}

pub fn format_percent_change(change: f64) -> String {
    if change >= 0.0 {
        format!("+{:.1}%", change)
    } else {
        format!("{:.1}%", change)
    }
}
