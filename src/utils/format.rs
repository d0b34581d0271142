//! Display-side number formatting. Market fields travel as decimal strings;
//! this is where they become human-readable text.

/// Compact notation for large magnitudes: `1.20t`, `12.34b`, `5.00m`,
/// otherwise thousands-grouped with two decimals.
pub fn format_compact(value: f64) -> String {
    if value >= 1e12 {
        return format!("{:.2}t", value / 1e12);
    }
    if value >= 1e9 {
        return format!("{:.2}b", value / 1e9);
    }
    if value >= 1e6 {
        return format!("{:.2}m", value / 1e6);
    }
    group_thousands(value, 2)
}

/// Price display: sub-dollar assets keep more precision so small moves
/// remain visible.
pub fn format_price(value: f64) -> String {
    if value < 1.0 {
        format!("${value:.6}")
    } else {
        format!("${}", group_thousands(value, 2))
    }
}

/// Signed percent with two decimals, e.g. `+1.52%` / `-0.80%`.
pub fn format_percent(value: f64) -> String {
    if value >= 0.0 {
        format!("+{value:.2}%")
    } else {
        format!("{value:.2}%")
    }
}

fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{value:.decimals$}");
    let (integral, fraction) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let (sign, digits) = match integral.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", integral),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}
