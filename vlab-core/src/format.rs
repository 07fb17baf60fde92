//! Presentation helpers for metrics.
//!
//! All helpers accept `f64` or `Option<f64>`; absent or non-finite values
//! render as [`NOT_AVAILABLE`].

pub const NOT_AVAILABLE: &str = "N/A";

fn finite(value: impl Into<Option<f64>>) -> Option<f64> {
    value.into().filter(|v| v.is_finite())
}

/// Fraction as a percentage: `0.153` → `"15.30%"` at precision 2.
pub fn format_percentage(value: impl Into<Option<f64>>, precision: usize) -> String {
    match finite(value) {
        Some(v) => format!("{:.*}%", precision, v * 100.0),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Number with thousands separators: `12345.678` → `"12,345.68"`.
pub fn format_number(value: impl Into<Option<f64>>, precision: usize) -> String {
    let Some(v) = finite(value) else {
        return NOT_AVAILABLE.to_string();
    };
    let s = format!("{:.*}", precision, v.abs());
    let (int_part, dec_part) = match s.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (s.as_str(), None),
    };

    let chars: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(chars.len() + chars.len() / 3);
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    let negative = v < 0.0 && s.chars().any(|c| c != '0' && c != '.');
    let sign = if negative { "-" } else { "" };
    match dec_part {
        Some(d) => format!("{sign}{grouped}.{d}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Plain ratio such as a Sharpe ratio: `1.8512` → `"1.85"`.
pub fn format_ratio(value: impl Into<Option<f64>>) -> String {
    match finite(value) {
        Some(v) => format!("{v:.2}"),
        None => NOT_AVAILABLE.to_string(),
    }
}
