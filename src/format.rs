//! Numeric display helpers shared by the form, the creator and the console.

/// Groups the integer part of `value` with `,` separators.
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    format_thousands_str(&value.to_string())
}

/// Same as [`format_thousands`] for text input. The decimal part of a plain
/// decimal number is passed through untouched. Other forms `f64` parses, such
/// as `1e5`, are grouped by value; anything unparsable yields `"0"`.
pub fn format_thousands_str(text: &str) -> String {
    let trimmed = text.trim();
    let (sign, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let int_digits: String = int_part.chars().filter(|c| *c != ',').collect();
    let valid = !int_digits.is_empty()
        && int_digits.chars().all(|c| c.is_ascii_digit())
        && frac_part.map_or(true, |f| f.chars().all(|c| c.is_ascii_digit()));
    if !valid {
        let value = parse_numeric(trimmed);
        return if value == 0.0 {
            "0".to_string()
        } else {
            format_thousands(value)
        };
    }

    let mut grouped = String::with_capacity(int_digits.len() + int_digits.len() / 3);
    for (i, c) in int_digits.chars().enumerate() {
        if i > 0 && (int_digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Display form used for notional amounts: two decimals, grouped.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    format_thousands_str(&format!("{:.2}", value))
}

/// Strips grouping separators and parses; unparsable or non-finite input is 0.
pub fn parse_numeric(text: &str) -> f64 {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
