//! Numeric primitives shared by the interpreter and the comparison engine.
//!
//! Rounding is half-up (toward positive infinity on exact halves) so rendered figures match
//! what operators see from the scoring service's own tooling.

/// Bound a raw model score to the displayable 0-100 range. NaN collapses to 0.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Round half-up to one decimal place.
pub fn round1(value: f64) -> f64 {
    round_half_up(value * 10.0) / 10.0
}

fn round_half_up(value: f64) -> f64 {
    // adding 0.0 turns -0.0 into 0.0 so it never renders as "-0"
    (value + 0.5).floor() + 0.0
}

/// Relative change from `old_value` to `new_value`; positive when the new value is larger.
///
/// `None` when `old_value` is zero.
pub fn percent_change(old_value: f64, new_value: f64) -> Option<f64> {
    if old_value == 0.0 {
        return None;
    }
    Some((new_value - old_value) / old_value.abs())
}

/// Relative reduction; positive when the new value is smaller.
pub fn percent_reduction(old_value: f64, new_value: f64) -> Option<f64> {
    percent_change(old_value, new_value).map(|change| -change)
}

/// Render the magnitude of a fractional change as a percentage.
///
/// Changes of 10% or more use whole percents, smaller ones keep a decimal so a real
/// change never shows as "0%".
pub fn format_percent(fraction: f64) -> String {
    let magnitude = fraction.abs() * 100.0;
    if magnitude >= 10.0 {
        format!("{}%", round_half_up(magnitude))
    } else {
        format!("{}%", round1(magnitude))
    }
}

/// Prefix positive values with `+`; negatives keep their own sign.
pub fn format_signed(value: f64, decimals: u8) -> String {
    let rounded = if decimals == 0 {
        round_half_up(value)
    } else {
        round1(value)
    };
    if rounded > 0.0 {
        format!("+{rounded}")
    } else {
        format!("{rounded}")
    }
}

/// Whole-dollar amount with thousands separators, e.g. `$12,500` or `-$300`.
pub fn format_currency(amount: f64) -> String {
    let dollars = round_half_up(amount);
    let digits = format!("{}", dollars.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if dollars < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}
