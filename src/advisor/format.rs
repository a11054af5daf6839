//! Money display helpers for advice text

/// Fixed two-decimal amount, e.g. `166.67`
pub fn money(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// One-decimal percentage without the sign, e.g. `33.3`
pub fn percent(value: f64) -> String {
    format!("{:.1}", value)
}

/// Grouped amount with up to three fraction digits, e.g. `1,234.5`
pub fn grouped(amount: f64) -> String {
    let magnitude = amount.abs();
    if !magnitude.is_finite() {
        return "0".to_string();
    }
    let scaled = (magnitude * 1000.0).round();
    // Past 1e15 an f64 carries no thousandths, so only the whole part is printed
    let (whole, fraction) = if scaled < 1e15 {
        let fraction = scaled % 1000.0;
        ((scaled - fraction) / 1000.0, fraction as u32)
    } else {
        (magnitude.round(), 0)
    };

    let digits = format!("{:.0}", whole);
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 6);
    if amount < 0.0 && (whole > 0.0 || fraction > 0) {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    if fraction > 0 {
        let fraction = format!("{:03}", fraction);
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }

    out
}
