use crate::aggregate::round2;

/// Format an amount the way the expense table shows it: `$ 1,234.56`.
///
/// Always two fractional digits with comma thousands separators. Rounding
/// is half away from zero, the same rule totals use, and a negative sign
/// goes in front of the symbol (`-$ 5.00`).
pub fn money(val: f64) -> String {
    let rounded = round2(val);
    let cents = format!("{:.2}", rounded.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if rounded < 0.0 {
        format!("-$ {with_commas}.{dec_part}")
    } else {
        format!("$ {with_commas}.{dec_part}")
    }
}
