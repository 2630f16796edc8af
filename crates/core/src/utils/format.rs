use chrono::NaiveDate;

/// Format an amount as `###,###,##0.00`: comma thousands separator, two
/// decimals, leading `-` for negative amounts.
pub fn format_price(price: f64) -> String {
    let fixed = format!("{:.2}", price.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let negative = price < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    if negative {
        format!("-{grouped}.{frac_part}")
    } else {
        format!("{grouped}.{frac_part}")
    }
}

/// Format a date as `dd/MM/yyyy`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_price(1234567.891), "1,234,567.89");
        assert_eq!(format_price(999.0), "999.00");
        assert_eq!(format_price(1000.0), "1,000.00");
    }

    #[test]
    fn small_and_negative_amounts() {
        assert_eq!(format_price(0.0), "0.00");
        assert_eq!(format_price(3.5), "3.50");
        assert_eq!(format_price(-1500.25), "-1,500.25");
        assert_eq!(format_price(-0.001), "0.00");
    }

    #[test]
    fn pads_day_and_month() {
        let d = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(format_date(d), "01/05/2024");
    }
}
