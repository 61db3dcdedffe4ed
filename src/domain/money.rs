use std::fmt;

/// Price of one liter of milk, in currency units.
pub const UNIT_PRICE: f64 = 45.0;

/// Amount owed for a quantity of milk. Always derived, never stored.
/// Example: 3 liters -> 135
pub fn amount(quantity: f64) -> f64 {
    quantity * UNIT_PRICE
}

/// Format a currency amount with two decimals.
/// Example: 135.0 -> "135.00", 112.5 -> "112.50"
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Format liters without trailing noise.
/// Example: 3.0 -> "3", 2.5 -> "2.5"
pub fn format_liters(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{:.0}", quantity)
    } else {
        let formatted = format!("{:.3}", quantity);
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

/// Parse a quantity of liters typed by a user.
/// Accepts "5", "2.5", " 0.75 ". Rejects zero, negatives, NaN and infinities.
pub fn parse_quantity(input: &str) -> Result<f64, ParseQuantityError> {
    let quantity: f64 = input
        .trim()
        .parse()
        .map_err(|_| ParseQuantityError::InvalidFormat)?;

    if !quantity.is_finite() {
        return Err(ParseQuantityError::NotFinite);
    }
    if quantity <= 0.0 {
        return Err(ParseQuantityError::NotPositive);
    }
    Ok(quantity)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseQuantityError {
    InvalidFormat,
    NotFinite,
    NotPositive,
}

impl fmt::Display for ParseQuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseQuantityError::InvalidFormat => write!(f, "invalid quantity format"),
            ParseQuantityError::NotFinite => write!(f, "quantity must be a finite number"),
            ParseQuantityError::NotPositive => write!(f, "quantity must be positive"),
        }
    }
}

impl std::error::Error for ParseQuantityError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_uses_unit_price() {
        assert_eq!(amount(3.0), 135.0);
        assert_eq!(amount(0.0), 0.0);
        assert_eq!(amount(2.5), 112.5);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(135.0), "135.00");
        assert_eq!(format_amount(112.5), "112.50");
        assert_eq!(format_amount(0.0), "0.00");
    }

    #[test]
    fn test_format_liters() {
        assert_eq!(format_liters(3.0), "3");
        assert_eq!(format_liters(2.5), "2.5");
        assert_eq!(format_liters(0.75), "0.75");
        assert_eq!(format_liters(0.0), "0");
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("5"), Ok(5.0));
        assert_eq!(parse_quantity("2.5"), Ok(2.5));
        assert_eq!(parse_quantity(" 0.75 "), Ok(0.75));
    }

    #[test]
    fn test_parse_quantity_invalid() {
        assert_eq!(parse_quantity("abc"), Err(ParseQuantityError::InvalidFormat));
        assert_eq!(parse_quantity("0"), Err(ParseQuantityError::NotPositive));
        assert_eq!(parse_quantity("-1"), Err(ParseQuantityError::NotPositive));
        assert_eq!(parse_quantity("inf"), Err(ParseQuantityError::NotFinite));
        assert_eq!(parse_quantity("NaN"), Err(ParseQuantityError::NotFinite));
    }
}
