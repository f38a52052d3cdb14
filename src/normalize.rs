use thiserror::Error;

/// Supplier token meaning "more than ten units in stock".
const MANY_TOKEN: &str = ">10";
const MANY_STOCK: u32 = 100;

/// A single remaining unit is never advertised.
const LAST_UNIT_TOKEN: &str = "1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("unrecognised quantity token `{0}`")]
    Quantity(String),
    #[error("price `{0}` has no digits before the decimal point")]
    EmptyPrice(String),
    #[error("price `{0}` does not fit into an integer")]
    PriceOverflow(String),
}

/// Maps a raw supplier quantity token to the stock count pushed to marketplaces.
pub fn normalize_quantity(raw: &str) -> Result<u32, FormatError> {
    match raw {
        MANY_TOKEN => Ok(MANY_STOCK),
        LAST_UNIT_TOKEN => Ok(0),
        other => other
            .parse::<u32>()
            .map_err(|_| FormatError::Quantity(other.to_string())),
    }
}

/// Reduces a supplier price such as `5'990.00 руб.` to its whole-unit value.
///
/// Everything from the first `.` onwards is dropped, then every non-digit in
/// the remaining prefix. A price without any `.` keeps all of its digits.
pub fn normalize_price(raw: &str) -> Result<u64, FormatError> {
    let whole = raw.split('.').next().unwrap_or_default();
    let digits: String = whole.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(FormatError::EmptyPrice(raw.to_string()));
    }
    digits
        .parse::<u64>()
        .map_err(|_| FormatError::PriceOverflow(raw.to_string()))
}
