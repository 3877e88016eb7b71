use std::fmt;

/// Amounts are integer paise (hundredths of a rupee) so that summing many
/// small expenses never drifts the way floating point would.
/// ₹150.00 = 15000 paise.
pub type Paise = i64;

/// Format paise as a plain decimal string.
/// Example: 15000 -> "150.00", 5 -> "0.05"
pub fn format_paise(paise: Paise) -> String {
    let sign = if paise < 0 { "-" } else { "" };
    let abs = paise.abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Format paise with the rupee sign, the way replies and summaries show
/// amounts. Example: 15000 -> "₹150.00"
pub fn format_rupees(paise: Paise) -> String {
    format!("₹{}", format_paise(paise))
}

/// Parse a decimal string into paise.
/// Example: "150" -> 15000, "150.5" -> 15050, "150.50" -> 15050.
/// Digits past the second decimal place are truncated.
pub fn parse_paise(input: &str) -> Result<Paise, ParsePaiseError> {
    let input = input.trim();
    let (negative, input) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (units_str, frac_str) = match input.split_once('.') {
        Some((u, f)) => (u, f),
        None => (input, ""),
    };

    if frac_str.contains('.') {
        return Err(ParsePaiseError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| ParsePaiseError::InvalidFormat)?
    };

    let frac: i64 = match frac_str.len() {
        0 => 0,
        // "150.5" means 50 paise
        1 => {
            frac_str
                .parse::<i64>()
                .map_err(|_| ParsePaiseError::InvalidFormat)?
                * 10
        }
        _ => frac_str
            .get(..2)
            .ok_or(ParsePaiseError::InvalidFormat)?
            .parse()
            .map_err(|_| ParsePaiseError::InvalidFormat)?,
    };

    let paise = units * 100 + frac;
    Ok(if negative { -paise } else { paise })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsePaiseError {
    InvalidFormat,
}

impl fmt::Display for ParsePaiseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsePaiseError::InvalidFormat => write!(f, "invalid amount format"),
        }
    }
}

impl std::error::Error for ParsePaiseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_paise() {
        assert_eq!(format_paise(15000), "150.00");
        assert_eq!(format_paise(1234), "12.34");
        assert_eq!(format_paise(5), "0.05");
        assert_eq!(format_paise(0), "0.00");
        assert_eq!(format_paise(-15000), "-150.00");
    }

    #[test]
    fn test_format_rupees() {
        assert_eq!(format_rupees(15000), "₹150.00");
        assert_eq!(format_rupees(30), "₹0.30");
    }

    #[test]
    fn test_parse_paise() {
        assert_eq!(parse_paise("150"), Ok(15000));
        assert_eq!(parse_paise("150.00"), Ok(15000));
        assert_eq!(parse_paise("150.5"), Ok(15050));
        assert_eq!(parse_paise("0.01"), Ok(1));
        assert_eq!(parse_paise(".50"), Ok(50));
        assert_eq!(parse_paise("-20"), Ok(-2000));
        assert_eq!(parse_paise("12.999"), Ok(1299)); // truncates
    }

    #[test]
    fn test_parse_paise_invalid() {
        assert!(parse_paise("abc").is_err());
        assert!(parse_paise("12.34.56").is_err());
        assert!(parse_paise("1,50").is_err());
    }
}
