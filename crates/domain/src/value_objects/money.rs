//! Money with an explicit currency.

use common::{Failure, Outcome, ValueObject};
use serde::{Deserialize, Serialize};

/// Currencies accepted for ticket prices and fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Lkr,
    Cad,
    Gbp,
    Eur,
    Aud,
}

impl Currency {
    /// Parses an ISO 4217 code, case-insensitively.
    pub fn parse(code: &str) -> Outcome<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "LKR" => Ok(Currency::Lkr),
            "CAD" => Ok(Currency::Cad),
            "GBP" => Ok(Currency::Gbp),
            "EUR" => Ok(Currency::Eur),
            "AUD" => Ok(Currency::Aud),
            "" => Err(Failure::validation("Currency is required")),
            other => Err(Failure::validation(format!("Unsupported currency: {other}"))),
        }
    }

    /// Returns the ISO code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Lkr => "LKR",
            Currency::Cad => "CAD",
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Aud => "AUD",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Non-negative amount in minor units (cents) paired with its currency.
///
/// Amounts in different currencies never combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount_minor: i64,
    currency: Currency,
}

impl Money {
    /// Validates an amount in minor units and a currency code.
    pub fn create(amount_minor: i64, currency: &str) -> Outcome<Self> {
        let currency = Currency::parse(currency)?;
        if amount_minor < 0 {
            return Err(Failure::validation("Amount cannot be negative"));
        }
        Ok(Self {
            amount_minor,
            currency,
        })
    }

    /// Zero in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount_minor: 0,
            currency,
        }
    }

    /// Returns the amount in minor units.
    pub fn amount_minor(&self) -> i64 {
        self.amount_minor
    }

    /// Returns the currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount_minor == 0
    }

    /// Multiplies by a quantity, failing when the result does not fit.
    pub fn multiply(&self, quantity: u32) -> Outcome<Money> {
        self.amount_minor
            .checked_mul(i64::from(quantity))
            .map(|amount_minor| Money {
                amount_minor,
                currency: self.currency,
            })
            .ok_or_else(|| Failure::validation("Amount is too large"))
    }
}

impl ValueObject for Money {}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}.{:02}",
            self.currency,
            self.amount_minor / 100,
            self.amount_minor % 100
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::OutcomeExt;

    #[test]
    fn test_create_valid_money() {
        let money = Money::create(2500, "usd").unwrap();
        assert_eq!(money.amount_minor(), 2500);
        assert_eq!(money.currency(), Currency::Usd);
        assert_eq!(money.to_string(), "USD 25.00");
    }

    #[test]
    fn test_negative_amount_rejected() {
        let outcome = Money::create(-1, "USD");
        assert_eq!(outcome.messages(), vec!["Amount cannot be negative"]);
    }

    #[test]
    fn test_unknown_currency_rejected() {
        assert!(Money::create(100, "XYZ").unwrap_err().mentions("Unsupported currency"));
        assert_eq!(
            Money::create(100, " ").messages(),
            vec!["Currency is required"]
        );
    }

    #[test]
    fn test_equality_includes_currency() {
        assert_eq!(
            Money::create(100, "EUR").unwrap(),
            Money::create(100, "eur").unwrap()
        );
        assert_ne!(
            Money::create(100, "EUR").unwrap(),
            Money::create(100, "GBP").unwrap()
        );
    }

    #[test]
    fn test_multiply() {
        let price = Money::create(1250, "CAD").unwrap();
        let total = price.multiply(3).unwrap();
        assert_eq!(total.amount_minor(), 3750);
        assert_eq!(total.currency(), Currency::Cad);
    }

    #[test]
    fn test_multiply_overflow_is_rejected() {
        let price = Money::create(i64::MAX, "USD").unwrap();
        assert_eq!(price.multiply(1).unwrap(), price);
        assert_eq!(price.multiply(2).messages(), vec!["Amount is too large"]);
    }
}
