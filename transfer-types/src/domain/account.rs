//! Bank account models: the user's target account and the platform's
//! funding account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{UserAccountId, UserId};
use super::money::Currency;
use crate::error::ParseValueError;

/// A bank account number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNumber(String);

impl AccountNumber {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ABA routing number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingNumber(String);

impl RoutingNumber {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoutingNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The legal name a bank account is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    pub first_name: String,
    pub last_name: String,
}

impl PersonName {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Kind of account holder, as the payment provider classifies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Company,
    Individual,
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            AccountType::Company => "COMPANY",
            AccountType::Individual => "INDIVIDUAL",
        };
        write!(f, "{}", kind)
    }
}

impl std::str::FromStr for AccountType {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "COMPANY" => Ok(AccountType::Company),
            "INDIVIDUAL" => Ok(AccountType::Individual),
            _ => Err(ParseValueError::new("account type", s)),
        }
    }
}

/// The bank account a user registered to receive transfers on.
///
/// Transfers embed a copy of this record taken at initiation time, so later
/// changes to the user's bank details never affect an in-flight transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserAccountId,
    pub user_id: UserId,
    pub name: PersonName,
    pub bank_name: String,
    pub account_number: AccountNumber,
    pub routing_number: RoutingNumber,
    pub currency: Currency,
    pub national_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    /// True when the account can receive money in the given currency.
    pub fn is_compatible_with(&self, currency: Currency) -> bool {
        self.currency == currency
    }
}

/// The platform's own bank account, funding every outbound payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformAccount {
    pub account_name: String,
    pub account_number: AccountNumber,
    pub routing_number: RoutingNumber,
    pub currency: Currency,
    pub account_type: AccountType,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_account(currency: Currency) -> UserAccount {
        UserAccount {
            id: UserAccountId::new(1),
            user_id: UserId::new(10),
            name: PersonName::new("Tony", "Stark"),
            bank_name: "BANK OF AMERICA".to_string(),
            account_number: AccountNumber::new("1885226711"),
            routing_number: RoutingNumber::new("211927207"),
            currency,
            national_id: "184969".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_currency_compatibility() {
        let account = user_account(Currency::USD);
        assert!(account.is_compatible_with(Currency::USD));
        assert!(!account.is_compatible_with(Currency::EUR));
    }

    #[test]
    fn test_full_name() {
        let account = user_account(Currency::USD);
        assert_eq!(account.name.full_name(), "Tony Stark");
    }
}
