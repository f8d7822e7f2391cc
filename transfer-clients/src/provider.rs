//! Payment provider adapter.
//!
//! The provider answers 2xx and 5xx with the same envelope carrying its
//! record of the payment, so 5xx bodies are parsed rather than discarded;
//! a reported timeout in there is what makes an attempt retryable.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use transfer_types::{
    AccountType, Currency, Money, Payment, PaymentError, PaymentProvider, PaymentProviderError,
    PaymentStatus, PaymentTransactionId, PlatformAccount, TransferId, UserAccount,
};

/// HTTP adapter for the payment provider.
pub struct ProviderPaymentClient {
    base_url: String,
    http: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentRequest {
    source: Source,
    destination: Destination,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Source {
    #[serde(rename = "type")]
    account_type: AccountType,
    source_information: SourceInformation,
    account: AccountDetails,
}

#[derive(Debug, Serialize)]
struct SourceInformation {
    name: String,
}

#[derive(Debug, Serialize)]
struct Destination {
    name: String,
    account: AccountDetails,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountDetails {
    account_number: String,
    currency: Currency,
    routing_number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentResponse {
    request_info: RequestInfo,
    payment_info: PaymentInfo,
}

#[derive(Debug, Deserialize)]
struct RequestInfo {
    status: String,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaymentInfo {
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    amount: Option<Decimal>,
}

impl ProviderPaymentClient {
    /// Creates a new provider client.
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }
}

#[async_trait]
impl PaymentProvider for ProviderPaymentClient {
    #[tracing::instrument(
        skip(self, target, source),
        fields(transfer_id = %transfer_id, amount = %amount)
    )]
    async fn make_payment(
        &self,
        transfer_id: TransferId,
        amount: Money,
        target: &UserAccount,
        source: &PlatformAccount,
    ) -> Result<Payment, PaymentProviderError> {
        let request = build_request(amount, source, target);
        let url = format!("{}/api/v1/payments", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentProviderError::Transport(e.to_string()))?;

        // 4xx means the request itself was bad; there is no payment record
        // to parse.
        if status.is_client_error() {
            return Err(PaymentProviderError::Rejected(format!(
                "status {}: {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: PaymentResponse = serde_json::from_str(&body)
            .map_err(|e| PaymentProviderError::InvalidBody(e.to_string()))?;
        to_payment(parsed, amount)
    }
}

/// Assembles the provider request.
///
/// # Panics
/// Panics when source, target and amount currencies disagree; initiation
/// validates currencies, so a mismatch here is a logic bug.
fn build_request(amount: Money, source: &PlatformAccount, target: &UserAccount) -> PaymentRequest {
    assert!(
        source.currency == amount.currency() && target.is_compatible_with(amount.currency()),
        "Cannot make a payment between accounts with different currencies"
    );
    PaymentRequest {
        source: Source {
            account_type: source.account_type,
            source_information: SourceInformation {
                name: source.account_name.clone(),
            },
            account: AccountDetails {
                account_number: source.account_number.as_str().to_string(),
                currency: source.currency,
                routing_number: source.routing_number.as_str().to_string(),
            },
        },
        destination: Destination {
            name: target.name.full_name(),
            account: AccountDetails {
                account_number: target.account_number.as_str().to_string(),
                currency: target.currency,
                routing_number: target.routing_number.as_str().to_string(),
            },
        },
        amount: amount.amount(),
    }
}

fn to_payment(response: PaymentResponse, requested: Money) -> Result<Payment, PaymentProviderError> {
    let status: PaymentStatus = response
        .request_info
        .status
        .parse()
        .map_err(|_| {
            PaymentProviderError::InvalidBody(format!(
                "unrecognised payment status: {}",
                response.request_info.status
            ))
        })?;
    let id = response
        .payment_info
        .id
        .ok_or_else(|| PaymentProviderError::InvalidBody("payment id missing".to_string()))?;
    let amount = response
        .payment_info
        .amount
        .map(|value| Money::new(value, requested.currency()))
        .unwrap_or(requested);

    Ok(Payment::new(
        PaymentTransactionId::from_uuid(id),
        amount,
        status,
        response.request_info.error.map(PaymentError::new),
    ))
}

fn map_transport(err: reqwest::Error) -> PaymentProviderError {
    if err.is_timeout() {
        PaymentProviderError::Timeout
    } else {
        PaymentProviderError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use transfer_types::{AccountNumber, PersonName, RoutingNumber, UserAccountId, UserId};

    fn platform_account() -> PlatformAccount {
        PlatformAccount {
            account_name: "TRANSFERS INC".to_string(),
            account_number: AccountNumber::new("0245253419"),
            routing_number: RoutingNumber::new("028444018"),
            currency: Currency::USD,
            account_type: AccountType::Company,
        }
    }

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
    fn test_request_wire_shape() {
        let request = build_request(
            Money::new(dec!(900), Currency::USD),
            &platform_account(),
            &user_account(Currency::USD),
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["source"]["type"], "COMPANY");
        assert_eq!(json["source"]["sourceInformation"]["name"], "TRANSFERS INC");
        assert_eq!(json["source"]["account"]["accountNumber"], "0245253419");
        assert_eq!(json["source"]["account"]["routingNumber"], "028444018");
        assert_eq!(json["destination"]["name"], "Tony Stark");
        assert_eq!(json["destination"]["account"]["currency"], "USD");
        assert!(json["amount"].is_number());
    }

    #[test]
    #[should_panic(expected = "different currencies")]
    fn test_request_rejects_currency_mismatch() {
        build_request(
            Money::new(dec!(900), Currency::USD),
            &platform_account(),
            &user_account(Currency::EUR),
        );
    }

    #[test]
    fn test_successful_body_maps_to_processing_payment() {
        let body = r#"{
            "requestInfo": { "status": "Processing" },
            "paymentInfo": { "amount": 900, "id": "7871259b-b6d6-4f09-b9b4-0f0188735531" }
        }"#;
        let parsed: PaymentResponse = serde_json::from_str(body).unwrap();
        let payment = to_payment(parsed, Money::new(dec!(900), Currency::USD)).unwrap();

        assert_eq!(payment.status(), PaymentStatus::Processing);
        assert_eq!(payment.amount().amount(), dec!(900));
        assert!(payment.error().is_none());
        assert!(payment.is_current());
    }

    #[test]
    fn test_timeout_failure_body_maps_to_retryable_payment() {
        let body = r#"{
            "requestInfo": { "status": "Failed", "error": "Timeout while connecting to bank network" },
            "paymentInfo": { "amount": 900, "id": "7871259b-b6d6-4f09-b9b4-0f0188735531" }
        }"#;
        let parsed: PaymentResponse = serde_json::from_str(body).unwrap();
        let payment = to_payment(parsed, Money::new(dec!(900), Currency::USD)).unwrap();

        assert!(payment.is_failed());
        assert!(payment.is_retryable());
    }

    #[test]
    fn test_rejection_body_maps_to_terminal_failure() {
        let body = r#"{
            "requestInfo": { "status": "Failed", "error": "bank rejected the payment" },
            "paymentInfo": { "amount": 900, "id": "7871259b-b6d6-4f09-b9b4-0f0188735531" }
        }"#;
        let parsed: PaymentResponse = serde_json::from_str(body).unwrap();
        let payment = to_payment(parsed, Money::new(dec!(900), Currency::USD)).unwrap();

        assert!(payment.is_failed());
        assert!(!payment.is_retryable());
    }

    #[test]
    fn test_missing_payment_id_is_invalid_body() {
        let body = r#"{
            "requestInfo": { "status": "Failed", "error": "timeout" },
            "paymentInfo": {}
        }"#;
        let parsed: PaymentResponse = serde_json::from_str(body).unwrap();
        let result = to_payment(parsed, Money::new(dec!(900), Currency::USD));
        assert!(matches!(result, Err(PaymentProviderError::InvalidBody(_))));
    }

    #[test]
    fn test_unknown_status_is_invalid_body() {
        let body = r#"{
            "requestInfo": { "status": "Settled" },
            "paymentInfo": { "id": "7871259b-b6d6-4f09-b9b4-0f0188735531" }
        }"#;
        let parsed: PaymentResponse = serde_json::from_str(body).unwrap();
        let result = to_payment(parsed, Money::new(dec!(900), Currency::USD));
        assert!(matches!(result, Err(PaymentProviderError::InvalidBody(_))));
    }

    #[test]
    fn test_missing_amount_falls_back_to_requested() {
        let body = r#"{
            "requestInfo": { "status": "Processing" },
            "paymentInfo": { "id": "7871259b-b6d6-4f09-b9b4-0f0188735531" }
        }"#;
        let parsed: PaymentResponse = serde_json::from_str(body).unwrap();
        let payment = to_payment(parsed, Money::new(dec!(900.50), Currency::USD)).unwrap();
        assert_eq!(payment.amount().amount(), dec!(900.50));
    }
}
