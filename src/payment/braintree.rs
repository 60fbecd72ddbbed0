//! Braintree GraphQL client.

use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};

use super::{GatewayError, PaymentGateway, SaleOptions, format_amount, parse_amount};
use crate::{config::BraintreeConfig, models::PaymentRecord};

const API_VERSION: &str = "2019-01-01";

const CLIENT_TOKEN_MUTATION: &str = r#"
mutation ClientToken($input: CreateClientTokenInput) {
  createClientToken(input: $input) { clientToken }
}"#;

const CHARGE_MUTATION: &str = r#"
mutation Charge($input: ChargePaymentMethodInput!) {
  chargePaymentMethod(input: $input) {
    transaction { id status amount { value currencyCode } createdAt }
  }
}"#;

const AUTHORIZE_MUTATION: &str = r#"
mutation Authorize($input: AuthorizePaymentMethodInput!) {
  authorizePaymentMethod(input: $input) {
    transaction { id status amount { value currencyCode } createdAt }
  }
}"#;

const REVERSE_MUTATION: &str = r#"
mutation Reverse($input: ReverseTransactionInput!) {
  reverseTransaction(input: $input) { clientMutationId }
}"#;

/// Statuses that mean the money was authorized or captured.
const SUCCESS_STATUSES: [&str; 5] = [
    "AUTHORIZED",
    "SUBMITTED_FOR_SETTLEMENT",
    "SETTLING",
    "SETTLEMENT_PENDING",
    "SETTLED",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BraintreeEnvironment {
    Sandbox,
    Production,
}

impl BraintreeEnvironment {
    pub fn endpoint(&self) -> &'static str {
        match self {
            BraintreeEnvironment::Sandbox => "https://payments.sandbox.braintree-api.com/graphql",
            BraintreeEnvironment::Production => "https://payments.braintree-api.com/graphql",
        }
    }
}

impl FromStr for BraintreeEnvironment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sandbox" => Ok(BraintreeEnvironment::Sandbox),
            "production" => Ok(BraintreeEnvironment::Production),
            other => anyhow::bail!("unknown BRAINTREE_ENVIRONMENT `{other}`"),
        }
    }
}

pub struct BraintreeGateway {
    client: reqwest::Client,
    endpoint: String,
    public_key: String,
    private_key: String,
    merchant_account_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(default)]
    extensions: Option<GraphQlErrorExtensions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlErrorExtensions {
    error_class: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientTokenData {
    create_client_token: ClientTokenPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientTokenPayload {
    client_token: String,
}

#[derive(Debug, Deserialize)]
struct TransactionPayload {
    transaction: TransactionNode,
}

#[derive(Debug, Deserialize)]
struct TransactionNode {
    id: String,
    status: String,
    amount: Option<MoneyNode>,
}

#[derive(Debug, Deserialize)]
struct MoneyNode {
    value: String,
}

impl BraintreeGateway {
    pub fn new(config: &BraintreeConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.environment.endpoint().to_string(),
            public_key: config.public_key.clone(),
            private_key: config.private_key.clone(),
            merchant_account_id: config.merchant_account_id.clone(),
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.public_key, Some(&self.private_key))
            .header("Braintree-Version", API_VERSION)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() || status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(GatewayError::Provider(format!("braintree responded {status}")));
        }

        let body: GraphQlResponse<T> = response.json().await?;
        if let Some(err) = body.errors.into_iter().next() {
            return Err(classify_error(err));
        }
        body.data
            .ok_or_else(|| GatewayError::Provider("braintree response without data".into()))
    }
}

fn classify_error(err: GraphQlError) -> GatewayError {
    let class = err
        .extensions
        .and_then(|ext| ext.error_class)
        .unwrap_or_default();
    match class.as_str() {
        "VALIDATION" | "NOT_FOUND" | "UNSUPPORTED_CLIENT" => GatewayError::Declined(err.message),
        _ => GatewayError::Provider(format!("{class}: {}", err.message)),
    }
}

fn into_record(
    node: TransactionNode,
    raw: Value,
    requested: i64,
) -> Result<PaymentRecord, GatewayError> {
    if !SUCCESS_STATUSES.contains(&node.status.as_str()) {
        return Err(GatewayError::Declined(format!(
            "transaction {} ended as {}",
            node.id, node.status
        )));
    }
    let amount = node
        .amount
        .as_ref()
        .and_then(|money| parse_amount(&money.value))
        .unwrap_or(requested);
    Ok(PaymentRecord {
        transaction_id: node.id,
        status: node.status,
        amount,
        raw,
    })
}

#[async_trait]
impl PaymentGateway for BraintreeGateway {
    async fn generate_client_token(&self) -> Result<String, GatewayError> {
        let mut input = json!({});
        if let Some(merchant) = &self.merchant_account_id {
            input = json!({ "clientToken": { "merchantAccountId": merchant } });
        }
        let data: ClientTokenData = self
            .execute(CLIENT_TOKEN_MUTATION, json!({ "input": input }))
            .await?;
        Ok(data.create_client_token.client_token)
    }

    async fn sale(
        &self,
        amount: i64,
        nonce: &str,
        options: SaleOptions,
    ) -> Result<PaymentRecord, GatewayError> {
        let mut transaction = json!({ "amount": format_amount(amount) });
        if let Some(merchant) = &self.merchant_account_id {
            transaction["merchantAccountId"] = json!(merchant);
        }
        let variables = json!({
            "input": { "paymentMethodId": nonce, "transaction": transaction }
        });

        let (query, field) = if options.submit_for_settlement {
            (CHARGE_MUTATION, "chargePaymentMethod")
        } else {
            (AUTHORIZE_MUTATION, "authorizePaymentMethod")
        };
        let mut data: Value = self.execute(query, variables).await?;
        let payload = data
            .get_mut(field)
            .map(Value::take)
            .ok_or_else(|| GatewayError::Provider(format!("missing `{field}` in response")))?;
        let parsed: TransactionPayload = serde_json::from_value(payload.clone())
            .map_err(|e| GatewayError::Provider(e.to_string()))?;

        into_record(parsed.transaction, payload["transaction"].clone(), amount)
    }

    async fn void(&self, transaction_id: &str) -> Result<(), GatewayError> {
        let _: Value = self
            .execute(
                REVERSE_MUTATION,
                json!({ "input": { "transactionId": transaction_id } }),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(status: &str, value: &str) -> TransactionNode {
        TransactionNode {
            id: "tx_1".into(),
            status: status.into(),
            amount: Some(MoneyNode {
                value: value.into(),
            }),
        }
    }

    #[test]
    fn settled_transaction_becomes_record() {
        let record =
            into_record(node("SUBMITTED_FOR_SETTLEMENT", "35.00"), json!({}), 3500).unwrap();
        assert_eq!(record.transaction_id, "tx_1");
        assert_eq!(record.amount, 3500);
    }

    #[test]
    fn processor_decline_is_declined() {
        let err = into_record(node("PROCESSOR_DECLINED", "35.00"), json!({}), 3500).unwrap_err();
        assert!(matches!(err, GatewayError::Declined(_)));
    }

    #[test]
    fn validation_errors_are_declines_and_others_are_faults() {
        let declined = classify_error(GraphQlError {
            message: "Unknown or expired payment method ID.".into(),
            extensions: Some(GraphQlErrorExtensions {
                error_class: Some("VALIDATION".into()),
            }),
        });
        assert!(matches!(declined, GatewayError::Declined(_)));

        let fault = classify_error(GraphQlError {
            message: "boom".into(),
            extensions: Some(GraphQlErrorExtensions {
                error_class: Some("INTERNAL".into()),
            }),
        });
        assert!(matches!(fault, GatewayError::Provider(_)));
    }

    #[test]
    fn environment_parses_case_insensitively() {
        assert_eq!(
            "Sandbox".parse::<BraintreeEnvironment>().unwrap(),
            BraintreeEnvironment::Sandbox
        );
        assert!("staging".parse::<BraintreeEnvironment>().is_err());
    }
}
