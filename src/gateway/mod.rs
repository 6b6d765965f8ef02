//! Payment gateway relay: builds the signed form-field map the hosted
//! checkout page expects, and verifies the checksum on the browser-redirected
//! callback before any status is trusted.

pub mod signer;

use std::collections::BTreeMap;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::GatewaySigner;

pub use signer::HmacSha256Signer;

/// Order summary forwarded to the gateway on payment initiation.
#[derive(Debug, Clone)]
pub struct InitiatePayment {
    pub order_id: Uuid,
    pub amount: BigDecimal,
    pub customer_id: String,
    pub callback_url: String,
    pub email: String,
    pub phone: String,
}

/// Everything the storefront needs to auto-submit the redirect form to the
/// gateway's hosted page.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub redirect_url: String,
    pub fields: BTreeMap<String, String>,
}

/// Redirect-callback parameters as received on `/checkout/callback`.
#[derive(Debug, Clone)]
pub struct CallbackParams {
    pub status: String,
    pub order_id: Uuid,
    pub txn_id: Option<String>,
    pub checksum: String,
}

impl CallbackParams {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

pub struct PaymentGateway {
    signer: Arc<dyn GatewaySigner>,
    merchant_key: String,
    checkout_url: String,
}

impl PaymentGateway {
    pub fn new(
        signer: Arc<dyn GatewaySigner>,
        merchant_key: impl Into<String>,
        checkout_url: impl Into<String>,
    ) -> Self {
        Self {
            signer,
            merchant_key: merchant_key.into(),
            checkout_url: checkout_url.into(),
        }
    }

    /// Build the signed request for the gateway's hosted checkout page.
    pub fn prepare(&self, payment: &InitiatePayment) -> Result<GatewayRequest, DomainError> {
        if payment.amount <= BigDecimal::from(0) {
            return Err(DomainError::InvalidInput(
                "amount must be positive".to_string(),
            ));
        }
        if payment.email.is_empty() {
            return Err(DomainError::InvalidInput("email is required".to_string()));
        }

        let mut fields = BTreeMap::new();
        fields.insert("key".to_string(), self.merchant_key.clone());
        fields.insert("txnid".to_string(), payment.order_id.to_string());
        fields.insert(
            "amount".to_string(),
            payment.amount.with_scale(2).to_string(),
        );
        fields.insert(
            "productinfo".to_string(),
            "Campus Art Hub order".to_string(),
        );
        fields.insert("customer_id".to_string(), payment.customer_id.clone());
        fields.insert("email".to_string(), payment.email.clone());
        fields.insert("phone".to_string(), payment.phone.clone());
        fields.insert("surl".to_string(), payment.callback_url.clone());
        fields.insert("furl".to_string(), payment.callback_url.clone());

        let checksum = self.signer.sign(&fields);
        fields.insert("checksum".to_string(), checksum);

        Ok(GatewayRequest {
            redirect_url: self.checkout_url.clone(),
            fields,
        })
    }

    /// Verify the checksum on a redirect callback. The browser carries these
    /// parameters, so nothing in them is trusted until this returns `true`.
    pub fn verify_callback(&self, callback: &CallbackParams) -> bool {
        self.signer
            .verify(&callback_fields(callback), &callback.checksum)
    }

    /// Sign callback parameters the way the gateway does on redirect. Used by
    /// the gateway side of the protocol (and by tests acting as the gateway).
    pub fn sign_callback(&self, callback: &CallbackParams) -> String {
        self.signer.sign(&callback_fields(callback))
    }
}

fn callback_fields(callback: &CallbackParams) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    fields.insert("orderId".to_string(), callback.order_id.to_string());
    fields.insert("status".to_string(), callback.status.clone());
    if let Some(txn_id) = &callback.txn_id {
        fields.insert("txnId".to_string(), txn_id.clone());
    }
    fields
}
