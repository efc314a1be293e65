//! Account endpoints that are not CRUD collections.

use serde_json::Value;
use tracing::info;

use crate::client::{encode, ApiClient};
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::types::PasswordReset;

pub const RESET_PASSWORD_PATH: &str = "/reset-password/";

#[derive(Debug, Clone)]
pub struct AccountGateway {
    client: ApiClient,
}

impl AccountGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Complete a password reset started by e-mail link. Returns the server's
    /// acknowledgement as JSON.
    pub async fn reset_password(&self, reset: &PasswordReset) -> Result<Value, ApiError> {
        let body = encode(reset)?;
        let ack = self
            .client
            .send(HttpMethod::Post, RESET_PASSWORD_PATH, &[], Some(body))
            .await?;
        info!(uid = %reset.uid, "password reset accepted");
        Ok(ack)
    }
}
