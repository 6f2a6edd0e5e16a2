//! reqwest-backed client for the spreadsheet signup store.

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    error::StoreError,
    protocol::{SignupRecord, StoreAck},
};
use tracing::debug;
use url::Url;

use crate::SignupStore;

/// HTTP client for the signup store endpoint: a single URL accepting a
/// form-encoded POST and answering with a JSON acknowledgement.
pub struct HttpSignupStore {
    http: Client,
    endpoint: Url,
}

impl HttpSignupStore {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: Client::new(),
            endpoint,
        }
    }

    pub fn from_url(endpoint: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(endpoint)?))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SignupStore for HttpSignupStore {
    async fn save(&self, record: &SignupRecord) -> Result<StoreAck, StoreError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .form(&record.form_fields())
            .send()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        let ack: StoreAck =
            serde_json::from_str(&body).map_err(|err| StoreError::InvalidAck(err.to_string()))?;
        debug!(
            success = ack.success,
            row = ack.row,
            "signup store answered"
        );
        Ok(ack)
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
