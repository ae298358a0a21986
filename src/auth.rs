use serde::Deserialize;

use crate::transport::CallParams;
use crate::{OdyseeClient, OdyseeError};

#[derive(Debug, Deserialize)]
struct NewUserResponse {
    data: Option<NewUserData>,
}

#[derive(Debug, Deserialize)]
struct NewUserData {
    auth_token: Option<String>,
}

/// Registers an anonymous user and returns its auth token.
///
/// Calling this many times in quick succession tends to earn a 503.
pub struct NewUserRequest<'a> {
    pub client: &'a OdyseeClient,
}

impl<'a> NewUserRequest<'a> {
    pub async fn send(self) -> Result<String, OdyseeError> {
        let call = CallParams::post(&self.client.endpoints().new_user);
        let body = self.client.call(call).await?;
        let response: NewUserResponse = serde_json::from_value(body)?;
        let auth_token = response
            .data
            .and_then(|data| data.auth_token)
            .ok_or_else(|| OdyseeError::MissingField("data.auth_token".to_string()))?;
        tracing::debug!("Acquired new auth token");
        Ok(auth_token)
    }
}
