use std::collections::HashMap;

use serde_json::{json, Value};

use crate::models::ChannelProfile;
use crate::normalize::normalize_channel_profile;
use crate::transport::CallParams;
use crate::utils::{channel_url, first_data_count, rpc_body, RpcResponse};
use crate::{OdyseeClient, OdyseeError, OdyseeRequestFields};

pub struct ResolveChannelRequest<'a> {
    pub client: &'a OdyseeClient,
    pub channel_name: String,
}

impl<'a> ResolveChannelRequest<'a> {
    /// Resolves `lbry://@<name>`. A name that no longer resolves is `NotFound`.
    pub async fn send(self) -> Result<ChannelProfile, OdyseeError> {
        let url = channel_url(&self.channel_name);
        let call = CallParams::post(&self.client.endpoints().backend)
            .json(rpc_body("resolve", json!({ "urls": [url] })));

        let body = self.client.call(call).await?;
        let response: RpcResponse<HashMap<String, Value>> = serde_json::from_value(body)?;
        let entry = response
            .into_result()?
            .remove(&url)
            .filter(|entry| entry.get("claim_id").is_some())
            .ok_or_else(|| OdyseeError::NotFound(url.clone()))?;

        normalize_channel_profile(&entry)
    }
}

pub struct GetSubscribersRequest<'a> {
    pub client: &'a OdyseeClient,
    pub fields: OdyseeRequestFields<'a>,
    pub channel_id: String,
}

impl<'a> AsMut<OdyseeRequestFields<'a>> for GetSubscribersRequest<'a> {
    fn as_mut(&mut self) -> &mut OdyseeRequestFields<'a> {
        &mut self.fields
    }
}

impl<'a> GetSubscribersRequest<'a> {
    pub async fn send(self) -> Result<i64, OdyseeError> {
        let auth_token = self.client.resolve_auth_token(self.fields.auth_token).await?;

        let call = CallParams::post(&self.client.endpoints().subscribers).form([
            ("auth_token", auth_token),
            ("claim_id", self.channel_id.as_str()),
        ]);

        let body = self.client.call(call).await?;
        first_data_count(body)
    }
}
