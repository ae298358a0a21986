use std::collections::HashMap;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::{Detail, Video};
use crate::normalize::normalize_video;
use crate::transport::CallParams;
use crate::utils::{
    first_data_count, int_field, lbry_url, rpc_body, str_field, ItemsPage, ReactionCounts, RpcResponse,
};
use crate::{OdyseeClient, OdyseeError, OdyseeRequestFields};

pub const CLAIM_SEARCH_PAGE_SIZE: u32 = 30;

/// Lists every claim of a channel.
///
/// `claim_search` returns at most 1000 records for one `release_time` bound, so
/// once a bound stops producing new claims the bound is lowered to the oldest
/// claim seen so far and paging restarts. Enumeration ends only when a freshly
/// lowered bound also yields nothing new.
pub struct ListChannelVideosRequest<'a> {
    pub client: &'a OdyseeClient,
    pub channel_id: String,
    pub page_size: u32,
    /// Initial upper bound. Defaults to one day from now.
    pub release_time: Option<i64>,
}

/// Raw claims keyed by claim id, in first-seen order.
#[derive(Debug, Default)]
pub struct VideoAccumulator {
    order: Vec<String>,
    by_claim_id: HashMap<String, Value>,
}

impl VideoAccumulator {
    pub fn contains(&self, claim_id: &str) -> bool {
        self.by_claim_id.contains_key(claim_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn insert(&mut self, claim_id: String, raw: Value) {
        if !self.by_claim_id.contains_key(&claim_id) {
            self.order.push(claim_id.clone());
            self.by_claim_id.insert(claim_id, raw);
        }
    }

    /// Oldest `meta.creation_timestamp`, 0 when nothing was collected.
    fn oldest_creation_timestamp(&self) -> i64 {
        self.by_claim_id
            .values()
            .filter_map(|raw| raw.get("meta").and_then(|meta| int_field(meta, "creation_timestamp").ok()))
            .min()
            .unwrap_or(0)
    }

    pub fn into_records(self) -> Vec<Value> {
        let VideoAccumulator {
            order,
            mut by_claim_id,
        } = self;
        order
            .into_iter()
            .filter_map(|claim_id| by_claim_id.remove(&claim_id))
            .collect()
    }
}

impl<'a> ListChannelVideosRequest<'a> {
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_release_time(mut self, release_time: i64) -> Self {
        self.release_time = Some(release_time);
        self
    }

    pub async fn send(self) -> Result<Vec<Value>, OdyseeError> {
        let mut accumulator = VideoAccumulator::default();
        let mut page: u32 = 1;
        let mut release_time = self
            .release_time
            .unwrap_or_else(|| Utc::now().timestamp() + 86400);
        let mut hit_cap = false;

        loop {
            let items = self.fetch_page(page, release_time).await?;

            let mut new_claims = 0usize;
            for item in items {
                let claim_id = str_field(&item, "claim_id")?;
                if !accumulator.contains(&claim_id) {
                    accumulator.insert(claim_id, item);
                    new_claims += 1;
                }
            }

            tracing::debug!(
                channel_id = %self.channel_id,
                page,
                release_time,
                new_claims,
                total = accumulator.len(),
                "Fetched claim_search page"
            );

            if new_claims > 0 {
                page += 1;
                hit_cap = false;
                continue;
            }

            if hit_cap {
                break;
            }

            hit_cap = true;
            release_time = accumulator.oldest_creation_timestamp();
            page = 1;
            tracing::info!(
                channel_id = %self.channel_id,
                release_time,
                total = accumulator.len(),
                "No new claims, rewinding release_time cursor"
            );
        }

        Ok(accumulator.into_records())
    }

    async fn fetch_page(&self, page: u32, release_time: i64) -> Result<Vec<Value>, OdyseeError> {
        let call = CallParams::post(&self.client.endpoints().backend).json(rpc_body(
            "claim_search",
            json!({
                "page_size": self.page_size,
                "page": page,
                "order_by": ["release_time"],
                "channel_ids": [self.channel_id],
                "release_time": format!("<{}", release_time),
            }),
        ));

        let body = self.client.call(call).await?;
        let response: RpcResponse<ItemsPage> = serde_json::from_value(body)?;
        response
            .into_result()?
            .items
            .ok_or_else(|| OdyseeError::MissingField("items".to_string()))
    }
}

pub struct GetViewsRequest<'a> {
    pub client: &'a OdyseeClient,
    pub fields: OdyseeRequestFields<'a>,
    pub claim_id: String,
}

impl<'a> AsMut<OdyseeRequestFields<'a>> for GetViewsRequest<'a> {
    fn as_mut(&mut self) -> &mut OdyseeRequestFields<'a> {
        &mut self.fields
    }
}

impl<'a> GetViewsRequest<'a> {
    pub async fn send(self) -> Result<i64, OdyseeError> {
        let auth_token = self.client.resolve_auth_token(self.fields.auth_token).await?;

        let call = CallParams::get(&self.client.endpoints().views).query([
            ("auth_token", auth_token),
            ("claim_id", self.claim_id.as_str()),
        ]);

        let body = self.client.call(call).await?;
        first_data_count(body)
    }
}

#[derive(Debug, Deserialize)]
struct VideoReactionsResponse {
    success: Option<bool>,
    data: Option<VideoReactionsData>,
}

#[derive(Debug, Deserialize)]
struct VideoReactionsData {
    others_reactions: HashMap<String, ReactionCounts>,
}

pub struct GetVideoReactionsRequest<'a> {
    pub client: &'a OdyseeClient,
    pub fields: OdyseeRequestFields<'a>,
    pub claim_id: String,
}

impl<'a> AsMut<OdyseeRequestFields<'a>> for GetVideoReactionsRequest<'a> {
    fn as_mut(&mut self) -> &mut OdyseeRequestFields<'a> {
        &mut self.fields
    }
}

impl<'a> GetVideoReactionsRequest<'a> {
    /// `(likes, dislikes)`, both `None` when the endpoint reports no success.
    pub async fn send(self) -> Result<(Option<i64>, Option<i64>), OdyseeError> {
        let auth_token = self.client.resolve_auth_token(self.fields.auth_token).await?;

        let call = CallParams::post(&self.client.endpoints().reactions).form([
            ("auth_token", auth_token),
            ("claim_ids", self.claim_id.as_str()),
        ]);

        let body = self.client.call(call).await?;
        let response: VideoReactionsResponse = serde_json::from_value(body)?;

        if !response.success.unwrap_or(false) {
            return Ok((None, None));
        }

        let path = format!("data.others_reactions.{}", self.claim_id);
        let (likes, dislikes) = response
            .data
            .and_then(|mut data| data.others_reactions.remove(&self.claim_id))
            .and_then(|counts| counts.like.zip(counts.dislike))
            .ok_or(OdyseeError::MissingField(path))?;
        Ok((Some(likes), Some(dislikes)))
    }
}

#[derive(Debug, Deserialize)]
struct StreamingUrlResult {
    streaming_url: Option<String>,
}

pub struct GetStreamingUrlRequest<'a> {
    pub client: &'a OdyseeClient,
    pub canonical_url: String,
}

impl<'a> GetStreamingUrlRequest<'a> {
    pub async fn send(self) -> Result<Option<String>, OdyseeError> {
        let call = CallParams::post(&self.client.endpoints().backend)
            .json(rpc_body("get", json!({ "uri": self.canonical_url })));

        let body = self.client.call(call).await?;
        let response: RpcResponse<StreamingUrlResult> = serde_json::from_value(body)?;
        Ok(response.result.and_then(|result| result.streaming_url))
    }
}

/// Turns normalized claim names such as `want-me-eat-all-chips-meme` into raw claims.
pub struct ResolveNamesRequest<'a> {
    pub client: &'a OdyseeClient,
    pub normalized_names: Vec<String>,
}

impl<'a> ResolveNamesRequest<'a> {
    pub async fn send(self) -> Result<Vec<Value>, OdyseeError> {
        if self.normalized_names.is_empty() {
            return Ok(Vec::new());
        }

        let urls: Vec<String> = self.normalized_names.iter().map(|name| lbry_url(name)).collect();
        let call = CallParams::post(&self.client.endpoints().backend)
            .json(rpc_body("resolve", json!({ "urls": urls })));

        let body = self.client.call(call).await?;
        let response: RpcResponse<HashMap<String, Value>> = serde_json::from_value(body)?;
        let resolved = response.into_result()?;

        // A name may be listed twice; each occurrence gets the record.
        Ok(urls
            .iter()
            .filter_map(|url| resolved.get(url).cloned())
            .collect())
    }
}

impl OdyseeClient {
    /// Normalizes a raw claim and, for `Detail::Full`, fetches its streaming URL,
    /// views and reactions.
    pub async fn process_video(&self, raw: &Value, detail: Detail) -> Result<Video, OdyseeError> {
        let mut video = normalize_video(raw)?;

        if detail == Detail::Full {
            let is_live = raw.get("name").and_then(Value::as_str) == Some("live");
            video.streaming_url = if is_live {
                None
            } else {
                self.get_streaming_url(video.canonical_url.clone()).send().await?
            };
            video.views = Some(self.get_views(video.claim_id.clone()).send().await?);
            let (likes, dislikes) = self.get_video_reactions(video.claim_id.clone()).send().await?;
            video.likes = likes;
            video.dislikes = dislikes;
        }

        Ok(video)
    }
}
