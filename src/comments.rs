use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::Comment;
use crate::normalize::normalize_comment;
use crate::transport::CallParams;
use crate::utils::{rpc_body_with_id, ItemsPage, ReactionCounts, RpcResponse};
use crate::{OdyseeClient, OdyseeError};

pub const COMMENT_PAGE_SIZE: u32 = 10;

/// Newest first.
const COMMENT_SORT_BY: u32 = 3;

/// Every comment of a video, replies included, with reactions joined in.
pub struct ListCommentsRequest<'a> {
    pub client: &'a OdyseeClient,
    pub claim_id: String,
    pub page_size: u32,
}

impl<'a> ListCommentsRequest<'a> {
    pub async fn send(self) -> Result<Vec<Comment>, OdyseeError> {
        self.send_raw()
            .await?
            .iter()
            .map(normalize_comment)
            .collect()
    }

    /// Same as `send` but keeps the raw records (with `likes`/`dislikes` spliced in).
    pub async fn send_raw(self) -> Result<Vec<Value>, OdyseeError> {
        let mut all_comments = Vec::new();
        let mut page: u32 = 1;

        loop {
            let call = CallParams::post(&self.client.endpoints().comments).json(rpc_body_with_id(
                "comment.List",
                json!({
                    "page": page,
                    "claim_id": self.claim_id,
                    "page_size": self.page_size,
                    "top_level": false,
                    "sort_by": COMMENT_SORT_BY,
                }),
            ));

            let body = self.client.call(call).await?;
            let response: RpcResponse<ItemsPage> = serde_json::from_value(body)?;

            // A missing `items` marks the end; an empty list does not.
            let Some(items) = response.into_result()?.items else {
                break;
            };

            tracing::debug!(claim_id = %self.claim_id, page, count = items.len(), "Fetched comment page");

            if !items.is_empty() {
                let enriched = self.client.comment_reactions(items).send().await?;
                all_comments.extend(enriched);
            }
            page += 1;
        }

        Ok(all_comments)
    }
}

#[derive(Debug, Deserialize)]
struct CommentReactionsResult {
    others_reactions: HashMap<String, ReactionCounts>,
}

/// Adds `likes` and `dislikes` to each raw comment with a single `reaction.List` call.
pub struct CommentReactionsRequest<'a> {
    pub client: &'a OdyseeClient,
    pub comments: Vec<Value>,
}

impl<'a> CommentReactionsRequest<'a> {
    pub async fn send(self) -> Result<Vec<Value>, OdyseeError> {
        let mut comments = self.comments;
        if comments.is_empty() {
            return Ok(comments);
        }

        let comment_ids = comments
            .iter()
            .filter_map(|comment| comment.get("comment_id").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(",");

        let call = CallParams::post(&self.client.endpoints().comments).json(rpc_body_with_id(
            "reaction.List",
            json!({ "comment_ids": comment_ids }),
        ));

        let body = self.client.call(call).await?;
        let response: RpcResponse<CommentReactionsResult> = serde_json::from_value(body)?;
        let reactions = response.into_result()?.others_reactions;

        for comment in comments.iter_mut() {
            let counts = comment
                .get("comment_id")
                .and_then(Value::as_str)
                .and_then(|id| reactions.get(id));
            let likes = counts.and_then(|c| c.like).unwrap_or(0);
            let dislikes = counts.and_then(|c| c.dislike).unwrap_or(0);

            if let Some(object) = comment.as_object_mut() {
                object.insert("likes".to_string(), json!(likes));
                object.insert("dislikes".to_string(), json!(dislikes));
            }
        }

        Ok(comments)
    }
}
