use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelProfile {
    pub channel_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub created: DateTime<Utc>,
    pub cover_image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub raw_payload: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    #[serde(flatten)]
    pub profile: ChannelProfile,
    pub subscriber_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    Video,
    Audio,
    Image,
    Repost,
    Other,
}

/// How much of a video to fetch. `Full` costs three extra calls per video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Detail {
    /// Identity and descriptive fields only.
    Minimal,
    /// Adds views, likes/dislikes and the streaming URL.
    #[default]
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Video {
    pub claim_id: String,
    pub canonical_url: String,
    #[serde(rename = "type")]
    pub video_type: VideoType,
    pub title: Option<String>,
    pub description: Option<String>,
    pub created: DateTime<Utc>,
    pub duration: Option<i64>,
    pub thumbnail: Option<String>,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub languages: Vec<String>,
    pub tags: Vec<String>,
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub dislikes: Option<i64>,
    pub streaming_url: Option<String>,
    pub raw_payload: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub comment_id: Option<String>,
    pub text: String,
    pub created: DateTime<Utc>,
    pub video_claim_id: String,
    pub channel_id: String,
    pub channel_name: String,
    pub reply_count: i64,
    pub likes: i64,
    pub dislikes: i64,
    pub raw_payload: Value,
}

/// "source recommended target", by claim id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Edge {
            source: source.into(),
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeightedEdge {
    pub source: String,
    pub target: String,
    pub weight: usize,
}
