use serde_json::{Map, Value};

use crate::models::*;
use crate::utils::{as_integer, field, int_field, opt_str, str_field, str_list, timestamp_to_datetime};
use crate::OdyseeError;

/// Maps one raw claim to a `Video`. Views, reactions and the streaming URL are
/// left empty; see `OdyseeClient::process_video` for those.
pub fn normalize_video(raw: &Value) -> Result<Video, OdyseeError> {
    let empty = Value::Object(Map::new());
    let mut value = field(raw, "value")?;
    let mut claim_id = str_field(raw, "claim_id")?;
    let mut canonical_url = str_field(raw, "canonical_url")?;

    let (video_type, duration) = if let Some(video) = value.get("video") {
        (VideoType::Video, video.get("duration").and_then(as_integer))
    } else if let Some(audio) = value.get("audio") {
        (VideoType::Audio, audio.get("duration").and_then(as_integer))
    } else if value.get("claim_hash").is_some() {
        // Must happen before any other field of `value` is read.
        match raw.get("reposted_claim") {
            Some(original) => {
                value = field(original, "value")?;
                canonical_url = str_field(original, "canonical_url")?;
                claim_id = str_field(original, "claim_id")?;
            }
            None => value = &empty,
        }
        (VideoType::Repost, None)
    } else if value.get("image").is_some() {
        (VideoType::Image, None)
    } else {
        (VideoType::Other, None)
    };

    let (channel_id, channel_name) = match raw.get("signing_channel") {
        Some(channel) => (
            opt_str(channel, "claim_id").or_else(|| opt_str(channel, "channel_id")),
            opt_str(channel, "name"),
        ),
        None => (None, None),
    };

    let created = match value.get("release_time") {
        Some(release_time) => {
            as_integer(release_time).ok_or_else(|| OdyseeError::MissingField("release_time".to_string()))?
        }
        None => int_field(field(raw, "meta")?, "creation_timestamp")?,
    };

    let thumbnail = value.get("thumbnail").and_then(|t| opt_str(t, "url"));

    Ok(Video {
        claim_id,
        canonical_url,
        video_type,
        title: opt_str(value, "title"),
        description: opt_str(value, "description"),
        created: timestamp_to_datetime(created),
        duration,
        thumbnail,
        channel_id,
        channel_name,
        languages: str_list(value, "languages"),
        tags: str_list(value, "tags"),
        views: None,
        likes: None,
        dislikes: None,
        streaming_url: None,
        raw_payload: raw.clone(),
    })
}

pub fn normalize_comment(raw: &Value) -> Result<Comment, OdyseeError> {
    Ok(Comment {
        comment_id: opt_str(raw, "comment_id"),
        text: str_field(raw, "comment")?,
        created: timestamp_to_datetime(int_field(raw, "timestamp")?),
        video_claim_id: str_field(raw, "claim_id")?,
        channel_id: str_field(raw, "channel_id")?,
        channel_name: str_field(raw, "channel_name")?,
        reply_count: raw.get("replies").and_then(as_integer).unwrap_or(0),
        likes: int_field(raw, "likes")?,
        dislikes: int_field(raw, "dislikes")?,
        raw_payload: raw.clone(),
    })
}

/// Maps one `resolve` entry for a `lbry://@name` URL.
pub fn normalize_channel_profile(raw: &Value) -> Result<ChannelProfile, OdyseeError> {
    let value = raw.get("value");
    let nested_url = |key: &str| value.and_then(|v| v.get(key)).and_then(|v| opt_str(v, "url"));

    Ok(ChannelProfile {
        channel_id: str_field(raw, "claim_id")?,
        title: value.and_then(|v| opt_str(v, "title")),
        description: value.and_then(|v| opt_str(v, "description")),
        created: timestamp_to_datetime(int_field(raw, "timestamp")?),
        cover_image_url: nested_url("cover"),
        thumbnail_url: nested_url("thumbnail"),
        raw_payload: raw.clone(),
    })
}
