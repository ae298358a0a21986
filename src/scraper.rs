use crate::models::{Channel, ChannelProfile, Comment, Detail, Video};
use crate::{OdyseeClient, OdyseeError};

/// One resolved channel. The `resolve` call happens once, in `new`.
pub struct ChannelScraper<'a> {
    client: &'a OdyseeClient,
    channel_name: String,
    profile: ChannelProfile,
}

impl<'a> ChannelScraper<'a> {
    /// `channel_name` may be URL-encoded and may carry a leading `@`.
    pub async fn new(client: &'a OdyseeClient, channel_name: &str) -> Result<Self, OdyseeError> {
        let channel_name = urlencoding::decode(channel_name)
            .map(|name| name.into_owned())
            .unwrap_or_else(|_| channel_name.to_string());
        let channel_name = channel_name.trim_start_matches('@').to_string();

        let profile = client.resolve_channel(channel_name.clone()).send().await?;

        Ok(ChannelScraper {
            client,
            channel_name,
            profile,
        })
    }

    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    pub fn channel_id(&self) -> &str {
        &self.profile.channel_id
    }

    pub fn profile(&self) -> &ChannelProfile {
        &self.profile
    }

    /// The profile plus its subscriber count.
    pub async fn get_entity(&self) -> Result<Channel, OdyseeError> {
        let subscriber_count = self.client.get_subscribers(self.channel_id()).send().await?;
        Ok(Channel {
            profile: self.profile.clone(),
            subscriber_count,
        })
    }

    pub async fn get_all_videos(&self, detail: Detail) -> Result<Vec<Video>, OdyseeError> {
        let raw_videos = self.client.list_channel_videos(self.channel_id()).send().await?;
        tracing::info!(channel = %self.channel_name, count = raw_videos.len(), "Listed channel claims");

        let mut videos = Vec::with_capacity(raw_videos.len());
        for raw in &raw_videos {
            videos.push(self.client.process_video(raw, detail).await?);
        }
        Ok(videos)
    }

    /// All videos (full detail) and every comment posted under them.
    pub async fn get_all_videos_and_comments(&self) -> Result<(Vec<Video>, Vec<Comment>), OdyseeError> {
        let videos = self.get_all_videos(Detail::Full).await?;

        let mut comments = Vec::new();
        for video in &videos {
            comments.extend(self.client.list_comments(video.claim_id.clone()).send().await?);
        }

        Ok((videos, comments))
    }
}
