use std::collections::{BTreeMap, HashMap, HashSet};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::models::{Channel, Detail, Edge, Video, WeightedEdge};
use crate::normalize::normalize_video;
use crate::scraper::ChannelScraper;
use crate::transport::CallParams;
use crate::utils::str_field;
use crate::{OdyseeClient, OdyseeError};

const RECOMMENDATION_COUNT: &str = "20";

#[derive(Debug, Deserialize)]
struct RecommendationHit {
    name: Option<String>,
}

/// Videos related to one video, as raw claims. Only streams holding video or
/// audio are kept.
pub struct GetRecommendedRequest<'a> {
    pub client: &'a OdyseeClient,
    pub video_title: String,
    pub claim_id: String,
}

impl<'a> GetRecommendedRequest<'a> {
    pub async fn send(self) -> Result<Vec<Value>, OdyseeError> {
        let call = CallParams::get(&self.client.endpoints().recommendations).query([
            ("s", self.video_title.as_str()),
            ("size", RECOMMENDATION_COUNT),
            ("from", "0"),
            ("related_to", self.claim_id.as_str()),
        ]);

        let body = self.client.call(call).await?;
        let hits: Vec<RecommendationHit> = serde_json::from_value(body)?;
        let names = hits.into_iter().filter_map(|hit| hit.name).collect();

        let resolved = self.client.resolve_names(names).send().await?;
        Ok(resolved.into_iter().filter(is_playable_stream).collect())
    }
}

fn is_playable_stream(claim: &Value) -> bool {
    let is_stream = claim.get("value_type").and_then(Value::as_str) == Some("stream");
    let has_media = claim
        .get("value")
        .map(|value| value.get("video").is_some() || value.get("audio").is_some())
        .unwrap_or(false);
    is_stream && has_media
}

/// Claim id to video, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct VideoIndex {
    order: Vec<String>,
    videos: HashMap<String, Video>,
}

impl VideoIndex {
    pub fn get(&self, claim_id: &str) -> Option<&Video> {
        self.videos.get(claim_id)
    }

    pub fn contains(&self, claim_id: &str) -> bool {
        self.videos.contains_key(claim_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns false if the claim id was already present.
    pub fn insert(&mut self, video: Video) -> bool {
        if self.videos.contains_key(&video.claim_id) {
            return false;
        }
        self.order.push(video.claim_id.clone());
        self.videos.insert(video.claim_id.clone(), video);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Video> + '_ {
        self.order.iter().filter_map(|claim_id| self.videos.get(claim_id))
    }

    pub fn claim_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }
}

impl Serialize for VideoIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.order.len()))?;
        for video in self.iter() {
            map.serialize_entry(&video.claim_id, video)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationGraph {
    /// Every recommendation observed, by claim id, in discovery order.
    pub claim_edges: Vec<Edge>,
    /// Channel-level edges, heaviest first.
    pub weighted_edges: Vec<WeightedEdge>,
    /// Keyed by `@name`. Channels that no longer resolve are absent.
    pub channels: BTreeMap<String, Channel>,
    pub videos: VideoIndex,
}

/// Crawl state. Owned by `RecommendationEngine::generate` for the whole run.
#[derive(Debug, Default)]
struct CrawlState {
    videos: VideoIndex,
    expanded: HashSet<String>,
    frontier: Vec<String>,
    edges: Vec<Edge>,
}

impl CrawlState {
    fn seed(&mut self, video: Video) {
        let claim_id = video.claim_id.clone();
        if self.videos.insert(video) {
            self.frontier.push(claim_id);
        }
    }

    fn refresh_frontier(&mut self) {
        self.frontier = self
            .videos
            .claim_ids()
            .filter(|claim_id| !self.expanded.contains(*claim_id))
            .map(str::to_string)
            .collect();
    }
}

/// Builds a channel recommendation graph by repeatedly following the related-videos
/// endpoint, starting from every video of the seed channels.
pub struct RecommendationEngine<'a> {
    client: &'a OdyseeClient,
    channel_names: Vec<String>,
}

impl<'a> RecommendationEngine<'a> {
    pub fn new(client: &'a OdyseeClient, channel_names: Vec<String>) -> Self {
        RecommendationEngine {
            client,
            channel_names,
        }
    }

    pub async fn generate(&self, iterations: usize) -> Result<RecommendationGraph, OdyseeError> {
        let mut state = CrawlState::default();

        for channel_name in &self.channel_names {
            tracing::info!(channel = %channel_name, "Seeding from channel");
            let scraper = ChannelScraper::new(self.client, channel_name).await?;
            for video in scraper.get_all_videos(Detail::Minimal).await? {
                state.seed(video);
            }
        }

        for iteration in 0..iterations {
            let frontier = std::mem::take(&mut state.frontier);
            let total = frontier.len();

            for (i, claim_id) in frontier.into_iter().enumerate() {
                let title = state
                    .videos
                    .get(&claim_id)
                    .and_then(|video| video.title.clone())
                    .unwrap_or_default();

                tracing::info!(iteration, video = i, total, claim_id = %claim_id, "Expanding video");

                let recommended = self.client.get_recommended(title, claim_id.clone()).send().await?;

                for candidate in recommended {
                    let candidate_id = str_field(&candidate, "claim_id")?;
                    state.edges.push(Edge::new(claim_id.clone(), candidate_id.clone()));

                    if !state.videos.contains(&candidate_id) {
                        state.videos.insert(normalize_video(&candidate)?);
                    }
                }

                state.expanded.insert(claim_id);
            }

            state.refresh_frontier();
        }

        let weighted_edges = weigh_channel_edges(&state.edges, &state.videos);
        tracing::info!(
            videos = state.videos.len(),
            edges = state.edges.len(),
            channel_edges = weighted_edges.len(),
            "Recommendation crawl finished"
        );

        let channels = self.fetch_channels(&weighted_edges).await?;

        Ok(RecommendationGraph {
            claim_edges: state.edges,
            weighted_edges,
            channels,
            videos: state.videos,
        })
    }

    async fn fetch_channels(
        &self,
        weighted_edges: &[WeightedEdge],
    ) -> Result<BTreeMap<String, Channel>, OdyseeError> {
        let mut usernames = Vec::new();
        for edge in weighted_edges {
            for name in [&edge.source, &edge.target] {
                let username = name.trim_start_matches('@').to_string();
                if !usernames.contains(&username) {
                    usernames.push(username);
                }
            }
        }

        let mut channels = BTreeMap::new();
        for username in usernames {
            let entity = match ChannelScraper::new(self.client, &username).await {
                Ok(scraper) => scraper.get_entity().await,
                Err(e) => Err(e),
            };
            match entity {
                Ok(channel) => {
                    channels.insert(format!("@{}", username), channel);
                }
                Err(OdyseeError::NotFound(what)) => {
                    tracing::debug!(channel = %username, %what, "Channel no longer resolves, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(channels)
    }
}

/// Projects claim edges to channel names and counts them. Ties keep the order
/// in which the pair was first seen.
///
/// Edges touching a video without a channel are dropped. Channel self-loops
/// (a channel recommending its own videos) are removed as well, so the result
/// only holds edges between distinct channels. `RecommendationGraph::claim_edges`
/// still lists every intra-channel recommendation.
pub fn weigh_channel_edges(edges: &[Edge], videos: &VideoIndex) -> Vec<WeightedEdge> {
    let channel_of = |claim_id: &str| videos.get(claim_id).and_then(|v| v.channel_name.as_deref());

    let mut positions: HashMap<(&str, &str), usize> = HashMap::new();
    let mut weighted: Vec<WeightedEdge> = Vec::new();

    for edge in edges {
        let (Some(source), Some(target)) = (channel_of(&edge.source), channel_of(&edge.target)) else {
            continue;
        };
        if source == target {
            continue;
        }

        match positions.get(&(source, target)) {
            Some(&index) => weighted[index].weight += 1,
            None => {
                positions.insert((source, target), weighted.len());
                weighted.push(WeightedEdge {
                    source: source.to_string(),
                    target: target.to_string(),
                    weight: 1,
                });
            }
        }
    }

    // Stable, so equal weights stay in first-seen order.
    weighted.sort_by(|a, b| b.weight.cmp(&a.weight));
    weighted
}
