use std::error::Error;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Method;
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use native_tls::TlsConnector;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::OnceCell;


pub mod config;
pub mod executor;
pub mod models;
pub mod normalize;
pub mod transport;
pub mod utils;
pub mod auth;
pub use auth::NewUserRequest;
pub mod channels;
pub use channels::{GetSubscribersRequest, ResolveChannelRequest};
pub mod videos;
pub use videos::{
    GetStreamingUrlRequest, GetVideoReactionsRequest, GetViewsRequest, ListChannelVideosRequest,
    ResolveNamesRequest,
};
pub mod comments;
pub use comments::{CommentReactionsRequest, ListCommentsRequest};
pub mod recommendations;
pub use recommendations::{GetRecommendedRequest, RecommendationEngine, RecommendationGraph};
pub mod scraper;
pub use scraper::ChannelScraper;

use config::{ClientConfig, Endpoints};
use executor::{FailureReason, RequestExecutor, Sleeper, TokioSleeper};
use transport::{CallParams, HyperTransport, Transport};

pub fn initialize_client() -> Result<Client<HttpsConnector<HttpConnector>, Full<Bytes>>, OdyseeError> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);

    let tls = TlsConnector::builder().build()?;

    // Create an HTTPS connector using the HTTP connector and the custom TLS connector
    let https = HttpsConnector::from((http, tls.into()));

    let client = Client::builder(TokioExecutor::new()).build::<_, Full<Bytes>>(https);

    Ok(client)
}

pub struct OdyseeRequestFields<'a> {
    pub auth_token: Option<&'a str>,
}

pub trait OdyseeRequest<'a> {
    fn auth_token(&mut self) -> &mut Option<&'a str>;

    fn with_auth_token(mut self, auth_token: &'a str) -> Self
    where
        Self: Sized,
    {
        *self.auth_token() = Some(auth_token);
        self
    }
}

impl<'a, T> OdyseeRequest<'a> for T
where
    T: AsMut<OdyseeRequestFields<'a>>,
{
    fn auth_token(&mut self) -> &mut Option<&'a str> {
        &mut self.as_mut().auth_token
    }
}

fn display_reasons(reasons: &[FailureReason]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum OdyseeError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error(
        "Maximum number of retries reached for {method} {url} ({params}). Retry reasons: [{}]",
        display_reasons(.reasons)
    )]
    RetriesExhausted {
        method: Method,
        url: String,
        params: String,
        reasons: Vec<FailureReason>,
    },
    #[error("Missing field: {0}")]
    MissingField(String),
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("TLS error: {0}")]
    TlsError(#[from] native_tls::Error),
    #[error("Other error: {0}")]
    Other(Box<dyn Error + Send + Sync>),
}

pub struct OdyseeClient {
    executor: RequestExecutor,
    endpoints: Endpoints,
    auth_token: OnceCell<String>,
}

impl OdyseeClient {
    pub fn new(config: ClientConfig) -> Result<Self, OdyseeError> {
        let transport = Arc::new(HyperTransport::new()?);
        Ok(Self::with_transport(config, transport, Arc::new(TokioSleeper)))
    }

    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        OdyseeClient {
            executor: RequestExecutor::new(transport, sleeper, config.retry),
            endpoints: config.endpoints,
            auth_token: OnceCell::new(),
        }
    }

    /// Uses `auth_token` instead of requesting one from the new-user endpoint.
    pub fn with_auth_token(mut self, auth_token: impl Into<String>) -> Self {
        self.auth_token = OnceCell::new_with(Some(auth_token.into()));
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    pub(crate) async fn call(&self, params: CallParams) -> Result<Value, OdyseeError> {
        self.executor.execute(&params).await
    }

    /// The cached auth token, fetching one on first use.
    pub async fn auth_token(&self) -> Result<&str, OdyseeError> {
        self.auth_token
            .get_or_try_init(|| async { self.new_user().send().await })
            .await
            .map(String::as_str)
    }

    pub(crate) async fn resolve_auth_token<'a>(
        &'a self,
        explicit: Option<&'a str>,
    ) -> Result<&'a str, OdyseeError> {
        match explicit {
            Some(token) => Ok(token),
            None => self.auth_token().await,
        }
    }

    pub fn new_user(&self) -> NewUserRequest<'_> {
        NewUserRequest { client: self }
    }

    pub fn resolve_channel(&self, channel_name: impl Into<String>) -> ResolveChannelRequest<'_> {
        ResolveChannelRequest {
            client: self,
            channel_name: channel_name.into(),
        }
    }

    pub fn get_subscribers(&self, channel_id: impl Into<String>) -> GetSubscribersRequest<'_> {
        GetSubscribersRequest {
            client: self,
            fields: OdyseeRequestFields { auth_token: None },
            channel_id: channel_id.into(),
        }
    }

    pub fn list_channel_videos(&self, channel_id: impl Into<String>) -> ListChannelVideosRequest<'_> {
        ListChannelVideosRequest {
            client: self,
            channel_id: channel_id.into(),
            page_size: videos::CLAIM_SEARCH_PAGE_SIZE,
            release_time: None,
        }
    }

    pub fn get_views(&self, claim_id: impl Into<String>) -> GetViewsRequest<'_> {
        GetViewsRequest {
            client: self,
            fields: OdyseeRequestFields { auth_token: None },
            claim_id: claim_id.into(),
        }
    }

    pub fn get_video_reactions(&self, claim_id: impl Into<String>) -> GetVideoReactionsRequest<'_> {
        GetVideoReactionsRequest {
            client: self,
            fields: OdyseeRequestFields { auth_token: None },
            claim_id: claim_id.into(),
        }
    }

    pub fn get_streaming_url(&self, canonical_url: impl Into<String>) -> GetStreamingUrlRequest<'_> {
        GetStreamingUrlRequest {
            client: self,
            canonical_url: canonical_url.into(),
        }
    }

    pub fn resolve_names(&self, normalized_names: Vec<String>) -> ResolveNamesRequest<'_> {
        ResolveNamesRequest {
            client: self,
            normalized_names,
        }
    }

    pub fn list_comments(&self, claim_id: impl Into<String>) -> ListCommentsRequest<'_> {
        ListCommentsRequest {
            client: self,
            claim_id: claim_id.into(),
            page_size: comments::COMMENT_PAGE_SIZE,
        }
    }

    pub fn comment_reactions(&self, comments: Vec<Value>) -> CommentReactionsRequest<'_> {
        CommentReactionsRequest {
            client: self,
            comments,
        }
    }

    pub fn get_recommended(
        &self,
        video_title: impl Into<String>,
        claim_id: impl Into<String>,
    ) -> GetRecommendedRequest<'_> {
        GetRecommendedRequest {
            client: self,
            video_title: video_title.into(),
            claim_id: claim_id.into(),
        }
    }
}
