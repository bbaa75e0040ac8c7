use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use randomness::{
    aggregator::{
        Criteria,
        InteractionCounts,
    },
    participant::Participant,
    tweet::TweetInfo,
};
use reqwest::StatusCode;
use serde::{
    Deserialize,
    Serialize,
};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";
const SOCIAL_INTERACTIONS_PATH: &str = "/api/social-interactions";

/// Client for the randomness server's social interactions endpoint.
#[derive(Clone)]
pub struct SocialClient {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialSummary {
    pub tweet: TweetInfo,
    pub users: Vec<Participant>,
    pub counts: InteractionCounts,
    pub mock: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SocialInteractionsRequestDto<'a> {
    tweet_url: &'a str,
    criteria: Criteria,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SocialInteractionsDto {
    users: Vec<Participant>,
    tweet_info: TweetInfo,
    counts: InteractionCounts,
    #[serde(default)]
    mock: bool,
}

#[derive(Deserialize)]
struct ErrorDto {
    message: String,
}

impl From<SocialInteractionsDto> for SocialSummary {
    fn from(dto: SocialInteractionsDto) -> Self {
        Self {
            tweet: dto.tweet_info,
            users: dto.users,
            counts: dto.counts,
            mock: dto.mock,
        }
    }
}

impl SocialClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .build()
            .wrap_err("failed to build HTTP client for randomness server")?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_interactions(
        &self,
        tweet_url: &str,
        criteria: Criteria,
    ) -> Result<SocialSummary> {
        let url = format!("{}{}", self.base_url, SOCIAL_INTERACTIONS_PATH);
        let res = self
            .http
            .post(url)
            .json(&SocialInteractionsRequestDto {
                tweet_url,
                criteria,
            })
            .send()
            .await
            .wrap_err("randomness server request failed")?;
        let status = res.status();
        let bytes = res
            .bytes()
            .await
            .wrap_err("failed to read randomness server response body")?;
        parse_response(status, &bytes)
    }
}

fn parse_response(status: StatusCode, bytes: &[u8]) -> Result<SocialSummary> {
    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorDto>(bytes)
            .map(|dto| dto.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned());
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(eyre!("Rate limited: {message}"));
        }
        return Err(eyre!("{message} ({status})"));
    }
    let dto: SocialInteractionsDto = serde_json::from_slice(bytes)
        .wrap_err("invalid social interactions payload")?;
    Ok(dto.into())
}
