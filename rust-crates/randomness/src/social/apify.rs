use crate::{
    Error,
    Result,
    participant::{
        Participant,
        dedup_by_id,
    },
    social::InteractionSource,
    tweet::{
        TweetInfo,
        TweetRef,
        TweetStats,
    },
};
use reqwest::StatusCode;
use serde_json::{
    Map,
    Value,
    json,
};

pub const DEFAULT_APIFY_BASE_URL: &str = "https://api.apify.com/v2";
const TWEET_ACTOR: &str = "apidojo~twitter-scraper-lite";
const FOLLOWERS_ACTOR: &str = "quacker~twitter-followers-scraper";
const MAX_INTERACTION_ITEMS: u32 = 100;
const MAX_FOLLOWERS: u32 = 200;

const ID_FIELDS: [&str; 3] = ["id_str", "id", "userId"];
const HANDLE_FIELDS: [&str; 3] = ["userName", "screen_name", "username"];

/// Scraper backed by Apify's synchronous actor runs.
#[derive(Clone)]
pub struct ApifyScraper {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl ApifyScraper {
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::Configuration(
                "Apify API token not configured. Set APIFY_API_TOKEN.".to_string(),
            ));
        }
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder().build().map_err(|e| {
            Error::Configuration(format!("failed to build HTTP client for scraper: {e}"))
        })?;
        Ok(Self {
            base_url,
            token,
            http,
        })
    }

    async fn run_actor(&self, actor: &str, input: Value) -> Result<Vec<Value>> {
        let url = format!("{}/acts/{}/run-sync-get-dataset-items", self.base_url, actor);
        tracing::debug!("running scraper actor {actor}");
        let res = self
            .http
            .post(url)
            .query(&[("token", self.token.as_str())])
            .json(&input)
            .send()
            .await?;
        let status = res.status();
        let bytes = res.bytes().await?;
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited(format!(
                "scraper actor {actor} responded with {status}"
            )));
        }
        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            return Err(Error::upstream(format!(
                "scraper actor {actor} responded with {status}: {body}"
            )));
        }
        let payload: Value = serde_json::from_slice(&bytes).map_err(|e| {
            Error::Upstream(format!("invalid payload from scraper actor {actor}: {e}"))
        })?;
        match payload {
            Value::Array(items) => Ok(items),
            other => Err(Error::Upstream(format!(
                "scraper actor {actor} returned a non-list payload: {other}"
            ))),
        }
    }

    async fn try_fetch_tweet(&self, input: Value) -> Result<Option<TweetInfo>> {
        let items = self.run_actor(TWEET_ACTOR, input).await?;
        Ok(items.iter().find_map(tweet_from_item))
    }
}

impl InteractionSource for ApifyScraper {
    async fn tweet(&self, tweet: &TweetRef) -> Result<TweetInfo> {
        let url = tweet.canonical_url();
        let first = self
            .try_fetch_tweet(json!({ "tweetUrl": url, "includeUserInfo": true }))
            .await;
        match first {
            Ok(Some(info)) => return Ok(info),
            Err(err) if err.is_rate_limited() => return Err(err),
            Ok(None) => {
                tracing::warn!("no tweet returned for {url} via tweetUrl; retrying");
            }
            Err(err) => {
                tracing::warn!("tweet lookup for {url} failed ({err}); retrying");
            }
        }
        self.try_fetch_tweet(json!({ "maxItems": 1, "startUrls": [url] }))
            .await?
            .ok_or_else(|| {
                Error::Upstream(format!("Failed to fetch tweet data for {url}"))
            })
    }

    async fn followers(&self, handle: &str) -> Result<Vec<Participant>> {
        let handle = handle.trim_start_matches('@');
        let items = self
            .run_actor(
                FOLLOWERS_ACTOR,
                json!({
                    "username": handle,
                    "maxFollowers": MAX_FOLLOWERS,
                    "labels": ["followers"],
                }),
            )
            .await
            .map_err(|err| match err {
                Error::RateLimited(message) => Error::RateLimited(message),
                other => Error::upstream(format!("Failed to fetch followers: {other}")),
            })?;
        Ok(normalize_users(&items))
    }

    async fn retweeters(&self, tweet: &TweetRef) -> Result<Vec<Participant>> {
        let items = self
            .run_actor(
                TWEET_ACTOR,
                json!({
                    "maxItems": MAX_INTERACTION_ITEMS,
                    "startUrls": [tweet.retweets_url()],
                }),
            )
            .await?;
        Ok(normalize_users(&items))
    }

    async fn likers(&self, tweet: &TweetRef) -> Result<Vec<Participant>> {
        let items = self
            .run_actor(
                TWEET_ACTOR,
                json!({
                    "maxItems": MAX_INTERACTION_ITEMS,
                    "startUrls": [tweet.likes_url()],
                }),
            )
            .await?;
        Ok(normalize_users(&items))
    }
}

/// Folds the scraper's item shapes into participants. Tweet items carry the
/// user under `author`; follower items are the user themselves. Entries
/// without an id or a handle are dropped.
pub fn normalize_users(items: &[Value]) -> Vec<Participant> {
    let participants = items.iter().filter_map(|item| {
        let user = item.get("author").unwrap_or(item);
        let parsed = participant_from_user(user);
        if parsed.is_none() {
            tracing::debug!("dropping malformed scraper entry: {item}");
        }
        parsed
    });
    dedup_by_id(participants)
}

fn participant_from_user(value: &Value) -> Option<Participant> {
    let object = value.as_object()?;
    let id = first_field(object, &ID_FIELDS)?;
    let handle = first_field(object, &HANDLE_FIELDS)?;
    let name = first_field(object, &["name"]).unwrap_or_else(|| handle.clone());
    Some(Participant::new(id, handle, name))
}

fn tweet_from_item(item: &Value) -> Option<TweetInfo> {
    let object = item.as_object()?;
    let author = participant_from_user(object.get("author")?)?;
    let id = first_field(object, &["id", "id_str"])?;
    let text = first_field(object, &["text", "fullText"]).unwrap_or_default();
    let stats = TweetStats {
        retweets: first_count(object, &["retweetCount", "retweet_count"]),
        likes: first_count(object, &["likeCount", "favorite_count"]),
    };
    Some(TweetInfo {
        id,
        text,
        author,
        stats,
    })
}

fn first_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match object.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn first_count(object: &Map<String, Value>, keys: &[&str]) -> u64 {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(Value::as_u64))
        .unwrap_or(0)
}
