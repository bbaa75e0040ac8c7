use randomness::{
    Error,
    aggregator::{
        Criteria,
        InteractionReport,
    },
};
use serde::{
    Deserialize,
    Serialize,
};
use tokio::sync::oneshot;

pub trait QueryAPI {
    fn query(&mut self) -> impl Future<Output = crate::Result<Query>>;
}

/// Body of `POST /api/social-interactions`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialInteractionsRequest {
    #[serde(default)]
    pub tweet_url: Option<String>,
    #[serde(default)]
    pub criteria: Option<Criteria>,
}

impl SocialInteractionsRequest {
    pub fn new(tweet_url: impl Into<String>, criteria: Criteria) -> Self {
        Self {
            tweet_url: Some(tweet_url.into()),
            criteria: Some(criteria),
        }
    }

    pub fn validate(&self) -> randomness::Result<(&str, Criteria)> {
        let tweet_url = self
            .tweet_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::Validation("Tweet URL is required".to_string()))?;
        let criteria = self
            .criteria
            .ok_or_else(|| Error::Validation("Criteria object is required".to_string()))?;
        Ok((tweet_url, criteria))
    }
}

#[derive(Debug)]
pub struct SocialInteractionsQuery {
    pub request: SocialInteractionsRequest,
    pub sender: oneshot::Sender<randomness::Result<InteractionReport>>,
}

#[derive(Debug)]
pub enum Query {
    SocialInteractions(SocialInteractionsQuery),
}

impl Query {
    pub fn social_interactions(
        request: SocialInteractionsRequest,
        sender: oneshot::Sender<randomness::Result<InteractionReport>>,
    ) -> Self {
        Query::SocialInteractions(SocialInteractionsQuery { request, sender })
    }
}
