use crate::{
    Result,
    app::query_api::{
        Query,
        QueryAPI,
        SocialInteractionsQuery,
        SocialInteractionsRequest,
    },
};
use futures::{
    FutureExt,
    StreamExt,
    future::LocalBoxFuture,
    stream::FuturesUnordered,
};
use randomness::{
    Error,
    aggregator::{
        EmptyPoolPolicy,
        InteractionReport,
        collect_interactions,
    },
    social::InteractionSource,
};
use tracing_subscriber::EnvFilter;

pub mod actix_query_api;
pub mod query_api;

#[cfg(test)]
mod tests;

pub const MISSING_TOKEN_MESSAGE: &str =
    "Apify API token not configured. Please add APIFY_API_TOKEN to your environment variables.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Continue,
    Exit,
}

type InFlight = LocalBoxFuture<'static, ()>;

/// Accepts queries and drives their work concurrently. `source` is absent when no scraper token
/// was configured; queries then fail with a configuration error.
pub struct App<API, Source> {
    api: API,
    source: Option<Source>,
    policy: EmptyPoolPolicy,
    in_flight: FuturesUnordered<InFlight>,
}

impl<API, Source> App<API, Source> {
    pub fn new(api: API, source: Option<Source>, policy: EmptyPoolPolicy) -> Self {
        Self {
            api,
            source,
            policy,
            in_flight: FuturesUnordered::new(),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

impl<API: QueryAPI, Source: InteractionSource + Clone + 'static> App<API, Source> {
    /// Returns after accepting a query, finishing one, or being interrupted.
    /// Queries still in flight on exit are dropped and their callers see a
    /// closed channel.
    pub async fn run(&mut self, interrupt: impl Future<Output = ()>) -> Result<RunState> {
        tokio::select! {
            query = self.api.query() => {
                let query = query?;
                self.handle_query(query);
                Ok(RunState::Continue)
            }
            Some(()) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                Ok(RunState::Continue)
            }
            _ = interrupt => {
                Ok(RunState::Exit)
            }
        }
    }

    fn handle_query(&mut self, query: Query) {
        match query {
            Query::SocialInteractions(SocialInteractionsQuery { request, sender }) => {
                let source = self.source.clone();
                let policy = self.policy;
                let work = async move {
                    let result = social_interactions(source.as_ref(), &request, policy).await;
                    if let Err(err) = &result {
                        tracing::warn!("social interactions query failed: {err}");
                    }
                    if sender.send(result).is_err() {
                        tracing::warn!("social interactions requester went away");
                    }
                };
                self.in_flight.push(work.boxed_local());
            }
        }
    }
}

async fn social_interactions<Source: InteractionSource>(
    source: Option<&Source>,
    request: &SocialInteractionsRequest,
    policy: EmptyPoolPolicy,
) -> randomness::Result<InteractionReport> {
    let source =
        source.ok_or_else(|| Error::Configuration(MISSING_TOKEN_MESSAGE.to_string()))?;
    let (tweet_url, criteria) = request.validate()?;
    tracing::info!("collecting interactions for {tweet_url} with {criteria:?}");
    collect_interactions(source, tweet_url, criteria, policy).await
}

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
