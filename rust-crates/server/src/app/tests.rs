#![allow(non_snake_case)]

use super::*;
use crate::app::query_api::SocialInteractionsRequest;
use randomness::{
    aggregator::Criteria,
    participant::Participant,
    tweet::{
        TweetInfo,
        TweetRef,
        TweetStats,
    },
};
use std::future::pending;
use tokio::sync::{
    mpsc,
    oneshot::{
        self,
        error::TryRecvError,
    },
};

pub struct FakeQueryApi {
    recv: mpsc::Receiver<Query>,
}

impl FakeQueryApi {
    pub fn new_with_sender() -> (Self, mpsc::Sender<Query>) {
        let (send, recv) = mpsc::channel(10);
        (FakeQueryApi { recv }, send)
    }
}

impl QueryAPI for FakeQueryApi {
    async fn query(&mut self) -> crate::Result<Query> {
        match self.recv.recv().await {
            Some(query) => Ok(query),
            None => Err(anyhow::anyhow!("No more queries")),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeSource {
    followers: Vec<Participant>,
    retweeters: Vec<Participant>,
    likers: Vec<Participant>,
    stats: TweetStats,
}

impl InteractionSource for FakeSource {
    async fn tweet(&self, tweet: &TweetRef) -> randomness::Result<TweetInfo> {
        Ok(TweetInfo {
            id: tweet.tweet_id.clone(),
            text: "giveaway".to_string(),
            author: Participant::new("author", &tweet.author_handle, "Host"),
            stats: self.stats,
        })
    }

    async fn followers(&self, _handle: &str) -> randomness::Result<Vec<Participant>> {
        Ok(self.followers.clone())
    }

    async fn retweeters(&self, _tweet: &TweetRef) -> randomness::Result<Vec<Participant>> {
        Ok(self.retweeters.clone())
    }

    async fn likers(&self, _tweet: &TweetRef) -> randomness::Result<Vec<Participant>> {
        Ok(self.likers.clone())
    }
}

fn people(ids: &[&str]) -> Vec<Participant> {
    ids.iter()
        .map(|id| Participant::new(*id, format!("user_{id}"), format!("User {id}")))
        .collect()
}

const TWEET_URL: &str = "https://x.com/host/status/1850000000000000001";

async fn ask(
    app: &mut App<FakeQueryApi, FakeSource>,
    queries: &mpsc::Sender<Query>,
    request: SocialInteractionsRequest,
) -> randomness::Result<InteractionReport> {
    let (sender, mut receiver) = oneshot::channel();
    queries
        .send(Query::social_interactions(request, sender))
        .await
        .unwrap();
    loop {
        let state = app.run(pending()).await.unwrap();
        assert_eq!(state, RunState::Continue);
        if let Ok(result) = receiver.try_recv() {
            return result;
        }
    }
}

#[tokio::test]
async fn run__social_interactions_query__responds_with_intersection() {
    // given
    let (api, queries) = FakeQueryApi::new_with_sender();
    let source = FakeSource {
        followers: people(&["A", "B", "C"]),
        retweeters: people(&["B", "C", "D"]),
        stats: TweetStats {
            retweets: 3,
            likes: 0,
        },
        ..FakeSource::default()
    };
    let mut app = App::new(api, Some(source), EmptyPoolPolicy::ReturnEmpty);
    let criteria = Criteria {
        follows: true,
        retweets: true,
        shares: false,
    };

    // when
    let report = ask(
        &mut app,
        &queries,
        SocialInteractionsRequest::new(TWEET_URL, criteria),
    )
    .await
    .unwrap();

    // then
    let ids: Vec<&str> = report.users.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["B", "C"]);
    assert_eq!(report.counts.total, 2);
    assert!(!report.mock);
}

#[tokio::test]
async fn run__missing_source__answers_configuration_error() {
    // given
    let (api, queries) = FakeQueryApi::new_with_sender();
    let mut app: App<FakeQueryApi, FakeSource> =
        App::new(api, None, EmptyPoolPolicy::ReturnEmpty);
    let criteria = Criteria {
        follows: true,
        ..Criteria::default()
    };

    // when
    let result = ask(
        &mut app,
        &queries,
        SocialInteractionsRequest::new(TWEET_URL, criteria),
    )
    .await;

    // then
    assert!(matches!(result, Err(Error::Configuration(message)) if message == MISSING_TOKEN_MESSAGE));
}

#[tokio::test]
async fn run__missing_tweet_url__answers_validation_error() {
    // given
    let (api, queries) = FakeQueryApi::new_with_sender();
    let mut app = App::new(api, Some(FakeSource::default()), EmptyPoolPolicy::ReturnEmpty);
    let request = SocialInteractionsRequest {
        tweet_url: None,
        criteria: Some(Criteria::default()),
    };

    // when
    let result = ask(&mut app, &queries, request).await;

    // then
    assert!(matches!(result, Err(Error::Validation(message)) if message == "Tweet URL is required"));
}

#[tokio::test]
async fn run__missing_criteria__answers_validation_error() {
    // given
    let (api, queries) = FakeQueryApi::new_with_sender();
    let mut app = App::new(api, Some(FakeSource::default()), EmptyPoolPolicy::ReturnEmpty);
    let request = SocialInteractionsRequest {
        tweet_url: Some(TWEET_URL.to_string()),
        criteria: None,
    };

    // when
    let result = ask(&mut app, &queries, request).await;

    // then
    assert!(
        matches!(result, Err(Error::Validation(message)) if message == "Criteria object is required")
    );
}

#[tokio::test]
async fn run__empty_pool_with_demo_policy__answers_mock_users() {
    // given
    let (api, queries) = FakeQueryApi::new_with_sender();
    let source = FakeSource {
        stats: TweetStats {
            retweets: 2,
            likes: 1,
        },
        ..FakeSource::default()
    };
    let mut app = App::new(api, Some(source), EmptyPoolPolicy::SynthesizeDemo);
    let criteria = Criteria {
        follows: true,
        ..Criteria::default()
    };

    // when
    let report = ask(
        &mut app,
        &queries,
        SocialInteractionsRequest::new(TWEET_URL, criteria),
    )
    .await
    .unwrap();

    // then
    let ids: Vec<&str> = report.users.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["mock_rt_1", "mock_rt_2", "mock_like_1"]);
    assert!(report.mock);
}

#[tokio::test]
async fn run__interrupt__exits() {
    // given
    let (api, _queries) = FakeQueryApi::new_with_sender();
    let mut app = App::new(api, Some(FakeSource::default()), EmptyPoolPolicy::ReturnEmpty);

    // when
    let state = app.run(async {}).await.unwrap();

    // then
    assert_eq!(state, RunState::Exit);
}

/// Never answers the tweet lookup for `STALLED_TWEET_ID`.
#[derive(Clone, Default)]
pub struct StallingSource {
    inner: FakeSource,
}

const STALLED_TWEET_ID: &str = "1850000000000000001";

impl InteractionSource for StallingSource {
    async fn tweet(&self, tweet: &TweetRef) -> randomness::Result<TweetInfo> {
        if tweet.tweet_id == STALLED_TWEET_ID {
            pending::<()>().await;
        }
        self.inner.tweet(tweet).await
    }

    async fn followers(&self, handle: &str) -> randomness::Result<Vec<Participant>> {
        self.inner.followers(handle).await
    }

    async fn retweeters(&self, tweet: &TweetRef) -> randomness::Result<Vec<Participant>> {
        self.inner.retweeters(tweet).await
    }

    async fn likers(&self, tweet: &TweetRef) -> randomness::Result<Vec<Participant>> {
        self.inner.likers(tweet).await
    }
}

#[tokio::test]
async fn run__stalled_query__does_not_hold_up_later_query() {
    // given
    let (api, queries) = FakeQueryApi::new_with_sender();
    let source = StallingSource {
        inner: FakeSource {
            followers: people(&["A"]),
            ..FakeSource::default()
        },
    };
    let mut app = App::new(api, Some(source), EmptyPoolPolicy::ReturnEmpty);
    let criteria = Criteria {
        follows: true,
        ..Criteria::default()
    };
    let (stalled_sender, mut stalled_receiver) = oneshot::channel();
    let (quick_sender, mut quick_receiver) = oneshot::channel();
    queries
        .send(Query::social_interactions(
            SocialInteractionsRequest::new(TWEET_URL, criteria),
            stalled_sender,
        ))
        .await
        .unwrap();
    queries
        .send(Query::social_interactions(
            SocialInteractionsRequest::new("https://x.com/host/status/1850000000000000002", criteria),
            quick_sender,
        ))
        .await
        .unwrap();

    // when
    let mut answer = None;
    for _ in 0..3 {
        app.run(pending()).await.unwrap();
        if let Ok(result) = quick_receiver.try_recv() {
            answer = Some(result);
            break;
        }
    }

    // then
    let report = answer.expect("later query answered").unwrap();
    let ids: Vec<&str> = report.users.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["A"]);
    assert_eq!(stalled_receiver.try_recv().unwrap_err(), TryRecvError::Empty);
    assert_eq!(app.in_flight(), 1);
}
