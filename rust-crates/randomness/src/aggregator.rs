use crate::{
    Error,
    Result,
    demo::synthesize_mock_participants,
    participant::{
        Participant,
        dedup_by_id,
    },
    social::InteractionSource,
    tweet::{
        TweetInfo,
        TweetRef,
    },
};
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::{
    HashMap,
    HashSet,
};

/// Which interaction lists a participant must appear in to be eligible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Criteria {
    pub follows: bool,
    pub retweets: bool,
    pub shares: bool,
}

impl Criteria {
    pub fn selected_count(&self) -> usize {
        [self.follows, self.retweets, self.shares]
            .iter()
            .filter(|selected| **selected)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.selected_count() == 0
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::Validation(
                "Please select at least one interaction criteria".to_string(),
            ));
        }
        Ok(())
    }
}

/// The three interaction lists as fetched; unselected lists stay empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawInteractions {
    pub followers: Vec<Participant>,
    pub retweeters: Vec<Participant>,
    pub likers: Vec<Participant>,
}

/// Combines the selected lists into the eligible pool.
///
/// One list is deduplicated as-is. With more, a participant must be present
/// in every selected list; display fields come from the last list seen and
/// order follows the first selected list. The tweet author is never eligible.
pub fn resolve_eligible_pool(
    raw: &RawInteractions,
    criteria: Criteria,
    author_id: &str,
) -> Vec<Participant> {
    let selected: Vec<&Vec<Participant>> = [
        (criteria.follows, &raw.followers),
        (criteria.retweets, &raw.retweeters),
        (criteria.shares, &raw.likers),
    ]
    .into_iter()
    .filter_map(|(on, list)| on.then_some(list))
    .collect();

    let pool = match selected.as_slice() {
        [] => Vec::new(),
        [only] => dedup_by_id(only.iter().cloned()),
        [first, ..] => {
            let mut tally: HashMap<&str, usize> = HashMap::new();
            let mut latest: HashMap<&str, &Participant> = HashMap::new();
            for list in &selected {
                let mut seen_in_list = HashSet::new();
                for participant in list.iter() {
                    latest.insert(participant.id.as_str(), participant);
                    if seen_in_list.insert(participant.id.as_str()) {
                        *tally.entry(participant.id.as_str()).or_default() += 1;
                    }
                }
            }
            let required = selected.len();
            let order = dedup_by_id(first.iter().cloned());
            order
                .into_iter()
                .filter(|p| tally.get(p.id.as_str()).copied() == Some(required))
                .filter_map(|p| latest.get(p.id.as_str()).map(|found| (*found).clone()))
                .collect()
        }
    };

    pool.into_iter().filter(|p| p.id != author_id).collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmptyPoolPolicy {
    #[default]
    ReturnEmpty,
    /// Fabricate demo participants from the tweet's counters.
    SynthesizeDemo,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionCounts {
    pub follows: usize,
    pub retweets: usize,
    pub shares: usize,
    pub total: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionReport {
    pub tweet: TweetInfo,
    pub users: Vec<Participant>,
    pub counts: InteractionCounts,
    pub mock: bool,
}

/// Fetches the selected interaction lists for a tweet and resolves the pool.
pub async fn collect_interactions<S: InteractionSource>(
    source: &S,
    tweet_url: &str,
    criteria: Criteria,
    policy: EmptyPoolPolicy,
) -> Result<InteractionReport> {
    criteria.validate()?;
    let tweet_ref = TweetRef::parse(tweet_url)?;
    let tweet = source.tweet(&tweet_ref).await?;
    tracing::info!(
        "collecting interactions for tweet {} by {}",
        tweet.id,
        tweet.author.handle
    );

    let author_handle = tweet.author.bare_handle().to_string();
    let (followers, retweeters, likers) = futures::try_join!(
        fetch_if(criteria.follows, source.followers(&author_handle)),
        fetch_if(
            criteria.retweets && tweet.stats.retweets > 0,
            source.retweeters(&tweet_ref)
        ),
        fetch_if(
            criteria.shares && tweet.stats.likes > 0,
            source.likers(&tweet_ref)
        ),
    )?;
    let raw = RawInteractions {
        followers,
        retweeters,
        likers,
    };

    let mut users = resolve_eligible_pool(&raw, criteria, &tweet.author.id);
    let mut mock = false;
    if users.is_empty() && policy == EmptyPoolPolicy::SynthesizeDemo {
        tracing::warn!("no eligible participants for {}; using demo data", tweet.id);
        users = synthesize_mock_participants(&mut rand::rng(), &tweet.stats);
        mock = !users.is_empty();
    }

    let counts = InteractionCounts {
        follows: raw.followers.len(),
        retweets: raw.retweeters.len(),
        shares: raw.likers.len(),
        total: users.len(),
    };
    tracing::info!(
        "found {} eligible participants (follows={}, retweets={}, shares={})",
        counts.total,
        counts.follows,
        counts.retweets,
        counts.shares
    );

    Ok(InteractionReport {
        tweet,
        users,
        counts,
        mock,
    })
}

async fn fetch_if(
    enabled: bool,
    fetch: impl Future<Output = Result<Vec<Participant>>>,
) -> Result<Vec<Participant>> {
    if enabled { fetch.await } else { Ok(Vec::new()) }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::tweet::TweetStats;
    use proptest::prelude::*;
    use std::cell::RefCell;

    fn people(ids: &[&str]) -> Vec<Participant> {
        ids.iter()
            .map(|id| Participant::new(*id, format!("user_{id}"), format!("User {id}")))
            .collect()
    }

    fn ids(pool: &[Participant]) -> Vec<&str> {
        pool.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn resolve_eligible_pool__two_lists_keeps_intersection() {
        // given
        let raw = RawInteractions {
            followers: people(&["A", "B", "C"]),
            retweeters: people(&["B", "C", "D"]),
            likers: Vec::new(),
        };
        let criteria = Criteria {
            follows: true,
            retweets: true,
            shares: false,
        };

        // when
        let pool = resolve_eligible_pool(&raw, criteria, "author");

        // then
        assert_eq!(ids(&pool), vec!["B", "C"]);
    }

    #[test]
    fn resolve_eligible_pool__single_list_is_deduplicated() {
        // given
        let raw = RawInteractions {
            followers: Vec::new(),
            retweeters: Vec::new(),
            likers: people(&["X", "Y", "X"]),
        };
        let criteria = Criteria {
            shares: true,
            ..Criteria::default()
        };

        // when
        let pool = resolve_eligible_pool(&raw, criteria, "author");

        // then
        assert_eq!(ids(&pool), vec!["X", "Y"]);
    }

    #[test]
    fn resolve_eligible_pool__excludes_author() {
        // given
        let raw = RawInteractions {
            followers: Vec::new(),
            retweeters: people(&["author", "B"]),
            likers: people(&["author", "B"]),
        };
        let criteria = Criteria {
            follows: false,
            retweets: true,
            shares: true,
        };

        // when
        let pool = resolve_eligible_pool(&raw, criteria, "author");

        // then
        assert_eq!(ids(&pool), vec!["B"]);
    }

    #[test]
    fn resolve_eligible_pool__duplicate_within_one_list_does_not_count_twice() {
        // given
        let raw = RawInteractions {
            followers: people(&["A", "A"]),
            retweeters: people(&["B"]),
            likers: Vec::new(),
        };
        let criteria = Criteria {
            follows: true,
            retweets: true,
            shares: false,
        };

        // when
        let pool = resolve_eligible_pool(&raw, criteria, "author");

        // then
        assert!(pool.is_empty());
    }

    #[test]
    fn resolve_eligible_pool__display_fields_come_from_last_list() {
        // given
        let raw = RawInteractions {
            followers: vec![Participant::new("1", "old", "Old")],
            retweeters: vec![Participant::new("1", "new", "New")],
            likers: Vec::new(),
        };
        let criteria = Criteria {
            follows: true,
            retweets: true,
            shares: false,
        };

        // when
        let pool = resolve_eligible_pool(&raw, criteria, "author");

        // then
        assert_eq!(pool, vec![Participant::new("1", "new", "New")]);
    }

    #[test]
    fn validate__no_criteria_is_validation_error() {
        // given
        let criteria = Criteria::default();

        // when
        let err = criteria.validate().unwrap_err();

        // then
        assert_eq!(
            err.to_string(),
            "Please select at least one interaction criteria"
        );
    }

    fn arb_list() -> impl Strategy<Value = Vec<Participant>> {
        proptest::collection::vec(0u8..12, 0..20).prop_map(|raw| {
            raw.into_iter()
                .map(|n| Participant::new(n.to_string(), format!("h{n}"), format!("N{n}")))
                .collect()
        })
    }

    fn id_set(list: &[Participant]) -> HashSet<String> {
        list.iter().map(|p| p.id.clone()).collect()
    }

    proptest! {
        #[test]
        fn resolve_eligible_pool__is_unique_and_contained_in_every_selected_list(
            followers in arb_list(),
            retweeters in arb_list(),
            likers in arb_list(),
            follows in any::<bool>(),
            retweets in any::<bool>(),
            shares in any::<bool>(),
        ) {
            let raw = RawInteractions { followers, retweeters, likers };
            let criteria = Criteria { follows, retweets, shares };

            let pool = resolve_eligible_pool(&raw, criteria, "0");

            let pool_ids = id_set(&pool);
            prop_assert_eq!(pool_ids.len(), pool.len());
            prop_assert!(!pool_ids.contains("0"));
            for (on, list) in [
                (follows, &raw.followers),
                (retweets, &raw.retweeters),
                (shares, &raw.likers),
            ] {
                if on {
                    prop_assert!(pool_ids.is_subset(&id_set(list)));
                }
            }
            if criteria.is_empty() {
                prop_assert!(pool.is_empty());
            }
        }
    }

    struct FakeSource {
        tweet: TweetInfo,
        followers: Vec<Participant>,
        retweeters: Vec<Participant>,
        likers: Vec<Participant>,
        followers_error: Option<&'static str>,
        calls: RefCell<Vec<&'static str>>,
    }

    impl FakeSource {
        fn new(stats: TweetStats) -> Self {
            Self {
                tweet: TweetInfo {
                    id: "1850000000000000001".to_string(),
                    text: "giveaway".to_string(),
                    author: Participant::new("author", "host", "Host"),
                    stats,
                },
                followers: Vec::new(),
                retweeters: Vec::new(),
                likers: Vec::new(),
                followers_error: None,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl InteractionSource for FakeSource {
        async fn tweet(&self, _tweet: &TweetRef) -> Result<TweetInfo> {
            self.calls.borrow_mut().push("tweet");
            Ok(self.tweet.clone())
        }

        async fn followers(&self, handle: &str) -> Result<Vec<Participant>> {
            assert_eq!(handle, "host");
            self.calls.borrow_mut().push("followers");
            match self.followers_error {
                Some(message) => Err(Error::upstream(message)),
                None => Ok(self.followers.clone()),
            }
        }

        async fn retweeters(&self, _tweet: &TweetRef) -> Result<Vec<Participant>> {
            self.calls.borrow_mut().push("retweeters");
            Ok(self.retweeters.clone())
        }

        async fn likers(&self, _tweet: &TweetRef) -> Result<Vec<Participant>> {
            self.calls.borrow_mut().push("likers");
            Ok(self.likers.clone())
        }
    }

    const URL: &str = "https://x.com/host/status/1850000000000000001";

    #[tokio::test]
    async fn collect_interactions__fetches_only_selected_lists() {
        // given
        let mut source = FakeSource::new(TweetStats {
            retweets: 2,
            likes: 2,
        });
        source.retweeters = people(&["B", "C"]);
        let criteria = Criteria {
            retweets: true,
            ..Criteria::default()
        };

        // when
        let report =
            collect_interactions(&source, URL, criteria, EmptyPoolPolicy::ReturnEmpty)
                .await
                .unwrap();

        // then
        assert_eq!(*source.calls.borrow(), vec!["tweet", "retweeters"]);
        assert_eq!(ids(&report.users), vec!["B", "C"]);
        assert_eq!(
            report.counts,
            InteractionCounts {
                follows: 0,
                retweets: 2,
                shares: 0,
                total: 2,
            }
        );
        assert!(!report.mock);
    }

    #[tokio::test]
    async fn collect_interactions__zero_counters_skip_interaction_fetches() {
        // given
        let source = FakeSource::new(TweetStats::default());
        let criteria = Criteria {
            follows: false,
            retweets: true,
            shares: true,
        };

        // when
        let report =
            collect_interactions(&source, URL, criteria, EmptyPoolPolicy::ReturnEmpty)
                .await
                .unwrap();

        // then
        assert_eq!(*source.calls.borrow(), vec!["tweet"]);
        assert!(report.users.is_empty());
    }

    #[tokio::test]
    async fn collect_interactions__empty_criteria_is_rejected_before_fetching() {
        // given
        let source = FakeSource::new(TweetStats::default());

        // when
        let result = collect_interactions(
            &source,
            URL,
            Criteria::default(),
            EmptyPoolPolicy::ReturnEmpty,
        )
        .await;

        // then
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(source.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn collect_interactions__demo_policy_fills_empty_pool() {
        // given
        let source = FakeSource::new(TweetStats {
            retweets: 3,
            likes: 40,
        });
        let criteria = Criteria {
            retweets: true,
            ..Criteria::default()
        };

        // when
        let report =
            collect_interactions(&source, URL, criteria, EmptyPoolPolicy::SynthesizeDemo)
                .await
                .unwrap();

        // then
        assert!(report.mock);
        assert_eq!(report.users.len(), 13);
        assert_eq!(report.counts.total, 13);
    }

    #[tokio::test]
    async fn collect_interactions__failed_list_fetch_aborts_without_partial_result() {
        // given
        let mut source = FakeSource::new(TweetStats {
            retweets: 2,
            likes: 0,
        });
        source.retweeters = people(&["B", "C"]);
        source.followers_error = Some("Failed to fetch followers: boom");
        let criteria = Criteria {
            follows: true,
            retweets: true,
            shares: false,
        };

        // when
        let result =
            collect_interactions(&source, URL, criteria, EmptyPoolPolicy::SynthesizeDemo).await;

        // then
        assert!(
            matches!(result, Err(Error::Upstream(message)) if message == "Failed to fetch followers: boom")
        );
    }
}
