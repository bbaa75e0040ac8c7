use crate::{
    participant::Participant,
    tweet::TweetStats,
};
use rand::{
    Rng,
    seq::IndexedRandom,
};

const MAX_PER_CATEGORY: u64 = 10;
const HANDLE_PARTS: [&str; 9] = [
    "crypto", "nft", "web3", "defi", "eth", "btc", "trader", "hodl", "moon",
];

/// Demo participants shaped after the tweet's counters: up to ten
/// `mock_rt_{i}` entries followed by up to ten `mock_like_{i}` entries.
pub fn synthesize_mock_participants<R: Rng + ?Sized>(
    rng: &mut R,
    stats: &TweetStats,
) -> Vec<Participant> {
    let retweets = stats.retweets.min(MAX_PER_CATEGORY);
    let likes = stats.likes.min(MAX_PER_CATEGORY);
    let retweeters = (1..=retweets).map(|i| format!("mock_rt_{i}"));
    let likers = (1..=likes).map(|i| format!("mock_like_{i}"));
    retweeters
        .chain(likers)
        .map(|id| Participant::new(id, random_handle(rng), fakeit::name::full()))
        .collect()
}

fn random_handle<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = HANDLE_PARTS.choose(rng).copied().unwrap_or("web3");
    let second = if rng.random_bool(0.5) {
        HANDLE_PARTS.choose(rng).copied().unwrap_or_default()
    } else {
        ""
    };
    let suffix = rng.random_range(0..1000);
    format!("{first}{second}{suffix}")
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{
        SeedableRng,
        rngs::StdRng,
    };

    #[test]
    fn synthesize_mock_participants__caps_each_category_at_ten() {
        // given
        let mut rng = StdRng::seed_from_u64(7);
        let stats = TweetStats {
            retweets: 2,
            likes: 250,
        };

        // when
        let users = synthesize_mock_participants(&mut rng, &stats);

        // then
        let ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids.len(), 12);
        assert_eq!(&ids[..3], &["mock_rt_1", "mock_rt_2", "mock_like_1"]);
        assert_eq!(ids[11], "mock_like_10");
        assert!(users.iter().all(|u| u.handle.starts_with('@')));
    }

    #[test]
    fn synthesize_mock_participants__zero_counters_yield_nothing() {
        // given
        let mut rng = StdRng::seed_from_u64(1);

        // when
        let users = synthesize_mock_participants(&mut rng, &TweetStats::default());

        // then
        assert!(users.is_empty());
    }
}
