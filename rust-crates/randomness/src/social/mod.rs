use crate::{
    Result,
    participant::Participant,
    tweet::{
        TweetInfo,
        TweetRef,
    },
};

pub mod apify;

pub use apify::ApifyScraper;

/// Where tweet metadata and the three interaction lists come from.
///
/// Every list returned is already normalized and deduplicated by id.
pub trait InteractionSource {
    fn tweet(&self, tweet: &TweetRef) -> impl Future<Output = Result<TweetInfo>>;

    fn followers(&self, handle: &str) -> impl Future<Output = Result<Vec<Participant>>>;

    fn retweeters(
        &self,
        tweet: &TweetRef,
    ) -> impl Future<Output = Result<Vec<Participant>>>;

    fn likers(&self, tweet: &TweetRef) -> impl Future<Output = Result<Vec<Participant>>>;
}
