use crate::{
    Error,
    Result,
    participant::Participant,
};
use serde::{
    Deserialize,
    Serialize,
};
use url::Url;

const TWEET_HOSTS: [&str; 2] = ["twitter.com", "x.com"];

/// A tweet dereferenced from a status URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TweetRef {
    pub author_handle: String,
    pub tweet_id: String,
}

impl TweetRef {
    /// Accepts `twitter.com` and `x.com` status URLs, with or without a scheme,
    /// `www.`/`mobile.` prefixes, trailing path segments or a query string.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("Tweet URL is required".to_string()));
        }
        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };
        let url = Url::parse(&with_scheme).map_err(|_| invalid_url(raw))?;
        let host = url.host_str().ok_or_else(|| invalid_url(raw))?;
        let host = host
            .trim_start_matches("www.")
            .trim_start_matches("mobile.");
        if !TWEET_HOSTS.contains(&host) {
            return Err(invalid_url(raw));
        }
        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        match segments.as_slice() {
            [user, "status", id, ..] if is_handle(user) && is_numeric_id(id) => {
                Ok(Self {
                    author_handle: user.to_string(),
                    tweet_id: id.to_string(),
                })
            }
            _ => Err(invalid_url(raw)),
        }
    }

    pub fn canonical_url(&self) -> String {
        format!("https://x.com/{}/status/{}", self.author_handle, self.tweet_id)
    }

    pub fn retweets_url(&self) -> String {
        format!("{}/retweets", self.canonical_url())
    }

    pub fn likes_url(&self) -> String {
        format!("{}/likes", self.canonical_url())
    }
}

fn invalid_url(raw: &str) -> Error {
    Error::Validation(format!(
        "Please enter a valid Twitter/X post URL (got '{}')",
        raw.trim()
    ))
}

fn is_handle(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_numeric_id(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit())
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetStats {
    pub retweets: u64,
    pub likes: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetInfo {
    pub id: String,
    pub text: String,
    pub author: Participant,
    pub stats: TweetStats,
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse__accepts_x_and_twitter_status_urls() {
        // given
        let urls = [
            "https://x.com/randomness_wtf/status/1850000000000000001",
            "https://twitter.com/randomness_wtf/status/1850000000000000001?s=20",
            "https://www.x.com/randomness_wtf/status/1850000000000000001/photo/1",
            "mobile.twitter.com/randomness_wtf/status/1850000000000000001",
        ];

        // when
        let parsed: Vec<TweetRef> = urls
            .iter()
            .map(|url| TweetRef::parse(url).unwrap())
            .collect();

        // then
        let expected = TweetRef {
            author_handle: "randomness_wtf".to_string(),
            tweet_id: "1850000000000000001".to_string(),
        };
        assert!(parsed.iter().all(|tweet| *tweet == expected));
    }

    #[test]
    fn parse__rejects_other_hosts_and_shapes() {
        // given
        let urls = [
            "https://example.com/user/status/1",
            "https://x.com/user/likes",
            "https://x.com/user/status/abc",
            "https://x.com/bad-handle/status/1",
        ];

        // when
        let results: Vec<Result<TweetRef>> =
            urls.iter().map(|url| TweetRef::parse(url)).collect();

        // then
        assert!(
            results
                .iter()
                .all(|result| matches!(result, Err(Error::Validation(_))))
        );
    }

    #[test]
    fn parse__empty_url_is_required_error() {
        // given
        let raw = "   ";

        // when
        let err = TweetRef::parse(raw).unwrap_err();

        // then
        assert_eq!(err.to_string(), "Tweet URL is required");
    }

    #[test]
    fn interaction_urls__derive_from_canonical_url() {
        // given
        let tweet = TweetRef {
            author_handle: "alice".to_string(),
            tweet_id: "7".to_string(),
        };

        // when
        let urls = (tweet.retweets_url(), tweet.likes_url());

        // then
        assert_eq!(
            urls,
            (
                "https://x.com/alice/status/7/retweets".to_string(),
                "https://x.com/alice/status/7/likes".to_string(),
            )
        );
    }
}
