use crate::{
    Result,
    app::query_api::{
        Query,
        QueryAPI,
        SocialInteractionsRequest,
    },
};
use actix_web::{
    App,
    HttpResponse,
    HttpServer,
    dev::ServerHandle,
    error::InternalError,
    http::StatusCode,
    web,
};
use anyhow::{
    Context,
    anyhow,
};
use randomness::{
    Error,
    aggregator::{
        InteractionCounts,
        InteractionReport,
    },
    participant::Participant,
    tweet::TweetInfo,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    net::TcpListener,
    thread::JoinHandle,
};
use tokio::sync::{
    mpsc,
    oneshot,
};

const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded for Apify. Please try again later.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SocialInteractionsDto {
    pub success: bool,
    pub users: Vec<Participant>,
    pub tweet_info: TweetInfo,
    pub counts: InteractionCounts,
    pub mock: bool,
}

impl From<InteractionReport> for SocialInteractionsDto {
    fn from(report: InteractionReport) -> Self {
        Self {
            success: true,
            users: report.users,
            tweet_info: report.tweet,
            counts: report.counts,
            mock: report.mock,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDto {
    pub success: bool,
    pub message: String,
}

impl ErrorDto {
    fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

pub struct ActixQueryApi {
    receiver: mpsc::Receiver<Query>,
    base_url: String,
    server_handle: ServerHandle,
    server_thread: Option<JoinHandle<()>>,
}

impl ActixQueryApi {
    pub async fn new(port: Option<u16>) -> Result<Self> {
        let (sender, receiver) = mpsc::channel(16);

        let listener = TcpListener::bind(("127.0.0.1", port.unwrap_or(0)))
            .context("failed to bind HTTP listener for query API")?;
        let address = listener
            .local_addr()
            .context("failed to read listener address")?;
        let base_url = format!("http://{}", address);

        tracing::info!("query API listening on {}", base_url);

        let server = HttpServer::new(move || {
            let json_config = web::JsonConfig::default().error_handler(|err, _req| {
                let message = format!("Invalid request body: {err}");
                InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().json(ErrorDto::new(message)),
                )
                .into()
            });
            App::new()
                .app_data(web::Data::new(sender.clone()))
                .app_data(json_config)
                .route(
                    "/api/social-interactions",
                    web::post().to(handle_social_interactions),
                )
        })
        .listen(listener)
        .context("failed to start Actix server")?
        .run();

        let server_handle = server.handle();
        let server_thread = std::thread::spawn(move || {
            let sys = actix_web::rt::System::new();
            let _ = sys.block_on(server);
        });

        Ok(Self {
            receiver,
            base_url,
            server_handle,
            server_thread: Some(server_thread),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl QueryAPI for ActixQueryApi {
    async fn query(&mut self) -> Result<Query> {
        self.receiver
            .recv()
            .await
            .ok_or_else(|| anyhow!("query server closed"))
    }
}

impl Drop for ActixQueryApi {
    fn drop(&mut self) {
        let _ = self.server_handle.stop(true);
        if let Some(thread) = self.server_thread.take() {
            let _ = thread.join();
        }
    }
}

fn status_for(err: &Error) -> StatusCode {
    if err.is_rate_limited() {
        StatusCode::TOO_MANY_REQUESTS
    } else if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn error_response(err: &Error) -> HttpResponse {
    let status = status_for(err);
    let message = match err {
        Error::Validation(message) | Error::Configuration(message) => message.clone(),
        _ if status == StatusCode::TOO_MANY_REQUESTS => RATE_LIMIT_MESSAGE.to_string(),
        other => other.to_string(),
    };
    HttpResponse::build(status).json(ErrorDto::new(message))
}

async fn handle_social_interactions(
    sender: web::Data<mpsc::Sender<Query>>,
    body: web::Json<SocialInteractionsRequest>,
) -> HttpResponse {
    tracing::info!("received social interactions request");
    let (response_sender, response_receiver) = oneshot::channel();
    let query = Query::social_interactions(body.into_inner(), response_sender);

    if sender.get_ref().clone().send(query).await.is_err() {
        return HttpResponse::InternalServerError()
            .json(ErrorDto::new("unable to forward social interactions query"));
    }

    match response_receiver.await {
        Ok(Ok(report)) => HttpResponse::Ok().json(SocialInteractionsDto::from(report)),
        Ok(Err(err)) => error_response(&err),
        Err(_) => HttpResponse::InternalServerError()
            .json(ErrorDto::new("social interactions responder dropped")),
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::*;
    use randomness::{
        aggregator::Criteria,
        tweet::TweetStats,
    };

    fn sample_report() -> InteractionReport {
        InteractionReport {
            tweet: TweetInfo {
                id: "1850000000000000001".to_string(),
                text: "giveaway".to_string(),
                author: Participant::new("1", "host", "Host"),
                stats: TweetStats {
                    retweets: 1,
                    likes: 0,
                },
            },
            users: vec![Participant::new("2", "fan", "Fan")],
            counts: InteractionCounts {
                follows: 0,
                retweets: 1,
                shares: 0,
                total: 1,
            },
            mock: false,
        }
    }

    async fn answer_with(
        api: &mut ActixQueryApi,
        result: randomness::Result<InteractionReport>,
    ) -> SocialInteractionsRequest {
        let query = api.query().await.unwrap();
        let Query::SocialInteractions(inner) = query;
        inner.sender.send(result).unwrap();
        inner.request
    }

    #[tokio::test]
    async fn query__can_get_and_respond_to_social_interactions() {
        // given
        let mut api = ActixQueryApi::new(None).await.unwrap();
        let client = reqwest::Client::new();
        let url = format!("{}/api/social-interactions", api.base_url());
        let criteria = Criteria {
            retweets: true,
            ..Criteria::default()
        };
        let expected_request =
            SocialInteractionsRequest::new("https://x.com/host/status/1", criteria);
        let body = expected_request.clone();

        let client_task = tokio::spawn(async move {
            let response = client.post(url).json(&body).send().await.unwrap();
            let status = response.status();
            (status, response.json::<SocialInteractionsDto>().await.unwrap())
        });

        // when
        let request = answer_with(&mut api, Ok(sample_report())).await;

        // then
        let (status, response) = client_task.await.unwrap();
        assert_eq!(request, expected_request);
        assert_eq!(status, reqwest::StatusCode::OK);
        assert_eq!(response, SocialInteractionsDto::from(sample_report()));
    }

    #[tokio::test]
    async fn query__rate_limit_error_maps_to_429() {
        // given
        let mut api = ActixQueryApi::new(None).await.unwrap();
        let client = reqwest::Client::new();
        let url = format!("{}/api/social-interactions", api.base_url());
        let body = SocialInteractionsRequest::new(
            "https://x.com/host/status/1",
            Criteria {
                shares: true,
                ..Criteria::default()
            },
        );

        let client_task = tokio::spawn(async move {
            let response = client.post(url).json(&body).send().await.unwrap();
            let status = response.status();
            (status, response.json::<ErrorDto>().await.unwrap())
        });

        // when
        answer_with(
            &mut api,
            Err(Error::RateLimited("actor responded with 429".to_string())),
        )
        .await;

        // then
        let (status, response) = client_task.await.unwrap();
        assert_eq!(status, reqwest::StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response, ErrorDto::new(RATE_LIMIT_MESSAGE));
    }

    #[tokio::test]
    async fn query__validation_error_maps_to_400() {
        // given
        let mut api = ActixQueryApi::new(None).await.unwrap();
        let client = reqwest::Client::new();
        let url = format!("{}/api/social-interactions", api.base_url());
        let body = SocialInteractionsRequest::new("not a tweet", Criteria::default());

        let client_task = tokio::spawn(async move {
            let response = client.post(url).json(&body).send().await.unwrap();
            let status = response.status();
            (status, response.json::<ErrorDto>().await.unwrap())
        });

        // when
        answer_with(
            &mut api,
            Err(Error::Validation(
                "Please select at least one interaction criteria".to_string(),
            )),
        )
        .await;

        // then
        let (status, response) = client_task.await.unwrap();
        assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(
            response.message,
            "Please select at least one interaction criteria"
        );
    }

    #[tokio::test]
    async fn post__malformed_json_is_rejected_without_a_query() {
        // given
        let api = ActixQueryApi::new(None).await.unwrap();
        let client = reqwest::Client::new();
        let url = format!("{}/api/social-interactions", api.base_url());

        // when
        let response = client
            .post(url)
            .header("content-type", "application/json")
            .body("{ not json")
            .send()
            .await
            .unwrap();

        // then
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body = response.json::<ErrorDto>().await.unwrap();
        assert!(!body.success);
        assert!(body.message.starts_with("Invalid request body"));
    }

    #[test]
    fn status_for__upstream_errors_are_internal() {
        // given
        let errors = [
            Error::Upstream("scraper responded with 502".to_string()),
            Error::Configuration("missing token".to_string()),
            Error::upstream("Rate limit reached"),
        ];

        // when
        let statuses: Vec<StatusCode> = errors.iter().map(status_for).collect();

        // then
        assert_eq!(
            statuses,
            vec![
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusCode::TOO_MANY_REQUESTS,
            ]
        );
    }
}
