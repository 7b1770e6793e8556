use crate::{
    determine_endpoint,
    endpoint::{IMAGE_DIAGNOSIS_ENDPOINT, OFFLINE_QUERY_ENDPOINT, TEXT_QUERY_ENDPOINT},
    keywords::LocationKeywords,
    opentelemetry::trace_submission,
    ConnectivityState, FallbackPolicy, GeolocationError, Geolocator, ImageUpload, Location,
    QueryKind, QueryRequest, QueryResponse, ReqwestTransport, ReqwestTransportOptions,
    RouterError, RouterOptions, RouterResult, Transport,
};
use serde_json::Value;
use std::{sync::Arc, time::Duration};

pub const EMPTY_QUESTION_MESSAGE: &str = "Please enter a question";
pub const NOT_AN_IMAGE_MESSAGE: &str = "Please select an image file";
pub const GENERIC_QUERY_ERROR: &str = "An error occurred";
pub const GENERIC_IMAGE_ERROR: &str = "An error occurred during image analysis";

/// A successful answer together with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedAnswer {
    pub response: QueryResponse,
    pub endpoint: &'static str,
    /// Whether the answer came from the offline retry of a failed online query.
    pub fallback: bool,
}

impl RoutedAnswer {
    /// Whether the remote backend produced this answer.
    #[must_use]
    pub fn served_online(&self) -> bool {
        matches!(self.endpoint, TEXT_QUERY_ENDPOINT | IMAGE_DIAGNOSIS_ENDPOINT)
    }
}

/// Routes submissions to the online or offline backend.
#[derive(Clone)]
pub struct Router {
    transport: Arc<dyn Transport>,
    geolocator: Arc<dyn Geolocator>,
    keywords: Arc<LocationKeywords>,
    geolocation_timeout: Duration,
    fallback: FallbackPolicy,
}

impl Router {
    pub fn new(
        transport: Arc<dyn Transport>,
        geolocator: Arc<dyn Geolocator>,
        options: &RouterOptions,
    ) -> Self {
        Self {
            transport,
            geolocator,
            keywords: Arc::new(options.keywords()),
            geolocation_timeout: options.geolocation_timeout,
            fallback: options.fallback,
        }
    }

    /// A router talking to `options.base_url` over `reqwest`.
    pub fn from_options(geolocator: Arc<dyn Geolocator>, options: &RouterOptions) -> Self {
        let transport = ReqwestTransport::new(ReqwestTransportOptions {
            base_url: Some(options.base_url.clone()),
            timeout: options.request_timeout,
            client: None,
        });
        Self::new(Arc::new(transport), geolocator, options)
    }

    pub async fn submit_text_query(
        &self,
        question: &str,
        state: ConnectivityState,
    ) -> RouterResult<RoutedAnswer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RouterError::InvalidInput(EMPTY_QUESTION_MESSAGE.to_string()));
        }

        trace_submission(QueryKind::Text, state, || async move {
            let online = state.is_online();
            let location = if online && self.keywords.matches(question) {
                self.resolve_location().await
            } else {
                None
            };

            let request = QueryRequest {
                question: question.to_string(),
                location,
            };
            let body = serde_json::to_value(&request).map_err(|error| {
                RouterError::Invariant(format!("Failed to encode query: {error}"))
            })?;

            let endpoint = determine_endpoint(QueryKind::Text, online);
            tracing::debug!(
                endpoint,
                online,
                has_location = request.location.is_some(),
                "routing text query"
            );

            match self.post_text(endpoint, &body).await {
                Ok(response) => Ok(RoutedAnswer {
                    response,
                    endpoint,
                    fallback: false,
                }),
                Err(error)
                    if online
                        && error.is_transport()
                        && self.fallback == FallbackPolicy::OfflineRetry =>
                {
                    tracing::warn!(%error, "online query failed, trying offline fallback");
                    match self.post_text(OFFLINE_QUERY_ENDPOINT, &body).await {
                        Ok(response) => Ok(RoutedAnswer {
                            response,
                            endpoint: OFFLINE_QUERY_ENDPOINT,
                            fallback: true,
                        }),
                        Err(fallback_error) => {
                            tracing::error!(%fallback_error, "offline fallback also failed");
                            Err(error)
                        }
                    }
                }
                Err(error) => Err(error),
            }
        })
        .await
    }

    pub async fn submit_image_query(
        &self,
        image: &ImageUpload,
        state: ConnectivityState,
    ) -> RouterResult<RoutedAnswer> {
        if !image.is_image() {
            return Err(RouterError::InvalidInput(NOT_AN_IMAGE_MESSAGE.to_string()));
        }

        trace_submission(QueryKind::Image, state, || async move {
            let endpoint = determine_endpoint(QueryKind::Image, state.is_online());
            tracing::debug!(
                endpoint,
                file_name = %image.file_name,
                size = image.bytes.len(),
                "routing image diagnosis"
            );

            let response = self
                .transport
                .post_multipart(endpoint, image)
                .await?
                .into_query_response(GENERIC_IMAGE_ERROR)?;

            Ok(RoutedAnswer {
                response,
                endpoint,
                fallback: false,
            })
        })
        .await
    }

    async fn post_text(&self, endpoint: &str, body: &Value) -> RouterResult<QueryResponse> {
        self.transport
            .post_json(endpoint, body)
            .await?
            .into_query_response(GENERIC_QUERY_ERROR)
    }

    async fn resolve_location(&self) -> Option<Location> {
        let located = tokio::time::timeout(self.geolocation_timeout, self.geolocator.locate())
            .await
            .unwrap_or(Err(GeolocationError::Timeout));
        match located {
            Ok(location) => Some(location),
            Err(error) => {
                tracing::warn!(%error, "location unavailable, sending query without it");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        nanban_test::{MockResponse, MockTransport, RequestBody},
        FixedGeolocator,
    };
    use serde_json::json;

    fn router(
        transport: &Arc<MockTransport>,
        geolocator: &Arc<FixedGeolocator>,
        fallback: FallbackPolicy,
    ) -> Router {
        Router::new(
            transport.clone(),
            geolocator.clone(),
            &RouterOptions {
                fallback,
                ..RouterOptions::default()
            },
        )
    }

    #[tokio::test]
    async fn non_2xx_online_does_not_fall_back() {
        let transport = Arc::new(MockTransport::new());
        transport.enqueue(MockResponse::json(
            502,
            json!({ "answer": "An error occurred with the online model.", "source": "Error" }),
        ));
        let geolocator = Arc::new(FixedGeolocator::denied());
        let router = router(&transport, &geolocator, FallbackPolicy::OfflineRetry);

        let error = router
            .submit_text_query("How much fertilizer?", ConnectivityState::Online)
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            RouterError::StatusCode(_, ref message)
                if message == "An error occurred with the online model."
        ));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn fallback_disabled_surfaces_transport_error() {
        let transport = Arc::new(MockTransport::new());
        transport.enqueue(MockResponse::network_error("connection refused"));
        let geolocator = Arc::new(FixedGeolocator::denied());
        let router = router(&transport, &geolocator, FallbackPolicy::None);

        let error = router
            .submit_text_query("How much fertilizer?", ConnectivityState::Online)
            .await
            .unwrap_err();

        assert!(error.is_transport());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn failed_fallback_reports_online_failure_after_one_retry() {
        let transport = Arc::new(MockTransport::new());
        transport
            .enqueue(MockResponse::network_error("connection refused"))
            .enqueue(MockResponse::json(
                500,
                json!({ "answer": "An error occurred with the local model." }),
            ));
        let geolocator = Arc::new(FixedGeolocator::denied());
        let router = router(&transport, &geolocator, FallbackPolicy::OfflineRetry);

        let error = router
            .submit_text_query("How much fertilizer?", ConnectivityState::Online)
            .await
            .unwrap_err();

        assert!(error.to_string().contains("connection refused"));
        let paths: Vec<_> = transport.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/api/text-query", "/api/offline-query"]);
    }

    #[tokio::test]
    async fn non_json_online_body_falls_back_to_offline_endpoint() {
        let transport = Arc::new(MockTransport::new());
        transport
            .enqueue(MockResponse::raw(200, "<html>captive portal</html>"))
            .enqueue(MockResponse::json(
                200,
                json!({ "answer": "Spray neem oil.", "source": "Ollama (Offline)" }),
            ));
        let geolocator = Arc::new(FixedGeolocator::denied());
        let router = router(&transport, &geolocator, FallbackPolicy::OfflineRetry);

        let answer = router
            .submit_text_query("Aphids on brinjal", ConnectivityState::Online)
            .await
            .unwrap();

        assert!(answer.fallback);
        assert_eq!(answer.endpoint, OFFLINE_QUERY_ENDPOINT);
        assert_eq!(answer.response.answer, "Spray neem oil.");
        let paths: Vec<_> = transport.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/api/text-query", "/api/offline-query"]);
    }

    struct PendingGeolocator;

    #[async_trait::async_trait]
    impl Geolocator for PendingGeolocator {
        async fn locate(&self) -> Result<Location, GeolocationError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_geolocation_times_out_and_query_goes_without_location() {
        let transport = Arc::new(MockTransport::new());
        transport.enqueue(MockResponse::json(200, json!({ "answer": "Sunny." })));
        let router = Router::new(
            transport.clone(),
            Arc::new(PendingGeolocator),
            &RouterOptions::default(),
        );

        let answer = router
            .submit_text_query("Weather forecast for Thanjavur", ConnectivityState::Online)
            .await
            .unwrap();

        assert_eq!(answer.endpoint, TEXT_QUERY_ENDPOINT);
        assert_eq!(
            transport.requests()[0].body,
            RequestBody::Json(json!({
                "question": "Weather forecast for Thanjavur",
                "location": null
            }))
        );
    }

    #[tokio::test]
    async fn grain_storage_question_does_not_request_location() {
        let transport = Arc::new(MockTransport::new());
        transport.enqueue(MockResponse::json(200, json!({ "answer": "Keep it dry." })));
        let geolocator = Arc::new(FixedGeolocator::new(Location::new(10.5, 78.25)));
        let router = router(&transport, &geolocator, FallbackPolicy::OfflineRetry);

        router
            .submit_text_query("How do I store grain?", ConnectivityState::Online)
            .await
            .unwrap();

        assert_eq!(geolocator.request_count(), 0);
    }

    #[tokio::test]
    async fn offline_transport_failure_is_not_retried() {
        let transport = Arc::new(MockTransport::new());
        transport.enqueue(MockResponse::network_error("connection refused"));
        let geolocator = Arc::new(FixedGeolocator::denied());
        let router = router(&transport, &geolocator, FallbackPolicy::OfflineRetry);

        let error = router
            .submit_text_query("How much fertilizer?", ConnectivityState::Offline)
            .await
            .unwrap_err();

        assert!(error.is_transport());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn question_is_trimmed_before_sending() {
        let transport = Arc::new(MockTransport::new());
        transport.enqueue(MockResponse::json(
            200,
            json!({ "answer": "ok", "source": "Ollama (Offline)" }),
        ));
        let geolocator = Arc::new(FixedGeolocator::denied());
        let router = router(&transport, &geolocator, FallbackPolicy::OfflineRetry);

        router
            .submit_text_query("  paddy blast?  \n", ConnectivityState::Offline)
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(
            requests[0].body,
            RequestBody::Json(json!({ "question": "paddy blast?", "location": null }))
        );
    }

    #[tokio::test]
    async fn non_image_upload_is_rejected_without_request() {
        let transport = Arc::new(MockTransport::new());
        let geolocator = Arc::new(FixedGeolocator::denied());
        let router = router(&transport, &geolocator, FallbackPolicy::OfflineRetry);

        let error = router
            .submit_image_query(
                &ImageUpload::new("report.pdf", "application/pdf", vec![1, 2]),
                ConnectivityState::Online,
            )
            .await
            .unwrap_err();

        assert!(matches!(error, RouterError::InvalidInput(_)));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn served_online_follows_endpoint() {
        let answer = RoutedAnswer {
            response: QueryResponse::default(),
            endpoint: IMAGE_DIAGNOSIS_ENDPOINT,
            fallback: false,
        };
        assert!(answer.served_online());
        let answer = RoutedAnswer {
            endpoint: OFFLINE_QUERY_ENDPOINT,
            ..answer
        };
        assert!(!answer.served_online());
    }
}
