use crate::{ConnectivityState, QueryKind, RoutedAnswer, RouterResult};
use opentelemetry::trace::Status;
use std::time::Instant;
use tracing::{info_span, Span};
use tracing_futures::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub struct SubmitSpan {
    span: Span,
    start_time: Instant,
    endpoint: Option<&'static str>,
    fallback: bool,
    source: Option<String>,
}

impl SubmitSpan {
    pub fn new(kind: QueryKind, state: ConnectivityState) -> Self {
        let span = info_span!("nanban.submit", kind = kind.as_str(), online = state.is_online());
        span.set_attribute("nanban.query.kind", kind.as_str());
        span.set_attribute("nanban.route.online", state.is_online());

        Self {
            span,
            start_time: Instant::now(),
            endpoint: None,
            fallback: false,
            source: None,
        }
    }

    fn span(&self) -> Span {
        self.span.clone()
    }

    pub async fn instrument_future<F>(&self, future: F) -> F::Output
    where
        F: std::future::Future,
    {
        future.instrument(self.span()).await
    }

    pub fn on_answer(&mut self, answer: &RoutedAnswer) {
        self.endpoint = Some(answer.endpoint);
        self.fallback = answer.fallback;
        self.source.clone_from(&answer.response.source);
    }

    pub fn on_error(&mut self, error: &(dyn std::error::Error + 'static)) {
        self.span
            .set_attribute("exception.message", error.to_string());
        self.span.set_status(Status::error(error.to_string()));
    }

    pub fn on_end(&mut self) {
        if let Some(endpoint) = self.endpoint {
            self.span.set_attribute("nanban.route.endpoint", endpoint);
        }
        self.span
            .set_attribute("nanban.route.fallback", self.fallback);
        if let Some(source) = &self.source {
            self.span
                .set_attribute("nanban.response.source", source.clone());
        }
        self.span.set_attribute(
            "nanban.duration_seconds",
            self.start_time.elapsed().as_secs_f64(),
        );
    }
}

pub async fn trace_submission<F, Fut>(
    kind: QueryKind,
    state: ConnectivityState,
    f: F,
) -> RouterResult<RoutedAnswer>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = RouterResult<RoutedAnswer>>,
{
    let mut span = SubmitSpan::new(kind, state);
    let result = span.instrument_future(f()).await;

    match &result {
        Ok(answer) => span.on_answer(answer),
        Err(error) => span.on_error(error),
    }

    span.on_end();
    result
}
