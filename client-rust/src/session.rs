use crate::{
    router::{GENERIC_IMAGE_ERROR, GENERIC_QUERY_ERROR},
    ConnectivityMonitor, ConnectivityState, Geolocator, HttpReachabilityProbe, ImageUpload,
    LoadingCounter, LoadingGuard, Panel, ProbeHandle, ResponseContent, RoutedAnswer, Router,
    RouterError, RouterOptions, RouterResult, Subscription, View, EMPTY_QUESTION_MESSAGE,
    FALLBACK_SOURCE_LABEL, NOT_AN_IMAGE_MESSAGE,
};
use std::sync::Arc;

pub const NO_IMAGE_SELECTED_MESSAGE: &str = "Please select an image first";
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";

/// View-model for one user session: the connectivity it observes, the
/// pending image, and the view it renders into. Handlers never return
/// errors; every outcome is rendered.
///
/// Text questions may overlap on one session. The loading indicator stays
/// visible until the last of them finishes.
pub struct Session {
    router: Router,
    connectivity: Arc<ConnectivityMonitor>,
    view: Arc<dyn View>,
    options: Arc<RouterOptions>,
    loading: LoadingCounter,
    selected_file: Option<ImageUpload>,
    _status: Subscription,
}

impl Session {
    /// The status listener is removed from `connectivity` when the session
    /// is dropped.
    pub fn new(
        router: Router,
        connectivity: Arc<ConnectivityMonitor>,
        view: Arc<dyn View>,
        options: &RouterOptions,
    ) -> Self {
        let options = Arc::new(options.clone());

        let status = {
            let view = view.clone();
            let options = options.clone();
            connectivity.on_change(move |state| {
                view.set_status(state, options.model_label(state.is_online()));
            })
        };

        let state = connectivity.current_state();
        view.set_status(state, options.model_label(state.is_online()));
        view.set_submit_image_enabled(false);

        Self {
            router,
            connectivity,
            view,
            options,
            loading: LoadingCounter::new(),
            selected_file: None,
            _status: status,
        }
    }

    /// Build a session against the live backend: check reachability once,
    /// then keep probing every `options.probe_interval`. The probe stops when
    /// the returned handle is dropped.
    pub async fn start(
        options: &RouterOptions,
        geolocator: Arc<dyn Geolocator>,
        view: Arc<dyn View>,
    ) -> (Self, ProbeHandle) {
        let probe = HttpReachabilityProbe::new(options.probe_url.clone(), options.probe_timeout);
        let connectivity = Arc::new(ConnectivityMonitor::new(
            ConnectivityState::from_online(options.assume_online),
            Arc::new(probe),
        ));
        let router = Router::from_options(geolocator, options);
        let session = Self::new(router, connectivity.clone(), view, options);

        connectivity.refresh().await;
        let handle = connectivity.spawn_periodic_probe(options.probe_interval);
        (session, handle)
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    pub fn selected_file(&self) -> Option<&ImageUpload> {
        self.selected_file.as_ref()
    }

    /// Ask a text question. Returns what was rendered, or `None` when the
    /// question was refused before submission.
    pub async fn submit_query(&self, question: &str) -> Option<ResponseContent> {
        if question.trim().is_empty() {
            self.view.alert(EMPTY_QUESTION_MESSAGE);
            return None;
        }

        let _loading = LoadingGuard::new(self.view.as_ref(), &self.loading);
        self.view.hide_response(Panel::Query);

        let state = self.connectivity.current_state();
        let result = self.router.submit_text_query(question, state).await;
        let content = self.render(result, GENERIC_QUERY_ERROR);
        self.view.show_response(Panel::Query, &content);
        Some(content)
    }

    /// Stage an image for diagnosis. Files that are not images are refused
    /// and leave the current selection untouched.
    pub fn select_file(&mut self, file: ImageUpload) -> bool {
        if !file.is_image() {
            self.view.alert(NOT_AN_IMAGE_MESSAGE);
            return false;
        }

        tracing::debug!(file_name = %file.file_name, mime_type = %file.mime_type, "image selected");
        self.selected_file = Some(file);
        self.view.set_submit_image_enabled(true);
        true
    }

    pub fn remove_file(&mut self) {
        self.selected_file = None;
        self.view.set_submit_image_enabled(false);
        self.view.hide_response(Panel::Image);
    }

    /// Submit the staged image. The selection is cleared once an answer
    /// arrives.
    pub async fn submit_image(&mut self) -> Option<ResponseContent> {
        let Some(file) = self.selected_file.as_ref() else {
            self.view.alert(NO_IMAGE_SELECTED_MESSAGE);
            return None;
        };

        let content = {
            let _loading = LoadingGuard::new(self.view.as_ref(), &self.loading);
            self.view.hide_response(Panel::Image);

            let state = self.connectivity.current_state();
            let result = self.router.submit_image_query(file, state).await;
            let content = self.render(result, GENERIC_IMAGE_ERROR);
            self.view.show_response(Panel::Image, &content);
            content
        };

        if !content.is_error() {
            self.selected_file = None;
            self.view.set_submit_image_enabled(false);
        }
        Some(content)
    }

    fn render(&self, result: RouterResult<RoutedAnswer>, generic_error: &str) -> ResponseContent {
        match result {
            Ok(answer) => {
                let source = self.source_label(&answer);
                ResponseContent::Answer {
                    answer: answer.response.answer,
                    source,
                }
            }
            Err(error) => {
                tracing::error!(%error, "submission failed");
                let message = match error {
                    RouterError::InvalidInput(message) | RouterError::StatusCode(_, message) => {
                        message
                    }
                    RouterError::Transport(_) => NETWORK_ERROR_MESSAGE.to_string(),
                    RouterError::Invariant(_) => generic_error.to_string(),
                };
                ResponseContent::Error { message }
            }
        }
    }

    fn source_label(&self, answer: &RoutedAnswer) -> String {
        if let Some(source) = answer.response.source.as_deref().filter(|s| !s.is_empty()) {
            return source.to_string();
        }
        if answer.fallback {
            FALLBACK_SOURCE_LABEL.to_string()
        } else {
            self.options.model_label(answer.served_online()).to_string()
        }
    }
}
