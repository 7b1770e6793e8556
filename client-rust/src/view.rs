use crate::{ConnectivityState, Panel, ResponseContent};
use std::sync::{Mutex, PoisonError};

/// The presentation surface a [`crate::Session`] drives.
pub trait View: Send + Sync {
    fn set_loading(&self, visible: bool);
    fn show_response(&self, panel: Panel, content: &ResponseContent);
    fn hide_response(&self, panel: Panel);
    /// A blocking notice for input the session refused to submit.
    fn alert(&self, message: &str);
    fn set_submit_image_enabled(&self, enabled: bool);
    fn set_status(&self, state: ConnectivityState, model_label: &str);
}

/// Number of submissions currently holding the loading indicator.
#[derive(Debug, Default)]
pub struct LoadingCounter {
    active: Mutex<usize>,
}

impl LoadingCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn active(&self) -> usize {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Shows the loading indicator for as long as it is alive. The indicator is
/// hidden only when the last guard sharing `counter` is dropped.
#[must_use = "the loading indicator is hidden as soon as the guard is dropped"]
pub struct LoadingGuard<'a> {
    view: &'a dyn View,
    counter: &'a LoadingCounter,
}

impl<'a> LoadingGuard<'a> {
    pub fn new(view: &'a dyn View, counter: &'a LoadingCounter) -> Self {
        let mut active = counter.active.lock().unwrap_or_else(PoisonError::into_inner);
        if *active == 0 {
            view.set_loading(true);
        }
        *active += 1;
        drop(active);
        Self { view, counter }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut active = self
            .counter
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *active = active.saturating_sub(1);
        if *active == 0 {
            self.view.set_loading(false);
        }
    }
}
