use nanban_client::{
    ConnectivityState, FixedGeolocator, Geolocator, Location, Panel, ResponseContent,
    UnavailableGeolocator, View,
};
use std::sync::Arc;

/// Prints everything the session renders to the terminal.
pub struct TerminalView;

impl View for TerminalView {
    fn set_loading(&self, visible: bool) {
        if visible {
            eprintln!("... waiting for the backend");
        }
    }

    fn show_response(&self, panel: Panel, content: &ResponseContent) {
        match content {
            ResponseContent::Answer { answer, source } => {
                println!("[{panel:?}] AI Response ({source})\n{answer}");
            }
            ResponseContent::Error { message } => {
                println!("[{panel:?}] error: {message}");
            }
        }
    }

    fn hide_response(&self, _panel: Panel) {}

    fn alert(&self, message: &str) {
        eprintln!("! {message}");
    }

    fn set_submit_image_enabled(&self, _enabled: bool) {}

    fn set_status(&self, state: ConnectivityState, model_label: &str) {
        eprintln!("status: {state} - using {model_label}");
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("nanban_client=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// `NANBAN_LATITUDE` / `NANBAN_LONGITUDE` stand in for the device location.
pub fn geolocator_from_env() -> Arc<dyn Geolocator> {
    let coordinate = |key: &str| std::env::var(key).ok()?.parse::<f64>().ok();
    match (coordinate("NANBAN_LATITUDE"), coordinate("NANBAN_LONGITUDE")) {
        (Some(latitude), Some(longitude)) => {
            Arc::new(FixedGeolocator::new(Location::new(latitude, longitude)))
        }
        _ => Arc::new(UnavailableGeolocator),
    }
}
