use crate::{GeolocationError, Location};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source of the device location.
#[async_trait::async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self) -> Result<Location, GeolocationError>;
}

/// Always reports the same coordinates.
#[derive(Debug, Default)]
pub struct FixedGeolocator {
    location: Option<Location>,
    requests: AtomicUsize,
}

impl FixedGeolocator {
    #[must_use]
    pub fn new(location: Location) -> Self {
        Self {
            location: Some(location),
            requests: AtomicUsize::new(0),
        }
    }

    /// A geolocator whose every request is denied.
    #[must_use]
    pub fn denied() -> Self {
        Self::default()
    }

    /// Number of times `locate` has been called.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Location, GeolocationError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.location.ok_or(GeolocationError::PermissionDenied)
    }
}

/// Used when the host has no location capability at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableGeolocator;

#[async_trait::async_trait]
impl Geolocator for UnavailableGeolocator {
    async fn locate(&self) -> Result<Location, GeolocationError> {
        Err(GeolocationError::Unavailable(
            "geolocation is not supported on this host".to_string(),
        ))
    }
}
