mod connectivity;
mod endpoint;
mod errors;
mod geolocation;
mod keywords;
mod opentelemetry;
mod options;
mod router;
mod session;
mod transport;
mod types;
mod view;

pub use connectivity::{
    ConnectivityMonitor, ConnectivityState, HttpReachabilityProbe, ProbeHandle, ReachabilityProbe,
    Subscription,
};
pub use endpoint::{
    determine_endpoint, QueryKind, IMAGE_DIAGNOSIS_ENDPOINT, OFFLINE_IMAGE_DIAGNOSIS_ENDPOINT,
    OFFLINE_QUERY_ENDPOINT, TEXT_QUERY_ENDPOINT,
};
pub use errors::*;
pub use geolocation::{FixedGeolocator, Geolocator, UnavailableGeolocator};
pub use keywords::{LocationKeywords, DEFAULT_LOCATION_KEYWORDS};
pub use options::*;
pub use router::{
    RoutedAnswer, Router, EMPTY_QUESTION_MESSAGE, GENERIC_IMAGE_ERROR, GENERIC_QUERY_ERROR,
    NOT_AN_IMAGE_MESSAGE,
};
pub use session::{Session, NETWORK_ERROR_MESSAGE, NO_IMAGE_SELECTED_MESSAGE};
pub use transport::{HttpResponse, ReqwestTransport, ReqwestTransportOptions, Transport, IMAGE_FIELD};
pub use types::{ImageUpload, Location, Panel, QueryRequest, QueryResponse, ResponseContent};
pub use view::{LoadingCounter, LoadingGuard, View};
