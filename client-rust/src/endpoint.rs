use serde::{Deserialize, Serialize};

pub const TEXT_QUERY_ENDPOINT: &str = "/api/text-query";
pub const OFFLINE_QUERY_ENDPOINT: &str = "/api/offline-query";
pub const IMAGE_DIAGNOSIS_ENDPOINT: &str = "/api/image-diagnosis";
pub const OFFLINE_IMAGE_DIAGNOSIS_ENDPOINT: &str = "/api/offline-image-diagnosis";

/// The logical action a submission performs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Text,
    Image,
}

impl QueryKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

/// Pick the backend route for an action given the observed connectivity.
#[must_use]
pub fn determine_endpoint(kind: QueryKind, is_online: bool) -> &'static str {
    match (kind, is_online) {
        (QueryKind::Text, true) => TEXT_QUERY_ENDPOINT,
        (QueryKind::Text, false) => OFFLINE_QUERY_ENDPOINT,
        (QueryKind::Image, true) => IMAGE_DIAGNOSIS_ENDPOINT,
        (QueryKind::Image, false) => OFFLINE_IMAGE_DIAGNOSIS_ENDPOINT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_routes() {
        assert_eq!(determine_endpoint(QueryKind::Text, true), "/api/text-query");
        assert_eq!(
            determine_endpoint(QueryKind::Text, false),
            "/api/offline-query"
        );
    }

    #[test]
    fn image_routes() {
        assert_eq!(
            determine_endpoint(QueryKind::Image, true),
            "/api/image-diagnosis"
        );
        assert_eq!(
            determine_endpoint(QueryKind::Image, false),
            "/api/offline-image-diagnosis"
        );
    }
}
