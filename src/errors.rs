use thiserror::Error;

/// Errors talking to the catalog API
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    /// Could not reach the server at all (DNS, TCP, TLS)
    #[error("Connection failed to {0}: {1}")]
    Connection(String, String),

    /// Request did not finish in time
    #[error("Request to {0} timed out after {1}s")]
    Timeout(String, u64),

    /// Server answered with a non-success status
    #[error("Server returned {0}: {1}")]
    ServerError(u16, String),

    /// Body was not the JSON shape we expect
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Title slug does not exist in the catalog
    #[error("Title not found: {0}")]
    NotFound(String),

    #[error("Error: {0}")]
    Generic(String),
}

impl CatalogError {
    /// Map a reqwest failure onto the closest catalog error
    pub fn from_reqwest(url: &str, timeout_secs: u64, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::Timeout(url.to_string(), timeout_secs)
        } else if err.is_decode() {
            CatalogError::ParseError(err.to_string())
        } else if let Some(status) = err.status() {
            CatalogError::ServerError(status.as_u16(), err.to_string())
        } else if err.is_connect() || err.is_request() {
            CatalogError::Connection(url.to_string(), err.to_string())
        } else {
            CatalogError::Generic(err.to_string())
        }
    }

    /// Short hint shown next to the error toast
    pub fn suggestion(&self) -> &'static str {
        match self {
            CatalogError::Connection(..) => "Check your internet connection or the API base URL.",
            CatalogError::Timeout(..) => "The catalog is slow right now. Try again in a moment.",
            CatalogError::ServerError(status, _) if *status >= 500 => {
                "The catalog is having problems. Try again later."
            }
            CatalogError::ServerError(..) => "The request was rejected by the catalog.",
            CatalogError::ParseError(_) => "The catalog response changed shape. Update the app.",
            CatalogError::NotFound(_) => "The title may have been removed.",
            CatalogError::Generic(_) => "Try again.",
        }
    }

    /// One-line message for toasts
    pub fn user_message(&self) -> String {
        format!("{} {}", self, self.suggestion())
    }

    /// Whether retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::Connection(..) | CatalogError::Timeout(..) => true,
            CatalogError::ServerError(status, _) => *status >= 500,
            _ => false,
        }
    }
}

/// Stages shown in the loading popup
#[derive(Debug, Clone, PartialEq)]
pub enum LoadingStage {
    Home,
    Listing { title: String },
    Details { slug: String },
    StartingPlayer { episode: String },
}

impl LoadingStage {
    pub fn display_name(&self) -> String {
        match self {
            LoadingStage::Home => "Đang tải trang chủ".to_string(),
            LoadingStage::Listing { title } => format!("Đang tải {}", title),
            LoadingStage::Details { slug } => format!("Đang tải phim {}", slug),
            LoadingStage::StartingPlayer { episode } => format!("Đang mở {}", episode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CatalogError::Timeout("u".into(), 10).is_transient());
        assert!(CatalogError::ServerError(502, "bad gateway".into()).is_transient());
        assert!(!CatalogError::ServerError(404, "nope".into()).is_transient());
        assert!(!CatalogError::NotFound("x".into()).is_transient());
    }

    #[test]
    fn test_user_message_includes_suggestion() {
        let err = CatalogError::NotFound("phim-a".into());
        let msg = err.user_message();
        assert!(msg.contains("phim-a"));
        assert!(msg.contains("removed"));
    }
}
