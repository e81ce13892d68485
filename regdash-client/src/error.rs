use regdash_core::DashError;
use thiserror::Error;

/// Errors raised while talking to the REST backend
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid base URL '{url}': {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Base URL '{0}' cannot carry path segments")]
    CannotBeBase(String),

    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("Failed to reach {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ClientError> for DashError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http { status, url, body } => DashError::Http { status, url, body },
            other => DashError::transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_errors_keep_their_status() {
        let err = ClientError::Http {
            status: 404,
            url: "http://localhost:3000/api/agentes/9".into(),
            body: "not found".into(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(matches!(DashError::from(err), DashError::Http { status: 404, .. }));
    }

    #[test]
    fn everything_else_is_transport() {
        let err = ClientError::CannotBeBase("mailto:x@y.z".into());
        assert_eq!(err.status(), None);
        let dash = DashError::from(err);
        assert!(dash.is_remote());
        assert!(matches!(dash, DashError::Transport { .. }));
    }
}
