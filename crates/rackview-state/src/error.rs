use rackview_infra::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Validation(String),

    #[error("not connected")]
    NotConnected,

    /// A disconnect or another connect landed while this connect was fetching.
    #[error("connection changed while connecting")]
    Superseded,

    #[error("failed to persist state: {0}")]
    Persistence(#[from] rackview_store::Error),
}

impl ControllerError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::Fetch(FetchError::SessionExpired))
    }
}

pub type Result<T> = std::result::Result<T, ControllerError>;
