use thiserror::Error;

/// Errors from the CodeDrop API client.
#[derive(Debug, Error)]
pub enum Error {
    /// The client could not be configured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request never reached the server, or the connection dropped.
    #[error("network error: {0}")]
    Connection(String),

    /// The server answered but the body did not parse.
    #[error("failed to decode response: {0}")]
    Deserialization(String),

    /// The drop is no longer available (expired or budget exhausted).
    #[error("{0}")]
    Gone(String),

    /// Any other non-success response, with the server's plain-text body.
    #[error("server error ({status}): {message}")]
    Api { status: u16, message: String },
}
