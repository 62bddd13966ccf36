//! WebSocket wire protocol between a Sticky Wall client and its backend.
//!
//! Every frame is one postcard-encoded message in a binary WebSocket frame.
//! Requests carry a client-chosen `request_id` echoed in the response;
//! live queries carry a client-chosen `subscription_id` stamped on every
//! snapshot pushed for them.

use serde::{Deserialize, Serialize};

use crate::task::{NewTask, Task, TaskId, TaskPatch};

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Messages sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Register a new account and sign it in.
    CreateAccount {
        /// Correlates the response.
        request_id: u64,
        /// Account email.
        email: String,
        /// Account password.
        password: String,
    },
    /// Sign in to an existing account.
    SignIn {
        /// Correlates the response.
        request_id: u64,
        /// Account email.
        email: String,
        /// Account password.
        password: String,
    },
    /// Start a live query over a whole collection.
    Subscribe {
        /// Identifier stamped on every snapshot for this query.
        subscription_id: u64,
        /// Collection name.
        collection: String,
    },
    /// Stop a live query.
    Unsubscribe {
        /// The query to stop.
        subscription_id: u64,
    },
    /// Insert a document; the server assigns its id.
    Create {
        /// Correlates the response.
        request_id: u64,
        /// Collection name.
        collection: String,
        /// Document fields.
        task: NewTask,
    },
    /// Partially update a document.
    Update {
        /// Correlates the response.
        request_id: u64,
        /// Collection name.
        collection: String,
        /// Target document.
        id: TaskId,
        /// Fields to replace.
        patch: TaskPatch,
    },
    /// Remove a document.
    Delete {
        /// Correlates the response.
        request_id: u64,
        /// Collection name.
        collection: String,
        /// Target document.
        id: TaskId,
    },
}

/// Why the server refused a document request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreFailure {
    /// The addressed document does not exist.
    NotFound,
    /// The request was malformed or violated a store rule.
    Rejected(String),
}

/// Messages sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Sign-in or registration succeeded.
    Authenticated {
        /// Echo of the request.
        request_id: u64,
        /// Stable account identifier.
        user_id: String,
        /// Account email as stored.
        email: String,
    },
    /// Sign-in or registration failed with an identity error code.
    AuthFailed {
        /// Echo of the request.
        request_id: u64,
        /// Wire form of the error code, e.g. `auth/weak-password`.
        code: String,
    },
    /// Full contents of a subscribed collection.
    Snapshot {
        /// The live query this snapshot belongs to.
        subscription_id: u64,
        /// Every document in the collection.
        tasks: Vec<Task>,
    },
    /// A live query could not be established.
    SubscriptionFailed {
        /// The failed query.
        subscription_id: u64,
        /// Human-readable reason.
        reason: String,
    },
    /// A document was created.
    Created {
        /// Echo of the request.
        request_id: u64,
        /// Id assigned by the server.
        id: TaskId,
    },
    /// An update or delete was applied.
    Applied {
        /// Echo of the request.
        request_id: u64,
    },
    /// A document request failed.
    Failed {
        /// Echo of the request.
        request_id: u64,
        /// Failure category.
        failure: StoreFailure,
    },
}

impl ServerMessage {
    /// The request this message answers, if it answers one.
    #[must_use]
    pub const fn request_id(&self) -> Option<u64> {
        match self {
            Self::Authenticated { request_id, .. }
            | Self::AuthFailed { request_id, .. }
            | Self::Created { request_id, .. }
            | Self::Applied { request_id }
            | Self::Failed { request_id, .. } => Some(*request_id),
            Self::Snapshot { .. } | Self::SubscriptionFailed { .. } => None,
        }
    }
}

/// Encodes a [`ClientMessage`] using postcard.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the message cannot be serialized.
pub fn encode_client(msg: &ClientMessage) -> Result<Vec<u8>, CodecError> {
    postcard::to_allocvec(msg).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Decodes a [`ClientMessage`] from a byte slice.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the bytes are not a valid message.
pub fn decode_client(bytes: &[u8]) -> Result<ClientMessage, CodecError> {
    postcard::from_bytes(bytes).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Encodes a [`ServerMessage`] using postcard.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the message cannot be serialized.
pub fn encode_server(msg: &ServerMessage) -> Result<Vec<u8>, CodecError> {
    postcard::to_allocvec(msg).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Decodes a [`ServerMessage`] from a byte slice.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the bytes are not a valid message.
pub fn decode_server(bytes: &[u8]) -> Result<ServerMessage, CodecError> {
    postcard::from_bytes(bytes).map_err(|e| CodecError::Serialization(e.to_string()))
}
