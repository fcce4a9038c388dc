//! Message types for conversation history.

use crate::Role;
use serde::{Deserialize, Serialize};

/// A single turn in a chat history.
///
/// # Examples
///
/// ```
/// use scriptorium_core::{Message, Role};
///
/// let message = Message::user("Write act one.");
/// assert_eq!(*message.role(), Role::User);
/// assert_eq!(message.content(), "Write act one.");
///
/// let built = Message::builder()
///     .role(Role::System)
///     .content("You are a script doctor.")
///     .build()
///     .unwrap();
/// assert_eq!(*built.role(), Role::System);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_builder::Builder,
    derive_getters::Getters,
)]
#[builder(setter(into))]
pub struct Message {
    /// The role of the message sender
    role: Role,
    /// Text content of the message
    content: String,
}

impl Message {
    /// Create a message from a role and text.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Start building a message.
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }
}
