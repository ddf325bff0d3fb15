//! Confirmation request and response records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use skein_core::{ScriptId, Timestamp};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a confirmation prompt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Create a new random request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "confirm:{}", self.0)
    }
}

/// The user's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Proceed.
    Allow,
    /// Refuse.
    Deny,
    /// Refuse this time, prompt again next time.
    AskAgain,
}

impl Decision {
    /// Whether the call may proceed.
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::AskAgain => "ask_again",
        })
    }
}

/// How long a decision is remembered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmScope {
    /// This call only.
    Once,
    /// Until the cache is cleared or the broker's session TTL lapses.
    #[default]
    Session,
    /// Until the given time.
    Until(Timestamp),
}

/// Cache and coalescing key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfirmKey {
    /// Requesting script.
    pub script_id: ScriptId,
    /// Capability (grant) name.
    pub capability: String,
    /// Resource the call targets, e.g. a host name.
    pub resource_key: String,
}

impl ConfirmKey {
    /// Create a key.
    #[must_use]
    pub fn new(
        script_id: ScriptId,
        capability: impl Into<String>,
        resource_key: impl Into<String>,
    ) -> Self {
        Self {
            script_id,
            capability: capability.into(),
            resource_key: resource_key.into(),
        }
    }
}

impl fmt::Display for ConfirmKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.script_id, self.capability, self.resource_key)
    }
}

/// Sent to the privileged surface that prompts the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmRequest {
    /// Correlates the response.
    pub id: RequestId,
    /// Requesting script.
    pub script_id: ScriptId,
    /// Capability name.
    pub capability: String,
    /// Resource the call targets.
    pub resource_key: String,
    /// Free-form context for the prompt.
    #[serde(default)]
    pub detail: Value,
    /// When the prompt was issued.
    pub created_at: Timestamp,
}

impl ConfirmRequest {
    pub(crate) fn new(id: RequestId, key: &ConfirmKey, detail: Value) -> Self {
        Self {
            id,
            script_id: key.script_id,
            capability: key.capability.clone(),
            resource_key: key.resource_key.clone(),
            detail,
            created_at: Timestamp::now(),
        }
    }

    /// The cache key this request is for.
    #[must_use]
    pub fn key(&self) -> ConfirmKey {
        ConfirmKey::new(self.script_id, &self.capability, &self.resource_key)
    }

    /// Build the response answering this request.
    #[must_use]
    pub fn respond(&self, decision: Decision, scope: ConfirmScope) -> ConfirmResponse {
        ConfirmResponse {
            id: self.id.clone(),
            decision,
            scope,
        }
    }
}

/// The privileged surface's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmResponse {
    /// The request being answered.
    pub id: RequestId,
    /// The user's decision.
    pub decision: Decision,
    /// How long to remember it.
    #[serde(default)]
    pub scope: ConfirmScope,
}
