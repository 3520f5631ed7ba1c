//! Git LFS Batch API wire types and request validation.
//!
//! See <https://github.com/git-lfs/git-lfs/blob/main/docs/api/batch.md>.

use crate::oid::{Oid, validate_oid};
use crate::{BASIC_TRANSFER, MAX_BATCH_OBJECTS, SUPPORTED_HASH_ALGO};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Batch operation requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Upload,
    Download,
}

impl Operation {
    /// Parse an operation string. Only the exact lowercase names are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "upload" => Some(Self::Upload),
            "download" => Some(Self::Download),
            _ => None,
        }
    }

    /// Get the wire name of this operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `ref` property of a batch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefSpec {
    pub name: String,
}

/// A batch request as received on the wire.
///
/// `operation` and the object OIDs are kept as raw strings so that
/// validation can report them with the right status instead of failing
/// deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub operation: String,
    #[serde(default)]
    pub objects: Vec<ObjectRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfers: Option<Vec<String>>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<RefSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_algo: Option<String>,
}

/// An object in a batch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRequest {
    pub oid: String,
    pub size: u64,
}

/// A batch request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBatch {
    pub operation: Operation,
    pub objects: Vec<ValidatedObject>,
}

/// An object whose OID has been validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedObject {
    pub oid: Oid,
    pub size: u64,
}

impl BatchRequest {
    /// Parse a request body.
    pub fn from_slice(body: &[u8]) -> crate::Result<Self> {
        serde_json::from_slice(body).map_err(|e| {
            crate::Error::UnprocessableBatch(format!("malformed batch request: {e}"))
        })
    }

    /// Validate the request.
    ///
    /// Checks run in a fixed order and the first failure wins:
    /// 1. unknown operation (422)
    /// 2. unsupported `hash_algo` (409)
    /// 3. empty `objects` (422)
    /// 4. more than [`MAX_BATCH_OBJECTS`] objects (413)
    /// 5. malformed OID (422)
    ///
    /// The count is checked before any OID so an oversize batch is rejected
    /// without scanning it.
    pub fn validate(self) -> crate::Result<ValidatedBatch> {
        let operation = Operation::parse(&self.operation).ok_or_else(|| {
            crate::Error::UnprocessableBatch(format!(
                "unsupported operation: {:?} (expected \"upload\" or \"download\")",
                self.operation
            ))
        })?;

        if let Some(algo) = self.hash_algo.as_deref().filter(|a| *a != SUPPORTED_HASH_ALGO) {
            return Err(crate::Error::UnsupportedHashAlgorithm(algo.to_string()));
        }

        if self.objects.is_empty() {
            return Err(crate::Error::UnprocessableBatch(
                "objects must not be empty".to_string(),
            ));
        }

        if self.objects.len() > MAX_BATCH_OBJECTS {
            return Err(crate::Error::PayloadTooLarge {
                count: self.objects.len(),
                max: MAX_BATCH_OBJECTS,
            });
        }

        let objects = self
            .objects
            .into_iter()
            .enumerate()
            .map(|(i, object)| {
                validate_oid(&object.oid).map_err(|e| {
                    crate::Error::UnprocessableBatch(format!("objects[{i}]: {e}"))
                })?;
                Ok(ValidatedObject {
                    oid: Oid::parse(object.oid)?,
                    size: object.size,
                })
            })
            .collect::<crate::Result<Vec<_>>>()?;

        Ok(ValidatedBatch { operation, objects })
    }
}

/// A successful batch response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub transfer: String,
    pub objects: Vec<ObjectResult>,
    pub hash_algo: String,
}

impl BatchResponse {
    /// Build a response using the basic transfer adapter.
    pub fn basic(objects: Vec<ObjectResult>) -> Self {
        Self {
            transfer: BASIC_TRANSFER.to_string(),
            objects,
            hash_algo: SUPPORTED_HASH_ALGO.to_string(),
        }
    }
}

/// Per-object result in a batch response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectResult {
    pub oid: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Actions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ObjectError>,
}

impl ObjectResult {
    /// An object with a transfer action for `operation`.
    pub fn with_action(object: &ValidatedObject, operation: Operation, action: Action) -> Self {
        let actions = match operation {
            Operation::Upload => Actions {
                upload: Some(action),
                download: None,
            },
            Operation::Download => Actions {
                upload: None,
                download: Some(action),
            },
        };
        Self {
            oid: object.oid.to_string(),
            size: object.size,
            authenticated: Some(true),
            actions: Some(actions),
            error: None,
        }
    }

    /// An upload the server already holds; the client has nothing to send.
    pub fn already_present(object: &ValidatedObject) -> Self {
        Self {
            oid: object.oid.to_string(),
            size: object.size,
            authenticated: Some(true),
            actions: None,
            error: None,
        }
    }

    /// An object that could not be serviced.
    pub fn error(object: &ValidatedObject, code: u16, message: impl Into<String>) -> Self {
        Self {
            oid: object.oid.to_string(),
            size: object.size,
            authenticated: None,
            actions: None,
            error: Some(ObjectError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Transfer actions for an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download: Option<Action>,
}

/// A single transfer action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub href: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub header: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

/// Per-object error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectError {
    pub code: u16,
    pub message: String,
}
