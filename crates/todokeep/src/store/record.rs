//! Todo records and partial updates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Opaque id, unique within one identity's list.
    pub id: String,
    /// Trimmed, never empty.
    pub title: String,
    pub completed: bool,
}

/// A partial update to a [`Record`].
///
/// `None` means "leave unchanged"; `Some(false)` is an explicit change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl RecordPatch {
    /// An empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the completion flag.
    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Build a patch from a request body.
    ///
    /// Only keys present in the object are applied. A present `title` is
    /// converted to text (`null` becomes the empty string, which the store
    /// rejects); a present `completed` is coerced with [`truthy`]. Anything
    /// other than an object yields an empty patch.
    pub fn from_json(body: &Value) -> Self {
        let Some(object) = body.as_object() else {
            return Self::default();
        };
        Self {
            title: object.get("title").map(text_of),
            completed: object.get("completed").map(truthy),
        }
    }

    /// `true` if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none()
    }
}

/// JSON truthiness: `false`, `null`, `0`, `NaN` and `""` are false,
/// everything else (including empty arrays and objects) is true.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
