use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// How a value is applied at its target path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum UpdateMode {
    /// Set the value, or delete the key when no value is given.
    #[default]
    Replace,
    /// Append to the sequence at the path, creating it when absent.
    Add,
    /// Remove the sequence element at the path.
    Remove,
    /// Reposition the sequence element at the path by `{"increment": n}`.
    Move,
}

impl UpdateMode {
    /// Parse a mode string.
    ///
    /// `""`, `"replace"`, `"add"`, `"remove"` and `"move"` are recognised. Any other
    /// string degrades to [`UpdateMode::Replace`].
    pub fn parse(s: &str) -> Self {
        match s {
            "" | "replace" => UpdateMode::Replace,
            "add" => UpdateMode::Add,
            "remove" => UpdateMode::Remove,
            "move" => UpdateMode::Move,
            other => {
                tracing::debug!(mode = other, "unknown update mode, using replace");
                UpdateMode::Replace
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateMode::Replace => "replace",
            UpdateMode::Add => "add",
            UpdateMode::Remove => "remove",
            UpdateMode::Move => "move",
        }
    }
}

impl From<&str> for UpdateMode {
    fn from(s: &str) -> Self {
        UpdateMode::parse(s)
    }
}

impl From<String> for UpdateMode {
    fn from(s: String) -> Self {
        UpdateMode::parse(&s)
    }
}

impl From<Option<&str>> for UpdateMode {
    fn from(s: Option<&str>) -> Self {
        s.map(UpdateMode::parse).unwrap_or_default()
    }
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for UpdateMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
