//! Soft-delete lifecycle shared by categories and resources.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::rusqlite::types::Value;

use crate::Error;

/// Row lifecycle state.
///
/// Rows are created `Active` and "deleted" by moving them to `Inactive`.
/// Nothing is ever physically removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Inactive => "inactive",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Status::Active),
            "inactive" => Ok(Status::Inactive),
            other => Err(Error::InvalidInput(format!("unknown status `{other}` (expected active or inactive)"))),
        }
    }
}

impl From<Status> for Value {
    fn from(status: Status) -> Self {
        Value::Text(status.as_str().to_string())
    }
}
