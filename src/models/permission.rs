use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse MLflow authorization tier. Ordering matters: `Read < Edit < Manage`,
/// so a level check is a simple comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionLevel {
    Read,
    Edit,
    Manage,
}

impl PermissionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::Read => "READ",
            PermissionLevel::Edit => "EDIT",
            PermissionLevel::Manage => "MANAGE",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "READ" => Ok(PermissionLevel::Read),
            "EDIT" => Ok(PermissionLevel::Edit),
            "MANAGE" => Ok(PermissionLevel::Manage),
            other => Err(AppError::Configuration(format!(
                "Invalid permission level: {} (expected READ, EDIT, or MANAGE)",
                other
            ))),
        }
    }
}
