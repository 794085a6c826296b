//! Execution values
//!
//! A fixed set of names computed from the processing position instead of
//! being read from storage. When a position is supplied they win over every
//! registered value of the same name.
//!
//! Only the exact names below are recognized; vendor-prefixed spellings such
//! as `ACME_EXECUTION_CHANGESET_ID` are ordinary keys.

use crate::position::ChangelogPosition;
use crate::value::{keys_equal, ParameterValue};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Synthesized parameter names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExecutionValue {
    /// Deployment id of the run
    DeploymentId,

    /// File path of the current changelog
    ChangelogFile,

    /// `id` of the changeset being parsed
    ChangesetId,

    /// `author` of the changeset being parsed
    ChangesetAuthor,
}

type Compute = fn(&dyn ChangelogPosition, &str) -> Option<String>;

static TABLE: [(ExecutionValue, &str, Compute); 4] = [
    (ExecutionValue::DeploymentId, "EXECUTION_DEPLOYMENT_ID", deployment_id),
    (ExecutionValue::ChangelogFile, "EXECUTION_CHANGELOG_FILE", changelog_file),
    (ExecutionValue::ChangesetId, "EXECUTION_CHANGESET_ID", changeset_id),
    (ExecutionValue::ChangesetAuthor, "EXECUTION_CHANGESET_AUTHOR", changeset_author),
];

fn deployment_id(_: &dyn ChangelogPosition, deployment_id: &str) -> Option<String> {
    Some(deployment_id.to_string())
}

fn changelog_file(position: &dyn ChangelogPosition, _: &str) -> Option<String> {
    Some(position.file_path().to_string())
}

fn changeset_id(position: &dyn ChangelogPosition, _: &str) -> Option<String> {
    position
        .current_changeset()
        .and_then(|cs| cs.id.map(str::to_string))
}

fn changeset_author(position: &dyn ChangelogPosition, _: &str) -> Option<String> {
    position
        .current_changeset()
        .and_then(|cs| cs.author.map(str::to_string))
}

impl ExecutionValue {
    /// Every execution value, in lookup order
    pub const ALL: [Self; 4] = [
        Self::DeploymentId,
        Self::ChangelogFile,
        Self::ChangesetId,
        Self::ChangesetAuthor,
    ];

    fn entry(self) -> &'static (ExecutionValue, &'static str, Compute) {
        // TABLE is ordered like the enum
        &TABLE[self as usize]
    }

    /// Parameter name
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        self.entry().1
    }

    /// Look up by name (case-insensitive)
    #[must_use]
    pub fn find_by_name(name: &str) -> Option<Self> {
        TABLE
            .iter()
            .find(|(_, n, _)| keys_equal(n, name))
            .map(|(v, _, _)| *v)
    }

    /// Compute for a position
    ///
    /// `None` when no changeset is active for the id or author.
    #[must_use]
    pub fn compute(self, position: &dyn ChangelogPosition, deployment_id: &str) -> Option<ParameterValue> {
        (self.entry().2)(position, deployment_id).map(ParameterValue::String)
    }
}

impl Display for ExecutionValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
