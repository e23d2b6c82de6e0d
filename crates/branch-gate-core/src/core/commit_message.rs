// crates/branch-gate-core/src/core/commit_message.rs
// ============================================================================
// Module: Commit Message Validation
// Description: Conventional `type: description` commit subject checks.
// Purpose: Extract commit messages from arguments and validate their format.
// Dependencies: crate::core::policy, serde
// ============================================================================

//! ## Overview
//! Commit messages are validated against the `type: description` form where
//! `type` is one of the policy's allowed commit types. Only the subject line
//! (text before the first newline) is checked. Scoped forms such as
//! `feat(api): ...` are rejected because the token before the colon must be
//! an allowed type verbatim.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::policy::PolicyConfig;

// ============================================================================
// SECTION: Check Outcome
// ============================================================================

/// Outcome of a commit-message format check.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommitMessageCheck {
    /// Message matches the required format.
    Valid {
        /// Commit type token.
        kind: String,
    },
    /// Subject has no `:` separator.
    MissingSeparator,
    /// Type token is not in the allowed set.
    UnknownType {
        /// Rejected type token.
        kind: String,
    },
    /// No whitespace follows the colon.
    MissingSpace,
    /// Description after the colon is empty.
    EmptyDescription,
}

impl CommitMessageCheck {
    /// Returns true when the message passed validation.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Returns a short explanation for a failed check.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Valid {
                kind,
            } => format!("commit message uses type {kind}"),
            Self::MissingSeparator => {
                "commit message must follow 'type: description'".to_string()
            }
            Self::UnknownType {
                kind,
            } => format!("commit type '{kind}' is not allowed"),
            Self::MissingSpace => "commit message needs a space after the colon".to_string(),
            Self::EmptyDescription => "commit message description is empty".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates a commit message against the policy's commit types.
#[must_use]
pub fn validate_commit_message(message: &str, policy: &PolicyConfig) -> CommitMessageCheck {
    let subject = message.lines().next().unwrap_or_default();
    let Some((kind, rest)) = subject.split_once(':') else {
        return CommitMessageCheck::MissingSeparator;
    };
    if !policy.allows_commit_type(kind) {
        return CommitMessageCheck::UnknownType {
            kind: kind.to_string(),
        };
    }
    if !rest.starts_with(char::is_whitespace) {
        return CommitMessageCheck::MissingSpace;
    }
    if rest.trim().is_empty() {
        return CommitMessageCheck::EmptyDescription;
    }
    CommitMessageCheck::Valid {
        kind: kind.to_string(),
    }
}

/// Extracts the commit message from `git commit` arguments.
///
/// Recognizes `-m <msg>`, `--message <msg>`, `--message=<msg>`, and `-m<msg>`.
/// The first message flag wins. A trailing flag without a value yields `None`.
#[must_use]
pub fn extract_commit_message(args: &[String]) -> Option<&str> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-m" | "--message" => return iter.next().map(String::as_str),
            other => {
                if let Some(value) = other.strip_prefix("--message=") {
                    return Some(value);
                }
                if let Some(value) = other.strip_prefix("-m")
                    && !value.is_empty()
                {
                    return Some(value);
                }
            }
        }
    }
    None
}
