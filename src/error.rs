// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Error taxonomy.
//!
//! Configuration problems are fatal at setup time; a classification
//! dead-end aborts one paste batch; collaborator failures pass through
//! unchanged. Expected absences (no parent, no previous sibling) are plain
//! `Option` values elsewhere, never errors.

use std::error::Error;
use std::fmt;

use crate::services::ServiceError;

/// Invalid paste-rule configuration; aborts editor setup for the field.
#[derive(Debug)]
pub enum RuleError {
    MissingPattern { component: String },
    InvalidPattern { pattern: String, source: regex::Error },
}

impl fmt::Display for RuleError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPattern { component } => {
                write!(
                    formatter,
                    "paste rule for `{component}` needs a pattern"
                )
            }
            Self::InvalidPattern { pattern, source } => {
                write!(
                    formatter,
                    "paste rule pattern `{pattern}` is not a valid expression: {source}"
                )
            }
        }
    }
}

impl Error for RuleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MissingPattern { .. } => None,
            Self::InvalidPattern { source, .. } => Some(source),
        }
    }
}

/// No rule matched one paragraph unit; the whole paste batch is discarded.
#[derive(Debug)]
pub enum PasteError {
    NoMatchingRule { preview: String },
}

impl fmt::Display for PasteError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatchingRule { preview } => {
                write!(formatter, "no paste rule found for \"{preview}\"")
            }
        }
    }
}

impl Error for PasteError {}

/// A mutation transition failed.
#[derive(Debug)]
pub enum EditError {
    /// Paste classification dead-end; the target field has been cleared.
    Classification(PasteError),
    /// A persistence, render or focus collaborator failed; propagated
    /// unchanged, never retried here.
    Service(ServiceError),
}

impl fmt::Display for EditError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classification(err) => write!(formatter, "{err}"),
            Self::Service(err) => write!(formatter, "{err}"),
        }
    }
}

impl Error for EditError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Classification(err) => Some(err),
            Self::Service(err) => Some(err),
        }
    }
}

impl From<ServiceError> for EditError {
    fn from(err: ServiceError) -> Self {
        Self::Service(err)
    }
}

impl From<PasteError> for EditError {
    fn from(err: PasteError) -> Self {
        Self::Classification(err)
    }
}
