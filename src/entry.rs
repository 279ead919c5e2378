// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Content entries: the nodes of the persisted document tree.

use std::collections::BTreeMap;
use std::fmt;

/// Opaque, tree-unique reference to one content entry. Stable until the
/// entry is removed.
///
/// References carry their component type in the
/// `.../components/<name>/...` path segment, so the type of a sibling can
/// be read without fetching its data.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryRef(String);

impl EntryRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The component type name encoded in the reference. References
    /// without a `components/` segment name themselves.
    pub fn component_name(&self) -> &str {
        match self.0.split_once("components/") {
            Some((_, rest)) => rest.split(['/', '@']).next().unwrap_or(""),
            None => &self.0,
        }
    }
}

impl fmt::Display for EntryRef {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// One named field slot of an entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    /// Rich-text markup.
    Markup(String),
    /// An ordered list of child entries; order is significant and must be
    /// preserved across insert/remove.
    Children(Vec<EntryRef>),
}

/// The persisted data of one content entry.
///
/// Every entry except the root belongs to exactly one parent list,
/// recorded as a (parent reference, parent field) back-reference.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryData {
    pub parent: Option<(EntryRef, String)>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl EntryData {
    /// The markup of a field, if it is a markup field.
    pub fn markup(&self, field: &str) -> Option<&str> {
        match self.fields.get(field) {
            Some(FieldValue::Markup(markup)) => Some(markup),
            _ => None,
        }
    }

    /// The child list of a field, if it is a list field.
    pub fn children(&self, field: &str) -> Option<&[EntryRef]> {
        match self.fields.get(field) {
            Some(FieldValue::Children(children)) => Some(children),
            _ => None,
        }
    }
}
