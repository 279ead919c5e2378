// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Tree navigation: current entry, parent entry, previous same-type
//! sibling.
//!
//! Every lookup reads the store freshly and nothing is cached. The
//! tree can be reordered by a prior step of the same transition or by an
//! unrelated concurrent edit, so a stale sibling list would corrupt the
//! mutation that follows.

use crate::entry::EntryRef;
use crate::services::{EditStore, ServiceResult};

/// A resolved view of one entry: the entry, the field of interest on it,
/// and its component type name. Recomputed on demand, never stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavContext {
    pub entry: EntryRef,
    pub field: String,
    pub component: String,
}

/// The context for the entry currently being edited.
pub fn current(entry: &EntryRef, field: &str) -> NavContext {
    NavContext {
        entry: entry.clone(),
        component: entry.component_name().to_owned(),
        field: field.to_owned(),
    }
}

/// Resolve the parent context of an entry via its back-reference: the
/// nearest ancestor that is itself a tracked entry, and the list field of
/// it that holds this entry. `None` for the root.
pub fn parent_of(
    store: &impl EditStore,
    entry: &EntryRef,
) -> ServiceResult<Option<NavContext>> {
    let data = store.get_entry_data(entry)?;
    Ok(data.parent.map(|(parent, field)| NavContext {
        component: parent.component_name().to_owned(),
        entry: parent,
        field,
    }))
}

/// Find the nearest preceding sibling with the same component type as
/// `current`, scanning the parent's authoritative list backward from
/// `current`'s position. `None` when `current` is first, absent from the
/// list, or has no same-type predecessor.
pub fn previous_same_type(
    store: &impl EditStore,
    current: &NavContext,
    parent: &NavContext,
) -> ServiceResult<Option<EntryRef>> {
    let parent_data = store.get_entry_data(&parent.entry)?;
    let Some(siblings) = parent_data.children(&parent.field) else {
        return Ok(None);
    };
    let Some(index) = siblings.iter().position(|s| s == &current.entry)
    else {
        return Ok(None);
    };
    Ok(siblings[..index]
        .iter()
        .rfind(|s| s.component_name() == current.component)
        .cloned())
}
