// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Collaborator contracts.
//!
//! The engine never mutates tree state directly; every write goes through
//! an [`EditStore`], which is the system's sole serialization point.
//! Rendering and focus/selection are equally external. Hosts adapt these
//! traits onto their transport and widget layers.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use crate::entry::{EntryData, EntryRef};

/// Opaque collaborator failure. The engine propagates these unchanged:
/// no retry, no backoff, no rollback of already-issued calls.
#[derive(Debug)]
pub struct ServiceError(pub String);

impl fmt::Display for ServiceError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl Error for ServiceError {}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Where a batched insert lands in the parent's list.
///
/// An explicit index wins over an after-reference: callers that know both
/// construct `AtIndex`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertPosition {
    /// Directly after this sibling.
    After(EntryRef),
    /// At this position in the list.
    AtIndex(usize),
    /// At the end of the list.
    End,
}

/// Caret placement inside a focused field, in plain-text characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaretPlacement {
    Start,
    Offset(usize),
    End,
}

/// A focus request: an entry, the field or group path within it, and the
/// caret position to land on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FocusTarget {
    pub entry: EntryRef,
    pub path: String,
    pub caret: CaretPlacement,
}

/// Persistence/edit service over the document tree.
pub trait EditStore {
    /// Fetch an entry's authoritative data.
    fn get_entry_data(&self, entry: &EntryRef) -> ServiceResult<EntryData>;

    /// Fetch an entry's data without any client-side augmentation.
    fn get_entry_data_only(&self, entry: &EntryRef)
        -> ServiceResult<EntryData>;

    /// Create a new entry of `component` type seeded with markup fields;
    /// the store assigns the reference.
    fn create_entry(
        &mut self,
        component: &str,
        data: BTreeMap<String, String>,
    ) -> ServiceResult<EntryRef>;

    /// Replace one markup field of an entry.
    fn save_field(
        &mut self,
        entry: &EntryRef,
        field: &str,
        markup: &str,
    ) -> ServiceResult<()>;

    /// Remove an entry from its parent's list.
    fn remove_from_parent_list(
        &mut self,
        entry: &EntryRef,
        parent_field: &str,
        parent: &EntryRef,
    ) -> ServiceResult<()>;

    /// Insert one entry into a parent list, after `prev` or at the end.
    fn add_to_parent_list(
        &mut self,
        entry: &EntryRef,
        prev: Option<&EntryRef>,
        parent_field: &str,
        parent: &EntryRef,
    ) -> ServiceResult<()>;

    /// Insert several entries into a parent list in the given order, as
    /// one batched operation.
    fn add_multiple_to_parent_list(
        &mut self,
        entries: &[EntryRef],
        position: InsertPosition,
        parent_field: &str,
        parent: &EntryRef,
    ) -> ServiceResult<()>;
}

/// Re-render collaborator.
pub trait RenderService {
    /// Re-render an entry after its data changed.
    fn reload_entry(&mut self, entry: &EntryRef) -> ServiceResult<()>;

    /// Wire up editing handlers on a freshly inserted entry.
    fn attach_handlers(&mut self, entry: &EntryRef) -> ServiceResult<()>;

    /// Clear the visible content of a field; used to discard a
    /// partially-applied paste.
    fn clear_field(
        &mut self,
        entry: &EntryRef,
        field: &str,
    ) -> ServiceResult<()>;
}

/// Focus/selection collaborator.
pub trait FocusService {
    fn focus(&mut self, target: FocusTarget) -> ServiceResult<()>;

    /// Unfocus the active field, saving any in-progress edit.
    fn unfocus(&mut self) -> ServiceResult<()>;
}
