// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The mutation orchestrator.
//!
//! [`EditorCore`] exposes one entry point per user action: delete at the
//! start of a field, enter mid-text or at the end, and paste. Each
//! transition either completes fully, tree mutation plus focus transfer,
//! or surfaces a failure; collaborator errors propagate unchanged and
//! nothing is retried or rolled back here. The caller guarantees at most
//! one in-flight mutation per field.

mod paste;

use std::collections::BTreeMap;

use log::debug;

use crate::error::{EditError, RuleError};
use crate::nav;
use crate::rules::{collapse_nbsp, compile_rules, CompiledRule, PasteRule};
use crate::services::{
    CaretPlacement, EditStore, FocusService, FocusTarget, RenderService,
};
use crate::text_run::RunSequence;
use crate::EntryRef;

pub use paste::PasteOutcome;

/// Collapsed or ranged caret position, in plain-text characters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Caret {
    pub start: usize,
    pub end: usize,
}

impl Caret {
    pub fn collapsed(offset: usize) -> Self {
        Self { start: offset, end: offset }
    }

    fn at_field_start(&self) -> bool {
        self.start == 0 && self.end == 0
    }
}

/// The live state of the field an action happened in: which entry and
/// field, the unsaved markup currently in the widget, and the caret.
#[derive(Clone, Debug)]
pub struct FieldHandle {
    pub entry: EntryRef,
    pub field: String,
    pub content: String,
    pub caret: Caret,
}

/// What a delete-at-start transition did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Caret was not at the start, or there was no previous same-type
    /// sibling to merge into.
    NoOp,
    /// Current entry's content was appended to this sibling and the
    /// current entry removed.
    MergedInto(EntryRef),
}

/// What an enter-key transition did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The entry has no parent list to insert into.
    NoOp,
    /// A new empty entry was created after the current one.
    Created(EntryRef),
    /// The field was split at the caret; the new entry holds the tail.
    SplitInto(EntryRef),
}

/// One configured editor instance: the compiled paste-rule chain.
#[derive(Clone, Debug)]
pub struct EditorCore {
    rules: Vec<CompiledRule>,
}

impl EditorCore {
    /// Compile the paste rules for this field. Fails fast on an invalid
    /// pattern; a broken configuration must abort editor setup.
    pub fn new(rules: &[PasteRule]) -> Result<Self, RuleError> {
        Ok(Self { rules: compile_rules(rules)? })
    }

    /// Delete pressed with a collapsed caret at offset 0: merge the
    /// current entry into the nearest preceding same-type sibling.
    ///
    /// The sibling's authoritative data is refetched, the two field
    /// contents concatenated and renormalized through the run model (so
    /// adjoining identical styles merge), then the current entry is
    /// removed and focus lands exactly before the appended text.
    pub fn handle_delete_at_start<S, R, F>(
        &self,
        store: &mut S,
        render: &mut R,
        focus: &mut F,
        handle: &FieldHandle,
    ) -> Result<DeleteOutcome, EditError>
    where
        S: EditStore,
        R: RenderService,
        F: FocusService,
    {
        if !handle.caret.at_field_start() {
            return Ok(DeleteOutcome::NoOp);
        }
        debug!("delete-at-start in {}", handle.entry);

        let current = nav::current(&handle.entry, &handle.field);
        let Some(parent) = nav::parent_of(store, &handle.entry)? else {
            return Ok(DeleteOutcome::NoOp);
        };
        let Some(prev) = nav::previous_same_type(store, &current, &parent)?
        else {
            return Ok(DeleteOutcome::NoOp);
        };

        // fresh data for the sibling; the widget's copy may be stale
        let prev_data = store.get_entry_data(&prev)?;
        let prev_markup = prev_data.markup(&handle.field).unwrap_or_default();
        let caret_offset = RunSequence::parse(prev_markup).text_len();

        let merged = format!("{prev_markup}{}", handle.content);
        let normalized = RunSequence::parse(&merged).serialize();
        store.save_field(&prev, &handle.field, &normalized)?;
        store.remove_from_parent_list(
            &handle.entry,
            &parent.field,
            &parent.entry,
        )?;
        render.reload_entry(&prev)?;
        focus.focus(FocusTarget {
            entry: prev.clone(),
            path: handle.field.clone(),
            caret: CaretPlacement::Offset(caret_offset),
        })?;
        Ok(DeleteOutcome::MergedInto(prev))
    }

    /// Enter pressed: split the field at the caret, or create a new empty
    /// entry after the current one when the caret is at the end.
    pub fn handle_create_or_split<S, R, F>(
        &self,
        store: &mut S,
        render: &mut R,
        focus: &mut F,
        handle: &FieldHandle,
    ) -> Result<CreateOutcome, EditError>
    where
        S: EditStore,
        R: RenderService,
        F: FocusService,
    {
        let runs = RunSequence::parse(&collapse_nbsp(&handle.content));
        if handle.caret.start < runs.text_len() {
            debug!("splitting {} at {}", handle.entry, handle.caret.start);
            let (before, after) = runs.split(handle.caret.start);
            store.save_field(
                &handle.entry,
                &handle.field,
                &before.serialize(),
            )?;
            match self.add_after(
                store,
                render,
                focus,
                handle,
                Some(after.serialize()),
            )? {
                Some(entry) => Ok(CreateOutcome::SplitInto(entry)),
                None => Ok(CreateOutcome::NoOp),
            }
        } else {
            debug!("creating after {}", handle.entry);
            match self.add_after(store, render, focus, handle, None)? {
                Some(entry) => Ok(CreateOutcome::Created(entry)),
                None => Ok(CreateOutcome::NoOp),
            }
        }
    }

    /// Create a same-type entry directly after the current one, seeded
    /// with `seed` markup in the same field, and focus it. `None` when the
    /// current entry has no parent list.
    fn add_after<S, R, F>(
        &self,
        store: &mut S,
        render: &mut R,
        focus: &mut F,
        handle: &FieldHandle,
        seed: Option<String>,
    ) -> Result<Option<EntryRef>, EditError>
    where
        S: EditStore,
        R: RenderService,
        F: FocusService,
    {
        let Some(parent) = nav::parent_of(store, &handle.entry)? else {
            return Ok(None);
        };
        let mut data = BTreeMap::new();
        if let Some(markup) = seed {
            data.insert(handle.field.clone(), markup);
        }
        let created =
            store.create_entry(handle.entry.component_name(), data)?;
        store.add_to_parent_list(
            &created,
            Some(&handle.entry),
            &parent.field,
            &parent.entry,
        )?;
        render.attach_handlers(&created)?;
        focus.focus(FocusTarget {
            entry: created.clone(),
            path: handle.field.clone(),
            caret: CaretPlacement::Start,
        })?;
        Ok(Some(created))
    }
}
