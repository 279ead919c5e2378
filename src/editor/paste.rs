// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The paste transition: decompose, classify, then reshape the tree.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::error::EditError;
use crate::nav::{self, NavContext};
use crate::paragraphs::split_paragraphs;
use crate::rules::{match_components, ComponentDescriptor, DescriptorValue};
use crate::services::{
    CaretPlacement, EditStore, FocusService, FocusTarget, InsertPosition,
    RenderService,
};
use crate::text_run::RunSequence;
use crate::EntryRef;

use super::{EditorCore, FieldHandle};

/// What a paste transition did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PasteOutcome {
    /// Every descriptor was filtered out (or nothing could be inserted);
    /// the tree is unchanged.
    NoOp,
    /// The first descriptor matched the current entry's type: its value
    /// replaced the field in place, the rest became new siblings.
    ReplacedInPlace { inserted: Vec<EntryRef> },
    /// The current entry was removed and all descriptors inserted at its
    /// former list position.
    Reinserted { inserted: Vec<EntryRef> },
}

impl EditorCore {
    /// Decompose pasted markup into component descriptors and reconcile
    /// the tree with them.
    ///
    /// With no rules configured the paste is simply sanitized into the
    /// current field. A classification dead-end clears the field, issues
    /// zero tree mutations and surfaces the error; partially-applied
    /// pastes must not survive.
    pub fn handle_paste<S, R, F>(
        &self,
        store: &mut S,
        render: &mut R,
        focus: &mut F,
        handle: &FieldHandle,
        raw: &str,
    ) -> Result<PasteOutcome, EditError>
    where
        S: EditStore,
        R: RenderService,
        F: FocusService,
    {
        debug!("paste into {} ({} bytes)", handle.entry, raw.len());
        let descriptors = if self.rules.is_empty() {
            // no rules: sanitize the paste into the current entry
            vec![ComponentDescriptor {
                component: handle.entry.component_name().to_owned(),
                field: handle.field.clone(),
                group: None,
                value: DescriptorValue::Runs(RunSequence::parse(raw)),
            }]
        } else {
            match match_components(split_paragraphs(raw), &self.rules) {
                Ok(descriptors) => descriptors,
                Err(err) => {
                    warn!("paste aborted: {err}");
                    render.clear_field(&handle.entry, &handle.field)?;
                    return Err(EditError::Classification(err));
                }
            }
        };
        let Some(first) = descriptors.first() else {
            return Ok(PasteOutcome::NoOp);
        };

        if first.component == handle.entry.component_name() {
            // the first descriptor replaces the current field in place,
            // keeping the caret's relative position
            store.save_field(
                &handle.entry,
                &handle.field,
                &first.value.to_markup(),
            )?;
            focus.focus(FocusTarget {
                entry: handle.entry.clone(),
                path: handle.field.clone(),
                caret: CaretPlacement::Offset(handle.caret.start),
            })?;
            let rest = &descriptors[1..];
            let inserted = match nav::parent_of(store, &handle.entry)? {
                Some(parent) => self.insert_descriptors(
                    store,
                    render,
                    focus,
                    &parent,
                    rest,
                    InsertPosition::After(handle.entry.clone()),
                )?,
                None => {
                    if !rest.is_empty() {
                        warn!(
                            "dropping {} descriptors: {} has no parent list",
                            rest.len(),
                            handle.entry
                        );
                    }
                    Vec::new()
                }
            };
            return Ok(PasteOutcome::ReplacedInPlace { inserted });
        }

        let Some(parent) = nav::parent_of(store, &handle.entry)? else {
            warn!("cannot reinsert paste: {} has no parent", handle.entry);
            return Ok(PasteOutcome::NoOp);
        };
        // the current entry's position, read freshly so the batch lands
        // exactly where the replaced entry was
        let parent_data = store.get_entry_data_only(&parent.entry)?;
        let index = parent_data
            .children(&parent.field)
            .and_then(|list| list.iter().position(|c| c == &handle.entry));
        store.remove_from_parent_list(
            &handle.entry,
            &parent.field,
            &parent.entry,
        )?;
        let position = match index {
            Some(index) => InsertPosition::AtIndex(index),
            None => InsertPosition::End,
        };
        let inserted = self.insert_descriptors(
            store, render, focus, &parent, &descriptors, position,
        )?;
        Ok(PasteOutcome::Reinserted { inserted })
    }

    /// Create one entry per descriptor, then land them in the parent list
    /// with a single batched insert and focus the last one.
    ///
    /// Creation is the fan-out: the calls are order-independent and all
    /// must complete before the batched insert joins them, in original
    /// descriptor order. Silently does nothing for an empty list.
    fn insert_descriptors<S, R, F>(
        &self,
        store: &mut S,
        render: &mut R,
        focus: &mut F,
        parent: &NavContext,
        descriptors: &[ComponentDescriptor],
        position: InsertPosition,
    ) -> Result<Vec<EntryRef>, EditError>
    where
        S: EditStore,
        R: RenderService,
        F: FocusService,
    {
        if descriptors.is_empty() {
            return Ok(Vec::new());
        }
        let mut created = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let mut data = BTreeMap::new();
            let markup = descriptor.value.to_markup();
            if !markup.is_empty() {
                data.insert(descriptor.field.clone(), markup);
            }
            created.push(store.create_entry(&descriptor.component, data)?);
        }
        store.add_multiple_to_parent_list(
            &created,
            position,
            &parent.field,
            &parent.entry,
        )?;
        // save the in-progress field before re-rendering the parent
        focus.unfocus()?;
        render.reload_entry(&parent.entry)?;
        if let (Some(last), Some(descriptor)) =
            (created.last(), descriptors.last())
        {
            let path = descriptor
                .group
                .clone()
                .unwrap_or_else(|| descriptor.field.clone());
            focus.focus(FocusTarget {
                entry: last.clone(),
                path,
                caret: CaretPlacement::End,
            })?;
        }
        Ok(created)
    }
}
