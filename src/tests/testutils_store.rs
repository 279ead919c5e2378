// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! In-memory store and recording collaborators for tests.

use std::collections::BTreeMap;

use crate::entry::{EntryData, EntryRef, FieldValue};
use crate::services::{
    EditStore, FocusService, FocusTarget, InsertPosition, RenderService,
    ServiceError, ServiceResult,
};

/// An in-memory document tree implementing [`EditStore`]. Records every
/// mutating call so tests can assert on exactly what was issued.
pub struct MemoryStore {
    entries: BTreeMap<EntryRef, EntryData>,
    next_id: usize,
    pub mutations: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 0,
            mutations: Vec::new(),
        }
    }

    fn next_ref(&mut self, component: &str) -> EntryRef {
        self.next_id += 1;
        EntryRef::new(format!(
            "site.test/components/{component}/instances/{}",
            self.next_id
        ))
    }

    /// Create an entry directly (no mutation recorded), optionally
    /// appending it to a parent list field.
    pub fn seed_entry(
        &mut self,
        component: &str,
        parent: Option<(&EntryRef, &str)>,
    ) -> EntryRef {
        let entry = self.next_ref(component);
        let mut data = EntryData::default();
        if let Some((parent_ref, parent_field)) = parent {
            data.parent =
                Some((parent_ref.clone(), parent_field.to_owned()));
            let list = self
                .entries
                .get_mut(parent_ref)
                .expect("seeding under a missing parent")
                .fields
                .entry(parent_field.to_owned())
                .or_insert_with(|| FieldValue::Children(Vec::new()));
            if let FieldValue::Children(children) = list {
                children.push(entry.clone());
            }
        }
        self.entries.insert(entry.clone(), data);
        entry
    }

    pub fn set_markup(&mut self, entry: &EntryRef, field: &str, markup: &str) {
        self.entries
            .get_mut(entry)
            .expect("setting markup on a missing entry")
            .fields
            .insert(field.to_owned(), FieldValue::Markup(markup.to_owned()));
    }

    pub fn markup_of(&self, entry: &EntryRef, field: &str) -> String {
        self.entries
            .get(entry)
            .and_then(|data| data.markup(field))
            .unwrap_or_default()
            .to_owned()
    }

    pub fn child_list(&self, parent: &EntryRef, field: &str) -> Vec<EntryRef> {
        self.entries
            .get(parent)
            .and_then(|data| data.children(field))
            .unwrap_or_default()
            .to_vec()
    }

    pub fn contains(&self, entry: &EntryRef) -> bool {
        self.entries.contains_key(entry)
    }

    fn lookup(&self, entry: &EntryRef) -> ServiceResult<&EntryData> {
        self.entries
            .get(entry)
            .ok_or_else(|| ServiceError(format!("missing entry {entry}")))
    }

    fn insert_into_list(
        &mut self,
        to_insert: &[EntryRef],
        position: InsertPosition,
        parent_field: &str,
        parent: &EntryRef,
    ) -> ServiceResult<()> {
        for entry in to_insert {
            if let Some(data) = self.entries.get_mut(entry) {
                data.parent =
                    Some((parent.clone(), parent_field.to_owned()));
            }
        }
        let list = self
            .entries
            .get_mut(parent)
            .ok_or_else(|| ServiceError(format!("missing parent {parent}")))?
            .fields
            .entry(parent_field.to_owned())
            .or_insert_with(|| FieldValue::Children(Vec::new()));
        let FieldValue::Children(children) = list else {
            return Err(ServiceError(format!(
                "{parent_field} is not a list field"
            )));
        };
        let index = match position {
            InsertPosition::After(prev) => children
                .iter()
                .position(|c| c == &prev)
                .map(|i| i + 1)
                .unwrap_or(children.len()),
            InsertPosition::AtIndex(index) => index.min(children.len()),
            InsertPosition::End => children.len(),
        };
        children.splice(index..index, to_insert.iter().cloned());
        Ok(())
    }
}

impl EditStore for MemoryStore {
    fn get_entry_data(&self, entry: &EntryRef) -> ServiceResult<EntryData> {
        self.lookup(entry).cloned()
    }

    fn get_entry_data_only(
        &self,
        entry: &EntryRef,
    ) -> ServiceResult<EntryData> {
        self.lookup(entry).cloned()
    }

    fn create_entry(
        &mut self,
        component: &str,
        data: BTreeMap<String, String>,
    ) -> ServiceResult<EntryRef> {
        self.mutations.push(format!("create {component}"));
        let entry = self.next_ref(component);
        let fields = data
            .into_iter()
            .map(|(field, markup)| (field, FieldValue::Markup(markup)))
            .collect();
        self.entries.insert(
            entry.clone(),
            EntryData { parent: None, fields },
        );
        Ok(entry)
    }

    fn save_field(
        &mut self,
        entry: &EntryRef,
        field: &str,
        markup: &str,
    ) -> ServiceResult<()> {
        self.mutations.push(format!("save {entry} {field}"));
        self.lookup(entry)?;
        self.set_markup(entry, field, markup);
        Ok(())
    }

    fn remove_from_parent_list(
        &mut self,
        entry: &EntryRef,
        parent_field: &str,
        parent: &EntryRef,
    ) -> ServiceResult<()> {
        self.mutations.push(format!("remove {entry}"));
        let list = self
            .entries
            .get_mut(parent)
            .ok_or_else(|| ServiceError(format!("missing parent {parent}")))?
            .fields
            .get_mut(parent_field);
        if let Some(FieldValue::Children(children)) = list {
            children.retain(|c| c != entry);
        }
        if let Some(data) = self.entries.get_mut(entry) {
            data.parent = None;
        }
        Ok(())
    }

    fn add_to_parent_list(
        &mut self,
        entry: &EntryRef,
        prev: Option<&EntryRef>,
        parent_field: &str,
        parent: &EntryRef,
    ) -> ServiceResult<()> {
        self.mutations.push(format!("add {entry}"));
        let position = match prev {
            Some(prev) => InsertPosition::After(prev.clone()),
            None => InsertPosition::End,
        };
        self.insert_into_list(
            &[entry.clone()],
            position,
            parent_field,
            parent,
        )
    }

    fn add_multiple_to_parent_list(
        &mut self,
        entries: &[EntryRef],
        position: InsertPosition,
        parent_field: &str,
        parent: &EntryRef,
    ) -> ServiceResult<()> {
        self.mutations
            .push(format!("add_multiple x{}", entries.len()));
        self.insert_into_list(entries, position, parent_field, parent)
    }
}

/// Records render calls.
#[derive(Default)]
pub struct RecordingRender {
    pub reloaded: Vec<EntryRef>,
    pub attached: Vec<EntryRef>,
    pub cleared: Vec<(EntryRef, String)>,
}

impl RenderService for RecordingRender {
    fn reload_entry(&mut self, entry: &EntryRef) -> ServiceResult<()> {
        self.reloaded.push(entry.clone());
        Ok(())
    }

    fn attach_handlers(&mut self, entry: &EntryRef) -> ServiceResult<()> {
        self.attached.push(entry.clone());
        Ok(())
    }

    fn clear_field(
        &mut self,
        entry: &EntryRef,
        field: &str,
    ) -> ServiceResult<()> {
        self.cleared.push((entry.clone(), field.to_owned()));
        Ok(())
    }
}

/// Records focus transfers.
#[derive(Default)]
pub struct RecordingFocus {
    pub focused: Vec<FocusTarget>,
    pub unfocus_count: usize,
}

impl FocusService for RecordingFocus {
    fn focus(&mut self, target: FocusTarget) -> ServiceResult<()> {
        self.focused.push(target);
        Ok(())
    }

    fn unfocus(&mut self) -> ServiceResult<()> {
        self.unfocus_count += 1;
        Ok(())
    }
}
