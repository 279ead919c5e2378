// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Paste decomposition and structural-edit model for component-based
//! documents.
//!
//! Given arbitrary rich text pasted or typed into one structured content
//! field, this crate splits it into paragraph-level units, classifies each
//! unit against an ordered list of paste rules, normalizes textual content
//! into a tag-safe sequence of styled runs, and drives the content-tree
//! mutations (create, split, merge-on-delete, multi-insert) needed to keep
//! the document model consistent, caret and focus continuity included.
//!
//! The visual editor, persistence transport, rendering and focus primitives
//! are collaborators, consumed through the traits in [`services`].

pub mod editor;
pub mod entry;
pub mod error;
pub mod nav;
pub mod paragraphs;
pub mod rules;
pub mod services;
pub mod text_run;

#[cfg(test)]
mod tests;

pub use crate::editor::{
    Caret, CreateOutcome, DeleteOutcome, EditorCore, FieldHandle,
    PasteOutcome,
};
pub use crate::entry::{EntryData, EntryRef, FieldValue};
pub use crate::error::{EditError, PasteError, RuleError};
pub use crate::paragraphs::split_paragraphs;
pub use crate::rules::{
    match_components, ComponentDescriptor, CompiledRule, DescriptorValue,
    PasteRule,
};
pub use crate::services::{
    CaretPlacement, EditStore, FocusService, FocusTarget, InsertPosition,
    RenderService, ServiceError, ServiceResult,
};
pub use crate::text_run::{
    set_tag_equivalence, InlineStyle, RunSequence, TextRun,
};
