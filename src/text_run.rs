// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Flat text-run model for one rich-text field.
//!
//! A [`RunSequence`] is an ordered list of styled spans that fully covers the
//! plain text of a field with no gaps or overlaps. Parsing is best-effort:
//! unknown tags are dropped, stray closing tags are ignored, and entities are
//! decoded, so malformed markup sanitizes instead of failing. Serializing
//! merges adjacent runs of identical style back into a single tag pair.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)([^>]*)>").unwrap()
});

static HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
        .unwrap()
});

/// Tag-name equivalences applied before style resolution, e.g. mapping every
/// heading level to `strong`. Process-wide, installed once at startup.
static TAG_EQUIVALENCE: OnceCell<HashMap<String, String>> = OnceCell::new();

/// Install the process-wide tag equivalence table. Returns `false` if a
/// table (or the built-in default) has already been installed; the first
/// table wins and later calls have no effect.
pub fn set_tag_equivalence(pairs: &[(&str, &str)]) -> bool {
    let map = pairs
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.to_ascii_lowercase()))
        .collect();
    TAG_EQUIVALENCE.set(map).is_ok()
}

/// All heading levels collapse to bold text inside a text field.
fn default_equivalence() -> HashMap<String, String> {
    (1..=9).map(|n| (format!("h{n}"), "strong".to_owned())).collect()
}

fn resolve_tag<'a>(name: &'a str) -> &'a str {
    TAG_EQUIVALENCE
        .get_or_init(default_equivalence)
        .get(name)
        .map(String::as_str)
        .unwrap_or(name)
}

/// One inline style annotation. `Display` yields the canonical tag name used
/// when serializing; parsing also accepts the legacy aliases.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum InlineStyle {
    #[strum(to_string = "strong", serialize = "b")]
    Strong,
    #[strum(to_string = "em", serialize = "i")]
    Em,
    #[strum(to_string = "del", serialize = "s", serialize = "strike")]
    Del,
    #[strum(to_string = "u")]
    Underline,
}

/// A contiguous span of text carrying one set of style annotations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub styles: BTreeSet<InlineStyle>,
    /// Hyperlink target, when the span sits inside an anchor.
    pub link: Option<String>,
}

impl TextRun {
    fn same_shape(&self, other: &TextRun) -> bool {
        self.styles == other.styles && self.link == other.link
    }
}

/// An ordered sequence of [`TextRun`]s covering a field's plain text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSequence {
    pub runs: Vec<TextRun>,
}

enum StackEntry {
    Style(InlineStyle),
    Link(String),
}

impl RunSequence {
    /// Parse markup into runs. Never fails: unrecognized tags are dropped,
    /// stray closing tags are ignored, `<br>` becomes a literal newline and
    /// entities are decoded.
    pub fn parse(markup: &str) -> Self {
        let mut seq = RunSequence::default();
        let mut stack: Vec<StackEntry> = Vec::new();
        let mut cursor = 0;

        for cap in TAG.captures_iter(markup) {
            let Some(whole) = cap.get(0) else { continue };
            seq.push_text(&markup[cursor..whole.start()], &stack);
            cursor = whole.end();

            let closing = !cap[1].is_empty();
            let lower = cap[2].to_ascii_lowercase();
            let name = resolve_tag(&lower);

            if name == "br" {
                if !closing {
                    seq.push_text("\n", &stack);
                }
                continue;
            }
            if closing {
                pop_matching(&mut stack, name);
            } else if name == "a" {
                stack.push(StackEntry::Link(extract_href(&cap[3])));
            } else if let Ok(style) = InlineStyle::from_str(name) {
                stack.push(StackEntry::Style(style));
            }
            // anything else cannot live inside a text field and is dropped
        }
        seq.push_text(&markup[cursor..], &stack);
        seq
    }

    fn push_text(&mut self, raw: &str, stack: &[StackEntry]) {
        if raw.is_empty() {
            return;
        }
        let text = html_escape::decode_html_entities(raw).into_owned();
        let styles = stack
            .iter()
            .filter_map(|entry| match entry {
                StackEntry::Style(style) => Some(*style),
                StackEntry::Link(_) => None,
            })
            .collect();
        let link = stack.iter().rev().find_map(|entry| match entry {
            StackEntry::Link(url) => Some(url.clone()),
            StackEntry::Style(_) => None,
        });
        let run = TextRun { text, styles, link };
        match self.runs.last_mut() {
            Some(last) if last.same_shape(&run) => last.text.push_str(&run.text),
            _ => self.runs.push(run),
        }
    }

    /// Split at a plain-text character offset. A run spanning the offset is
    /// cut into two runs with identical style and link.
    pub fn split(&self, offset: usize) -> (RunSequence, RunSequence) {
        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut remaining = offset;

        for run in &self.runs {
            let len = run.text.chars().count();
            if remaining >= len {
                left.push(run.clone());
                remaining -= len;
            } else if remaining == 0 {
                right.push(run.clone());
            } else {
                let byte = run
                    .text
                    .char_indices()
                    .nth(remaining)
                    .map(|(i, _)| i)
                    .unwrap_or(run.text.len());
                let mut before = run.clone();
                before.text.truncate(byte);
                let mut after = run.clone();
                after.text.replace_range(..byte, "");
                left.push(before);
                right.push(after);
                remaining = 0;
            }
        }
        (RunSequence { runs: left }, RunSequence { runs: right })
    }

    /// Serialize back to markup, merging adjacent runs of identical shape
    /// into a single tag pair. Canonical tag names are emitted, text is
    /// entity-escaped and newlines become `<br />`.
    pub fn serialize(&self) -> String {
        let mut merged: Vec<TextRun> = Vec::new();
        for run in &self.runs {
            match merged.last_mut() {
                Some(last) if last.same_shape(run) => {
                    last.text.push_str(&run.text)
                }
                _ => merged.push(run.clone()),
            }
        }

        let mut out = String::new();
        for run in &merged {
            if let Some(url) = &run.link {
                out.push_str("<a href=\"");
                out.push_str(
                    &html_escape::encode_double_quoted_attribute(url),
                );
                out.push_str("\">");
            }
            for style in &run.styles {
                out.push_str(&format!("<{style}>"));
            }
            for (i, segment) in run.text.split('\n').enumerate() {
                if i > 0 {
                    out.push_str("<br />");
                }
                out.push_str(&html_escape::encode_text(segment));
            }
            for style in run.styles.iter().rev() {
                out.push_str(&format!("</{style}>"));
            }
            if run.link.is_some() {
                out.push_str("</a>");
            }
        }
        out
    }

    /// The plain-text view of the sequence.
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// Plain-text length in characters; caret offsets count in these units.
    pub fn text_len(&self) -> usize {
        self.runs.iter().map(|run| run.text.chars().count()).sum()
    }

    pub fn is_blank(&self) -> bool {
        !self.runs.iter().any(|run| {
            run.text.chars().any(|c| !c.is_whitespace())
        })
    }
}

/// Pop the nearest matching open entry, scanning from the top of the stack.
/// Close tags with no matching open entry are ignored.
fn pop_matching(stack: &mut Vec<StackEntry>, name: &str) {
    let matches = |entry: &StackEntry| match entry {
        StackEntry::Link(_) => name == "a",
        StackEntry::Style(style) => {
            InlineStyle::from_str(name) == Ok(*style)
        }
    };
    if let Some(index) = stack.iter().rposition(matches) {
        stack.remove(index);
    }
}

fn extract_href(attrs: &str) -> String {
    HREF.captures(attrs)
        .and_then(|cap| cap.get(1).or_else(|| cap.get(2)).or_else(|| cap.get(3)))
        .map(|m| html_escape::decode_html_entities(m.as_str()).into_owned())
        .unwrap_or_default()
}
