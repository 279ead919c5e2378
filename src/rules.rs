// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Paste-rule compilation and paragraph classification.
//!
//! Rules form a chain of responsibility: each cleaned paragraph unit is
//! tried against the rules in caller-supplied order and the first full
//! (anchored) match wins. A paragraph that no rule matches fails the whole
//! batch, since a partial paste is worse than no paste.

use std::borrow::Cow;

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{PasteError, RuleError};
use crate::text_run::RunSequence;

/// Extraneous leading open tag; word processors often emit `<p><br>`.
static LEADING_OPEN_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s?<(?:p><br|p|div|br)(?:.*?)>\s?").unwrap()
});

/// Block-level tags cannot nest inside a text field.
static OPEN_BLOCK_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(?:p|div).*?>").unwrap());

/// Line/paragraph separator control characters; invisible in editors but
/// present in pastes from PDFs and legacy systems.
static SEPARATOR_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new("[\u{2028}\u{2029}]").unwrap());

/// Tab characters, and the literal two-character `\t` escape.
static TABS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t|\\t").unwrap());

static NBSP: Lazy<Regex> = Lazy::new(|| Regex::new("(?i)&nbsp;").unwrap());

/// A newline between a period and an uppercase letter or digit is a real
/// sentence break worth keeping; PDFs insert the remaining newlines at
/// arbitrary places and those collapse to spaces.
static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\.)\n([A-Z0-9])").unwrap());

static NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n").unwrap());

/// A value that is nothing but one stray closing tag; left behind by
/// paragraphs that were only structural wrappers.
static STRAY_CLOSING_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^</.*?>$").unwrap());

pub(crate) fn collapse_nbsp(markup: &str) -> Cow<'_, str> {
    NBSP.replace_all(markup, " ")
}

/// Declarative paste rule, supplied once per editor instance.
///
/// `pattern` must match the entire candidate string; anchors are added at
/// compile time. The first capture group becomes the descriptor value.
#[derive(Clone, Debug)]
pub struct PasteRule {
    pub pattern: String,
    /// Also try the pattern wrapped in a surrounding hyperlink pair,
    /// keeping only the inner capture. Editors linkify pasted urls; embeds
    /// want the bare url back.
    pub match_link: bool,
    /// Target component type name.
    pub component: String,
    /// Target field within the new component.
    pub field: String,
    /// Focus this group instead of `field` after insertion, when set.
    pub group: Option<String>,
    /// Run the captured value through the text-run model.
    pub sanitize: bool,
}

/// A [`PasteRule`] with its pattern compiled and anchored.
///
/// `match_link` rules carry a second regex in which the surrounding anchor
/// pair is mandatory. Keeping the pair mandatory (rather than optional
/// around one pattern) stops a greedy rule pattern from swallowing the
/// closing `</a>` into its capture.
#[derive(Clone, Debug)]
pub struct CompiledRule {
    regex: Regex,
    link_regex: Option<Regex>,
    pub component: String,
    pub field: String,
    pub group: Option<String>,
    pub sanitize: bool,
}

impl CompiledRule {
    /// Match the bare pattern first, then the link-wrapped form. Capture
    /// group 1 is the rule's own in both.
    fn captures<'t>(&self, candidate: &'t str) -> Option<regex::Captures<'t>> {
        self.regex.captures(candidate).or_else(|| {
            self.link_regex
                .as_ref()
                .and_then(|regex| regex.captures(candidate))
        })
    }
}

/// Compile caller-supplied rules, failing fast on an empty or invalid
/// pattern. Order is preserved; it is the match order.
pub fn compile_rules(rules: &[PasteRule]) -> Result<Vec<CompiledRule>, RuleError> {
    rules.iter().map(compile_rule).collect()
}

fn compile_rule(rule: &PasteRule) -> Result<CompiledRule, RuleError> {
    if rule.pattern.is_empty() {
        return Err(RuleError::MissingPattern {
            component: rule.component.clone(),
        });
    }
    let compile = |anchored: &str| {
        Regex::new(anchored).map_err(|source| RuleError::InvalidPattern {
            pattern: rule.pattern.clone(),
            source,
        })
    };
    let regex = compile(&format!("^{}$", rule.pattern))?;
    let link_regex = if rule.match_link {
        Some(compile(&format!("^<a(?:.*?)>{}</a>$", rule.pattern))?)
    } else {
        None
    };
    Ok(CompiledRule {
        regex,
        link_regex,
        component: rule.component.clone(),
        field: rule.field.clone(),
        group: rule.group.clone(),
        sanitize: rule.sanitize,
    })
}

/// The classified value for one paragraph unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DescriptorValue {
    Text(String),
    Runs(RunSequence),
}

impl DescriptorValue {
    /// The value as markup, serializing run sequences.
    pub fn to_markup(&self) -> String {
        match self {
            DescriptorValue::Text(text) => text.clone(),
            DescriptorValue::Runs(runs) => runs.serialize(),
        }
    }

    fn has_words(&self) -> bool {
        let text = match self {
            DescriptorValue::Text(text) => Cow::Borrowed(text.as_str()),
            DescriptorValue::Runs(runs) => Cow::Owned(runs.text()),
        };
        text.chars().any(|c| !c.is_whitespace())
            && !STRAY_CLOSING_TAG.is_match(&text)
    }
}

/// The result of classifying one paragraph unit, consumed immediately by
/// the mutation orchestrator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentDescriptor {
    pub component: String,
    pub field: String,
    pub group: Option<String>,
    pub value: DescriptorValue,
}

/// Classify paragraph units against the rules, first match wins.
///
/// Returns an error naming a truncated excerpt of the first unit that no
/// rule matched; the whole batch fails so the caller can discard any
/// partially-applied state. Descriptors whose value is blank (or a single
/// stray closing tag) are dropped from the result.
pub fn match_components(
    paragraphs: Vec<String>,
    rules: &[CompiledRule],
) -> Result<Vec<ComponentDescriptor>, PasteError> {
    let mut descriptors = Vec::new();
    for paragraph in paragraphs {
        let clean = clean_unit(&paragraph);

        let Some((rule, captures)) = rules
            .iter()
            .find_map(|rule| rule.captures(&clean).map(|c| (rule, c)))
        else {
            warn!("no paste rule matched {clean:?}");
            return Err(PasteError::NoMatchingRule {
                preview: truncate_preview(&clean),
            });
        };

        // rules need to grab _some value_ from the string
        let value = captures
            .get(1)
            .map(|m| m.as_str())
            .unwrap_or_default()
            .to_owned();
        let value = if rule.sanitize {
            DescriptorValue::Runs(RunSequence::parse(&value))
        } else {
            DescriptorValue::Text(value)
        };

        if value.has_words() {
            descriptors.push(ComponentDescriptor {
                component: rule.component.clone(),
                field: rule.field.clone(),
                group: rule.group.clone(),
                value,
            });
        }
    }
    Ok(descriptors)
}

/// Normalize one paragraph unit before matching.
fn clean_unit(unit: &str) -> String {
    let clean = LEADING_OPEN_TAG.replace(unit, "");
    let clean = OPEN_BLOCK_TAGS.replace_all(&clean, "");
    let clean = SEPARATOR_CHARS.replace_all(&clean, "");
    let clean = TABS.replace_all(&clean, " ");
    let clean = NBSP.replace_all(&clean, " ");
    let clean = SENTENCE_BREAK.replace_all(&clean, "$1<br>$2");
    let clean = NEWLINES.replace_all(&clean, " ");
    clean.trim().to_owned()
}

const PREVIEW_GRAPHEMES: usize = 40;

fn truncate_preview(text: &str) -> String {
    let mut graphemes = text.graphemes(true);
    let mut preview: String = graphemes.by_ref().take(PREVIEW_GRAPHEMES).collect();
    if graphemes.next().is_some() {
        preview.push('…');
    }
    preview
}
