// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Splits one pasted blob into ordered paragraph-level units.
//!
//! Units are delimited by closing block tags (`</p>`, `</div>`,
//! `</h1>`..`</h9>`) or by two consecutive line-break markers. Splitting on
//! *closing* tags tolerates paste sources that leave the last paragraph
//! unwrapped (word processors do this), and closing `</div>` covers
//! plain-text editors that wrap lines in bare divs.

use once_cell::sync::Lazy;
use regex::Regex;

/// A block boundary: closing p/div/heading, or two interchangeable
/// line-break markers (`<br>` variants or literal newlines) with optional
/// whitespace around them.
static BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</(?:p|div|h[1-9])>|(?:\s?<br(?:\s?/)?>\s?|\s?\n\s?){2}")
        .unwrap()
});

const QUOTE_OPEN: &str = "<blockquote";
const QUOTE_CLOSE: &str = "</blockquote>";

/// Split raw pasted markup into trimmed paragraph units.
///
/// A unit containing an inline quote is expanded into exactly three units:
/// the text before the quote, the quote block verbatim, and the text after,
/// so the quote can be classified as its own paragraph downstream. Empty
/// units are kept; classification filters them once tags are stripped.
pub fn split_paragraphs(raw: &str) -> Vec<String> {
    let mut units = Vec::new();
    for part in BOUNDARY.split(raw) {
        let graf = part.trim();
        if graf.contains(QUOTE_OPEN) || graf.contains(QUOTE_CLOSE) {
            let start = graf.find(QUOTE_OPEN).unwrap_or(0);
            let end = graf
                .find(QUOTE_CLOSE)
                .map(|i| i + QUOTE_CLOSE.len())
                .unwrap_or(graf.len());
            let end = end.max(start);
            units.push(graf[..start].to_owned());
            units.push(graf[start..end].to_owned());
            units.push(graf[end..].to_owned());
        } else {
            units.push(graf.to_owned());
        }
    }
    units
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn splits_on_closing_block_tags() {
        assert_eq!(
            split_paragraphs("<p>one</p><p>two</p>"),
            vec!["<p>one", "<p>two", ""]
        );
    }

    #[test]
    fn two_paragraphs_joined_by_closing_p_split_into_those_two() {
        assert_eq!(split_paragraphs("one</p>two"), vec!["one", "two"]);
    }

    #[test]
    fn splits_on_closing_headings_and_divs() {
        assert_eq!(
            split_paragraphs("<h2>title</h2>body</div>rest"),
            vec!["<h2>title", "body", "rest"]
        );
    }

    #[test]
    fn splits_on_double_line_breaks() {
        assert_eq!(split_paragraphs("one<br><br>two"), vec!["one", "two"]);
        assert_eq!(split_paragraphs("one\n\ntwo"), vec!["one", "two"]);
        // markers are interchangeable and may carry closing slashes
        assert_eq!(split_paragraphs("one<br />\ntwo"), vec!["one", "two"]);
    }

    #[test]
    fn single_line_break_is_not_a_boundary() {
        assert_eq!(split_paragraphs("one<br>two"), vec!["one<br>two"]);
    }

    #[test]
    fn trims_each_unit() {
        assert_eq!(
            split_paragraphs("  one  </p>  two  "),
            vec!["one", "two"]
        );
    }

    #[test]
    fn inline_quote_expands_to_three_units() {
        assert_eq!(
            split_paragraphs(
                "before<blockquote>quoted</blockquote>after"
            ),
            vec![
                "before",
                "<blockquote>quoted</blockquote>",
                "after"
            ]
        );
    }

    #[test]
    fn quote_without_close_marker_runs_to_end_of_unit() {
        assert_eq!(
            split_paragraphs("before<blockquote>quoted"),
            vec!["before", "<blockquote>quoted", ""]
        );
    }

    #[test]
    fn quote_close_without_open_marker_starts_at_unit_start() {
        assert_eq!(
            split_paragraphs("quoted</blockquote>after"),
            vec!["", "quoted</blockquote>", "after"]
        );
    }
}
