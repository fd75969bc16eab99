// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Accessible-label matching.
//!
//! Host pages rarely expose stable class names, but their controls do carry
//! accessible labels in the viewer's language. Matching is a case-insensitive
//! substring test against short multilingual term lists.

/// Terms identifying a mute/volume control.
pub const VOLUME_TERMS: &[&str] = &[
    "sound", "audio", "mute", "volume", "ton", "laut", "stumm", "sonido", "silenc",
];

/// Terms identifying the left-side auxiliary control (people tags).
pub const LEFT_UI_TERMS: &[&str] = &[
    "tag", "tagged", "person", "people", "mark", "markier", "etiquet", "identif",
];

/// A named term list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TermSet {
    /// [`VOLUME_TERMS`].
    Volume,
    /// [`LEFT_UI_TERMS`].
    LeftUi,
}

impl TermSet {
    /// The terms in this set, all lowercase.
    #[must_use]
    pub const fn terms(self) -> &'static [&'static str] {
        match self {
            Self::Volume => VOLUME_TERMS,
            Self::LeftUi => LEFT_UI_TERMS,
        }
    }

    /// Returns `true` if `label` contains any term of this set.
    #[must_use]
    pub fn matches(self, label: &str) -> bool {
        label_matches(label, self.terms())
    }
}

/// Case-insensitive substring match of `text` against `terms`.
///
/// `terms` must already be lowercase. Empty text never matches.
#[must_use]
pub fn label_matches(text: &str, terms: &[&str]) -> bool {
    if text.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    terms.iter().any(|term| lower.contains(term))
}
