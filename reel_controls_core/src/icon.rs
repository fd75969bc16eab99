// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cosmetic re-skinning of a native volume button.
//!
//! Native buttons found only by geometry often keep showing a muted glyph
//! after the overlay unmutes the element directly. [`CosmeticSkin`] rewrites
//! the button's accessible label and inline icon markup into an unmuted form
//! and remembers the originals so they can be put back whenever the element
//! is muted again.
//!
//! This is pattern matching over markup we do not own. Every function here
//! is total: unknown input comes back unchanged (`None`), never mangled.

/// Muted-form label fragments and their unmuted replacements.
///
/// Matched case-insensitively, first hit wins, so longer phrases come first.
const LABEL_PAIRS: &[(&str, &str)] = &[
    ("audio is muted", "Audio is playing"),
    ("stummschaltung aufheben", "Stummschalten"),
    ("ton ist aus", "Ton ist an"),
    ("unmute", "Mute"),
    ("muted", "Playing"),
];

/// Icon-reference suffixes of a muted glyph and their unmuted counterparts.
const SUFFIX_PAIRS: &[(&str, &str)] = &[
    ("_muted", "_unmuted"),
    ("-muted", "-unmuted"),
    ("_off", "_on"),
    ("-off", "-on"),
];

/// Attributes whose values reference an icon sprite.
const HREF_ATTRS: &[&str] = &["xlink:href=\"", "href=\""];

/// Returns the unmuted form of `label`, or `None` if nothing matched.
#[must_use]
pub fn unmuted_label(label: &str) -> Option<String> {
    let lower = label.to_ascii_lowercase();
    LABEL_PAIRS.iter().find_map(|(from, to)| {
        let start = lower.find(from)?;
        let end = start + from.len();
        // ASCII lowering keeps byte offsets aligned with `label`.
        Some(format!("{}{to}{}", &label[..start], &label[end..]))
    })
}

/// Rewrites the last muted-style suffix of an icon reference.
///
/// The suffix must sit at the end of the reference or right before its
/// extension or fragment, so `#icon_off` and `sprite.svg#vol-muted` are
/// rewritten but `#offset_arrow` is not.
#[must_use]
pub fn unmuted_href(href: &str) -> Option<String> {
    let lower = href.to_ascii_lowercase();
    SUFFIX_PAIRS.iter().find_map(|(from, to)| {
        let start = lower.rfind(from)?;
        let end = start + from.len();
        let tail = &href[end..];
        let at_boundary = tail.is_empty() || tail.starts_with(['.', '#', '?']);
        at_boundary.then(|| format!("{}{to}{tail}", &href[..start]))
    })
}

/// Rewrites every icon reference inside `markup`. Returns `None` if no
/// reference changed.
#[must_use]
pub fn unmuted_markup(markup: &str) -> Option<String> {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;
    let mut changed = false;
    while let Some((attr_end, value_end)) = next_href(rest) {
        let value = &rest[attr_end..value_end];
        out.push_str(&rest[..attr_end]);
        match unmuted_href(value) {
            Some(rewritten) => {
                out.push_str(&rewritten);
                changed = true;
            }
            None => out.push_str(value),
        }
        rest = &rest[value_end..];
    }
    out.push_str(rest);
    changed.then_some(out)
}

/// Byte range of the next quoted href value in `markup`.
fn next_href(markup: &str) -> Option<(usize, usize)> {
    let (attr_start, attr) = HREF_ATTRS
        .iter()
        .filter_map(|attr| markup.find(attr).map(|idx| (idx, *attr)))
        .min_by_key(|(idx, _)| *idx)?;
    let value_start = attr_start + attr.len();
    let value_len = markup[value_start..].find('"')?;
    Some((value_start, value_start + value_len))
}

/// Label and markup to write onto the native button.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SkinPatch {
    /// New accessible label, if it changes.
    pub label: Option<String>,
    /// New inner icon markup, if it changes.
    pub markup: Option<String>,
}

impl SkinPatch {
    /// Returns `true` if there is nothing to write.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.markup.is_none()
    }
}

/// Remembers a native button's original label and icon while it shows the
/// unmuted skin.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CosmeticSkin {
    original_label: Option<String>,
    original_markup: Option<String>,
    applied: bool,
}

impl CosmeticSkin {
    /// A skin that has not touched the button.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            original_label: None,
            original_markup: None,
            applied: false,
        }
    }

    /// Returns `true` while the unmuted skin is on.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.applied
    }

    /// Brings the button in line with `muted`.
    ///
    /// `label` and `markup` are what the button currently carries. When
    /// unmuted, the originals are captured once and the unmuted forms are
    /// returned; when muted, the captured originals are returned. An empty
    /// patch means nothing to write.
    pub fn sync(&mut self, muted: bool, label: Option<&str>, markup: &str) -> SkinPatch {
        if muted {
            return self.revert();
        }
        if self.applied {
            return SkinPatch::default();
        }
        let patch = SkinPatch {
            label: label.and_then(unmuted_label),
            markup: unmuted_markup(markup),
        };
        if !patch.is_empty() {
            self.original_label = label.map(str::to_owned);
            self.original_markup = Some(markup.to_owned());
            self.applied = true;
        }
        patch
    }

    /// Returns the captured originals and forgets them.
    pub fn revert(&mut self) -> SkinPatch {
        if !std::mem::take(&mut self.applied) {
            return SkinPatch::default();
        }
        SkinPatch {
            label: self.original_label.take(),
            markup: self.original_markup.take(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MUTED_ICON: &str = r##"<svg><use href="#volume_off"></use></svg>"##;

    #[test]
    fn labels_rewrite_case_insensitively() {
        assert_eq!(unmuted_label("Audio is MUTED").as_deref(), Some("Audio is playing"));
        assert_eq!(unmuted_label("Unmute video").as_deref(), Some("Mute video"));
        assert_eq!(unmuted_label("Share"), None);
    }

    #[test]
    fn hrefs_rewrite_only_at_suffix() {
        assert_eq!(unmuted_href("#volume_off").as_deref(), Some("#volume_on"));
        assert_eq!(unmuted_href("/i.svg#vol-muted").as_deref(), Some("/i.svg#vol-unmuted"));
        assert_eq!(unmuted_href("sound_off.svg").as_deref(), Some("sound_on.svg"));
        assert_eq!(unmuted_href("#offset_arrow"), None);
    }

    #[test]
    fn markup_rewrite_leaves_other_text_alone() {
        let rewritten = unmuted_markup(MUTED_ICON).unwrap();
        assert_eq!(rewritten, r##"<svg><use href="#volume_on"></use></svg>"##);
        assert_eq!(unmuted_markup("<svg><path d=\"M0 0\"/></svg>"), None);
    }

    #[test]
    fn sync_round_trips_to_original() {
        let mut skin = CosmeticSkin::new();
        let on = skin.sync(false, Some("Audio is muted"), MUTED_ICON);
        assert_eq!(on.label.as_deref(), Some("Audio is playing"));
        assert!(skin.is_applied(), "skin should be applied");

        // Already applied; the host may have re-rendered but we do not
        // capture the unmuted form as the original.
        assert!(skin.sync(false, Some("Audio is playing"), "<svg/>").is_empty());

        let off = skin.sync(true, Some("Audio is playing"), "<svg/>");
        assert_eq!(off.label.as_deref(), Some("Audio is muted"));
        assert_eq!(off.markup.as_deref(), Some(MUTED_ICON));
        assert!(!skin.is_applied(), "skin should be reverted");
        assert!(skin.revert().is_empty());
    }

    #[test]
    fn malformed_markup_does_not_panic() {
        let inputs = [
            "",
            "href=\"",
            "xlink:href=\"#a_off",
            "<use href=\"#ü_off\"><use xlink:href=\"#ß-muted\">",
            "Ton ist aus ☃",
        ];
        let mut skin = CosmeticSkin::new();
        for input in inputs {
            let _ = unmuted_markup(input);
            let _ = unmuted_label(input);
            let _ = skin.sync(false, Some(input), input);
            let _ = skin.sync(true, Some(input), input);
        }
        assert!(!skin.is_applied(), "last sync was muted");
    }
}
