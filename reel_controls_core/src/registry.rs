// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identity bookkeeping between host elements and UI Contexts.
//!
//! Scans run on every mutation batch and see the same videos and buttons
//! over and over. The [`ContextRegistry`] guarantees that a video gets
//! exactly one context, that a native button gets exactly one set of
//! listeners, and that a button which moves to another video is owned by
//! one context at a time.
//!
//! Keys are element handles compared by identity, as for
//! [`ControlTree::Node`](crate::locate::ControlTree::Node). Nothing is held
//! weakly: the caller [releases](ContextRegistry::release) a context once its
//! video leaves the document, which drops every entry that context owns.

use crate::trace::ContextId;

/// Outcome of [`ContextRegistry::claim`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Claim {
    /// The video already has this context.
    Existing(ContextId),
    /// A fresh id was assigned; the caller builds the context.
    New(ContextId),
}

/// Outcome of [`ContextRegistry::bind_button`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ButtonBinding {
    /// The context that owned the button before, if it was another one.
    pub previous_owner: Option<ContextId>,
    /// Listeners were installed by this call.
    pub installed: bool,
}

#[derive(Debug)]
struct ButtonEntry<K, L> {
    node: K,
    owner: ContextId,
    /// Whatever keeps the button's listeners alive.
    listeners: L,
}

/// Maps videos to context ids and native buttons to their owning context.
///
/// `L` is the listener handle stored per button; dropping it must remove
/// the listeners.
#[derive(Debug)]
pub struct ContextRegistry<K, L = ()> {
    next_id: u32,
    videos: Vec<(K, ContextId)>,
    buttons: Vec<ButtonEntry<K, L>>,
}

impl<K: Clone + PartialEq, L> Default for ContextRegistry<K, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + PartialEq, L> ContextRegistry<K, L> {
    /// An empty registry. Ids start at 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: 1,
            videos: Vec::new(),
            buttons: Vec::new(),
        }
    }

    /// Number of registered videos.
    #[must_use]
    pub fn len(&self) -> usize {
        self.videos.len()
    }

    /// Returns `true` if no video is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    /// The context of `video`, if it has one.
    #[must_use]
    pub fn context_of(&self, video: &K) -> Option<ContextId> {
        self.videos
            .iter()
            .find(|(node, _)| node == video)
            .map(|&(_, id)| id)
    }

    /// Returns the context of `video`, assigning a new id on first sight.
    pub fn claim(&mut self, video: &K) -> Claim {
        if let Some(id) = self.context_of(video) {
            return Claim::Existing(id);
        }
        let id = ContextId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.videos.push((video.clone(), id));
        Claim::New(id)
    }

    /// The context that currently owns `button`.
    #[must_use]
    pub fn owner_of(&self, button: &K) -> Option<ContextId> {
        self.buttons
            .iter()
            .find(|entry| entry.node == *button)
            .map(|entry| entry.owner)
    }

    /// Returns `true` if `button` has listeners installed.
    #[must_use]
    pub fn is_bound(&self, button: &K) -> bool {
        self.owner_of(button).is_some()
    }

    /// Makes `owner` the owner of `button`.
    ///
    /// `install` runs only the first time a button is seen; the listeners
    /// it returns stay with the button across owner changes, so they must
    /// resolve the owner through [`Self::owner_of`] on every event.
    pub fn bind_button(
        &mut self,
        button: &K,
        owner: ContextId,
        install: impl FnOnce() -> L,
    ) -> ButtonBinding {
        if let Some(entry) = self.buttons.iter_mut().find(|entry| entry.node == *button) {
            let previous = std::mem::replace(&mut entry.owner, owner);
            return ButtonBinding {
                previous_owner: (previous != owner).then_some(previous),
                installed: false,
            };
        }
        self.buttons.push(ButtonEntry {
            node: button.clone(),
            owner,
            listeners: install(),
        });
        ButtonBinding {
            previous_owner: None,
            installed: true,
        }
    }

    /// Forgets `id`: its video and the buttons it owns, whose listeners are
    /// dropped. Returns the released buttons.
    pub fn release(&mut self, id: ContextId) -> Vec<K> {
        self.videos.retain(|&(_, owner)| owner != id);
        let mut released = Vec::new();
        self.buttons.retain(|entry| {
            let keep = entry.owner != id;
            if !keep {
                released.push(entry.node.clone());
            }
            keep
        });
        released
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use kurbo::Rect;

    use super::*;
    use crate::config::MatchConfig;
    use crate::locate::synthetic::{Kind, SyntheticTree};
    use crate::locate::{ControlTree as _, Locator};

    /// Two stacked feed cards, each with a labeled mute button.
    fn two_cards() -> (SyntheticTree, [usize; 2], [usize; 2]) {
        let mut tree = SyntheticTree::default();
        let root = tree.add(None, Kind::Block, Rect::new(0.0, 0.0, 1200.0, 3000.0));
        let mut videos = [0; 2];
        let mut buttons = [0; 2];
        for (i, top) in [0.0, 800.0].into_iter().enumerate() {
            let player = Rect::new(0.0, top, 400.0, top + 700.0);
            let card = tree.add(Some(root), Kind::Block, player);
            videos[i] = tree.add(Some(card), Kind::Video, player);
            buttons[i] = tree.labeled(
                Some(card),
                Rect::new(360.0, top + 660.0, 392.0, top + 692.0),
                "Toggle audio",
            );
        }
        (tree, videos, buttons)
    }

    /// What one scan does: claim every video, then bind its volume button.
    fn scan(
        tree: &SyntheticTree,
        registry: &mut ContextRegistry<usize, Rc<()>>,
        listeners: &Rc<()>,
        created: &mut u32,
        installs: &mut u32,
    ) {
        let locator = Locator::new(tree, MatchConfig::new());
        for video in tree.videos() {
            let id = match registry.claim(&video) {
                Claim::Existing(id) => id,
                Claim::New(id) => {
                    *created += 1;
                    id
                }
            };
            if let Some(found) = locator.native_volume_button(&video) {
                registry.bind_button(&found.node, id, || {
                    *installs += 1;
                    Rc::clone(listeners)
                });
            }
        }
    }

    #[test]
    fn rescanning_keeps_contexts_and_listeners() {
        let (tree, videos, buttons) = two_cards();
        let mut registry = ContextRegistry::new();
        let listeners = Rc::new(());
        let (mut created, mut installs) = (0, 0);

        scan(&tree, &mut registry, &listeners, &mut created, &mut installs);
        let first = videos.map(|v| registry.context_of(&v));
        scan(&tree, &mut registry, &listeners, &mut created, &mut installs);

        assert_eq!(created, 2, "one context per video across scans");
        assert_eq!(installs, 2, "one listener set per button across scans");
        assert_eq!(registry.len(), 2);
        assert_eq!(
            videos.map(|v| registry.context_of(&v)),
            first,
            "ids are stable across scans"
        );
        assert_eq!(Rc::strong_count(&listeners), 3, "two live listener sets");
        for (video, button) in videos.iter().zip(buttons) {
            assert_eq!(
                registry.owner_of(&button),
                registry.context_of(video),
                "each button belongs to its own video's context"
            );
        }
    }

    #[test]
    fn button_moving_between_videos_changes_owner() {
        let mut registry: ContextRegistry<&str> = ContextRegistry::new();
        let Claim::New(a) = registry.claim(&"video-a") else {
            panic!("first sight of video-a");
        };
        let Claim::New(b) = registry.claim(&"video-b") else {
            panic!("first sight of video-b");
        };
        assert_ne!(a, b, "distinct videos get distinct ids");

        let first = registry.bind_button(&"mute", a, || ());
        assert!(first.installed, "first binding installs listeners");
        assert_eq!(first.previous_owner, None);

        let same = registry.bind_button(&"mute", a, || ());
        assert_eq!(same, ButtonBinding::default(), "rebinding is a no-op");

        let moved = registry.bind_button(&"mute", b, || ());
        assert!(!moved.installed, "listeners are not installed twice");
        assert_eq!(moved.previous_owner, Some(a), "old owner is reported");
        assert_eq!(registry.owner_of(&"mute"), Some(b));

        // The old owner going away does not take the button with it.
        assert!(registry.release(a).is_empty(), "a no longer owns the button");
        assert!(registry.is_bound(&"mute"), "b keeps its listeners");
    }

    #[test]
    fn release_drops_owned_buttons_and_their_listeners() {
        let mut registry = ContextRegistry::new();
        let listeners = Rc::new(());
        let Claim::New(id) = registry.claim(&1_u32) else {
            panic!("first sight");
        };
        registry.bind_button(&10, id, || Rc::clone(&listeners));
        assert_eq!(Rc::strong_count(&listeners), 2, "listeners held");

        assert_eq!(registry.release(id), vec![10], "owned button released");
        assert_eq!(Rc::strong_count(&listeners), 1, "listeners dropped");
        assert!(registry.is_empty());
        assert!(!registry.is_bound(&10));

        // A video that comes back is a new context.
        assert!(
            matches!(registry.claim(&1), Claim::New(new) if new != id),
            "re-attached video gets a fresh id"
        );
    }
}
