// Copyright 2026 the Lineweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `TextStore` contract (spec.md s:6). The authoritative character
//! sequence lives outside this crate; the engine only ever sees it
//! through this trait, and only ever mutates its own geometry in
//! response to an [`EditDelta`] the host reports after applying an edit
//! to the store itself.

use core::ops::Range;

/// A single text edit, reported in pre-edit coordinates: `range` is the
/// span that was replaced *before* the edit, and `delta` is
/// `new_length - range.len()`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EditDelta {
    pub range: Range<usize>,
    pub delta: i64,
}

impl EditDelta {
    pub fn new(range: Range<usize>, delta: i64) -> Self {
        Self { range, delta }
    }

    /// The same span, in post-edit coordinates.
    pub fn new_range(&self) -> Range<usize> {
        let new_len = (self.range.len() as i64 + self.delta).max(0) as usize;
        self.range.start..self.range.start + new_len
    }
}

/// The authoritative character sequence. Indexing is in UTF-16 code
/// units, matching the host platform's typesetter and the wire semantics
/// callers expect (spec.md s:6).
pub trait TextStore {
    /// Total length, in UTF-16 code units.
    fn length(&self) -> usize;

    /// Replaces `range` with `text`, in place.
    fn replace_characters(&mut self, range: Range<usize>, text: &str);

    /// The characters in `range`. Clamped to document bounds by callers;
    /// implementations may panic on an out-of-bounds range.
    fn substring(&self, range: Range<usize>) -> String;

    /// A single named attribute at a character position (style,
    /// annotation, etc). Attribute production itself -- syntax
    /// highlighting, spell-check ranges -- is an external collaborator
    /// (spec.md s:1); this is a narrow pass-through so a typesetter can
    /// ask "what style applies here" without the engine knowing what
    /// attributes mean.
    fn attribute(&self, key: &str, at: usize) -> Option<String>;
}

/// Observer for the two events the engine publishes (spec.md s:6).
/// Implementations must not mutate engine state synchronously from
/// within these callbacks -- that is a re-entrant call and a programming
/// error (spec.md s:5).
pub trait EngineObserver {
    fn text_did_change(&mut self) {}
    fn selection_did_change(&mut self) {}
}

/// A synchronous, ordered observer list owned by the publisher, per the
/// "no global notification bus" redesign (spec.md s:9). Each publisher
/// (`LayoutManager` for `text_did_change`, `SelectionManager` for
/// `selection_did_change`) owns one of these rather than routing through
/// shared global state.
#[derive(Default)]
pub struct ObserverList<O: ?Sized> {
    observers: Vec<Box<O>>,
}

impl<O: ?Sized> ObserverList<O> {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<O>) {
        self.observers.push(observer);
    }

    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut O)) {
        for observer in &mut self.observers {
            f(observer.as_mut());
        }
    }
}

impl<O: ?Sized> core::fmt::Debug for ObserverList<O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObserverList")
            .field("count", &self.observers.len())
            .finish()
    }
}

#[cfg(feature = "testing")]
pub mod testing {
    //! An in-memory `TextStore` over a plain `String`, standing in for
    //! the host's real character store in tests.

    use super::*;

    #[derive(Debug, Default)]
    pub struct StubTextStore {
        contents: String,
    }

    impl StubTextStore {
        pub fn new(contents: impl Into<String>) -> Self {
            Self {
                contents: contents.into(),
            }
        }

        pub fn as_str(&self) -> &str {
            &self.contents
        }

        fn byte_range(&self, units: Range<usize>) -> Range<usize> {
            let mut seen = 0usize;
            let mut start_byte = self.contents.len();
            let mut end_byte = self.contents.len();
            let mut found_start = units.start == 0;
            if found_start {
                start_byte = 0;
            }
            for (byte, ch) in self.contents.char_indices() {
                if !found_start && seen >= units.start {
                    start_byte = byte;
                    found_start = true;
                }
                if seen >= units.end {
                    end_byte = byte;
                    return start_byte..end_byte;
                }
                seen += ch.len_utf16();
            }
            if !found_start {
                start_byte = self.contents.len();
            }
            start_byte..end_byte
        }

        /// Applies a replacement directly and returns the `EditDelta` a
        /// host would report after performing the same edit.
        pub fn replace_and_describe(&mut self, range: Range<usize>, text: &str) -> EditDelta {
            let old_len = range.len();
            self.replace_characters(range.clone(), text);
            let new_len = text.encode_utf16().count();
            EditDelta::new(range, new_len as i64 - old_len as i64)
        }
    }

    impl TextStore for StubTextStore {
        fn length(&self) -> usize {
            self.contents.encode_utf16().count()
        }

        fn replace_characters(&mut self, range: Range<usize>, text: &str) {
            let bytes = self.byte_range(range);
            self.contents.replace_range(bytes, text);
        }

        fn substring(&self, range: Range<usize>) -> String {
            let bytes = self.byte_range(range);
            self.contents[bytes].to_string()
        }

        fn attribute(&self, _key: &str, _at: usize) -> Option<String> {
            None
        }
    }
}
