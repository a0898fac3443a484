//! # Reference extraction
//!
//! Notes are never parsed into a document model. A note's references are found by scanning
//! its text one line at a time with three independent patterns:
//!
//! | Pattern | Example | Resolves to |
//! |---|---|---|
//! | asset link | `![img](../assets/photo.png)` | `<assets root>/photo.png` |
//! | bracket link | `[[Project Alpha]]` | `<note dir>/Project Alpha.md`, if it exists |
//! | hash tag | `#standup_notes` | `<note dir>/standup_notes.md`, if it exists |
//!
//! A construct broken across a line break is not recognized.

pub mod md;

pub use md::{ReferenceExtractor, References};
