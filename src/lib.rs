// Copyright 2024 The html5core Developers.
// Licensed under the MIT license <LICENSE-MIT> or the Apache License,
// Version 2.0 <LICENSE-APACHE>, at your option.

//! A standards-compliant HTML5 tokenizer and tree builder.
//!
//! This crate implements the WHATWG HTML parsing algorithm: a byte-level
//! tokenizer, a tree-construction engine driven by insertion modes, a
//! character-reference decoder, and an encoding sniffer. It produces a
//! document tree compatible with the html5lib test format. Script
//! execution, dynamic DOM mutation, XPath, and XML validation are out of
//! scope; script contents are lexed as opaque text.

#![allow(clippy::too_many_arguments)]

#[macro_use]
mod macros;

pub mod interface;
pub mod util {
    pub mod buffer_queue;
    pub mod smallcharset;
    pub mod str;
}

pub mod encoding;
pub mod entities;
pub mod tokenizer;
pub mod tree_builder;

pub mod rcdom;
pub mod serialize;

mod driver;

pub use crate::driver::{parse, parse_bytes, parse_fragment, parse_fragment_bytes};
pub use crate::driver::{CoreError, ParseError, ParseOpts, ParsedDocument};
pub use crate::interface::{Attribute, ExpandedName, LocalName, Namespace, Prefix, QualName};

/// Re-export of the tendril buffer type used throughout the public API.
pub mod tendril {
    pub use tendril::*;
}
