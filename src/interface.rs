// Copyright 2024 The html5core Developers.
// Licensed under the MIT license <LICENSE-MIT> or the Apache License,
// Version 2.0 <LICENSE-APACHE>, at your option.

//! Name interning and the qualified-name types shared by the tokenizer and
//! tree builder.
//!
//! Tag names, attribute names, and namespaces are interned with
//! [`string_cache::DefaultAtom`] rather than plain `String`s: the same small
//! set of names (`div`, `href`, the HTML/SVG/MathML namespace URIs, …)
//! recurs constantly across a document, and atom comparison is a pointer
//! compare instead of a byte compare.

use std::fmt;
use tendril::StrTendril;

/// An interned string. Used for tag names, attribute local names, namespace
/// prefixes, and namespace URIs.
pub type LocalName = string_cache::DefaultAtom;
pub type Namespace = string_cache::DefaultAtom;
pub type Prefix = string_cache::DefaultAtom;

/// Construct an interned [`Namespace`]. `ns!()` is the empty (no-namespace)
/// atom; `ns!(html)`, `ns!(svg)`, `ns!(mathml)`, `ns!(xlink)`, `ns!(xml)`,
/// and `ns!(xmlns)` are the namespaces foreign-content handling and
/// attribute adjustment care about.
#[macro_export]
macro_rules! ns {
    () => {
        $crate::interface::Namespace::from("")
    };
    (html) => {
        $crate::interface::Namespace::from("http://www.w3.org/1999/xhtml")
    };
    (svg) => {
        $crate::interface::Namespace::from("http://www.w3.org/2000/svg")
    };
    (mathml) => {
        $crate::interface::Namespace::from("http://www.w3.org/1998/Math/MathML")
    };
    (xlink) => {
        $crate::interface::Namespace::from("http://www.w3.org/1999/xlink")
    };
    (xml) => {
        $crate::interface::Namespace::from("http://www.w3.org/XML/1998/namespace")
    };
    (xmlns) => {
        $crate::interface::Namespace::from("http://www.w3.org/2000/xmlns/")
    };
}

/// Construct an interned [`LocalName`] from a bareword or string literal.
#[macro_export]
macro_rules! local_name {
    ($s:tt) => {
        $crate::interface::LocalName::from(stringify!($s))
    };
}

/// Construct an interned [`Prefix`] from a bareword or string literal.
#[macro_export]
macro_rules! namespace_prefix {
    ($s:tt) => {
        $crate::interface::Prefix::from(stringify!($s))
    };
}

/// A namespace + local name pair, the unit tag/attribute matching operates
/// on. See <https://www.w3.org/TR/REC-xml-names/#dt-expname>.
#[derive(Copy, Clone, Eq, Hash)]
pub struct ExpandedName<'a> {
    pub ns: &'a Namespace,
    pub local: &'a LocalName,
}

impl<'a, 'b> PartialEq<ExpandedName<'a>> for ExpandedName<'b> {
    fn eq(&self, other: &ExpandedName<'a>) -> bool {
        self.ns == other.ns && self.local == other.local
    }
}

impl fmt::Debug for ExpandedName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ns.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}:{}", self.ns, self.local)
        }
    }
}

/// Construct an [`ExpandedName`] from a namespace identifier (or the empty
/// namespace) and a local-name bareword, e.g. `expanded_name!(html "div")`.
#[macro_export]
macro_rules! expanded_name {
    ("", $local:tt) => {
        $crate::interface::ExpandedName {
            ns: &ns!(),
            local: &local_name!($local),
        }
    };
    ($ns:ident $local:tt) => {
        $crate::interface::ExpandedName {
            ns: &ns!($ns),
            local: &local_name!($local),
        }
    };
}

/// A fully qualified name: an optional namespace prefix (as written in the
/// source), the resolved namespace URI, and the local name.
///
/// ```text
/// <furn:table>
///    |    |
///    |    +- local name
///    |
///  prefix (resolves, via namespace declarations, to a namespace URI)
/// ```
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone)]
pub struct QualName {
    pub prefix: Option<Prefix>,
    pub ns: Namespace,
    pub local: LocalName,
}

impl QualName {
    #[inline]
    pub fn new(prefix: Option<Prefix>, ns: Namespace, local: LocalName) -> QualName {
        QualName { prefix, ns, local }
    }

    #[inline]
    pub fn expanded(&self) -> ExpandedName<'_> {
        ExpandedName {
            ns: &self.ns,
            local: &self.local,
        }
    }
}

/// A tag attribute.
///
/// The namespace on the attribute name is almost always `ns!()`. The
/// tokenizer creates all attributes this way; the tree builder adjusts
/// certain attribute names and namespaces inside foreign content (MathML,
/// SVG) per the case-fixup tables in `tag_sets`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Debug)]
pub struct Attribute {
    pub name: QualName,
    pub value: StrTendril,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ns_macro_empty() {
        assert_eq!(ns!(), Namespace::from(""));
    }

    #[test]
    fn ns_macro_html() {
        assert_eq!(ns!(html), Namespace::from("http://www.w3.org/1999/xhtml"));
    }

    #[test]
    fn qualname_expanded_roundtrips() {
        let q = QualName::new(None, ns!(html), local_name!(div));
        let e = q.expanded();
        assert_eq!(e.ns, &ns!(html));
        assert_eq!(e.local, &local_name!(div));
    }
}
