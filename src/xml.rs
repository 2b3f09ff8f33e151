//! C3: a whole-document XML tree reader shared by AMF, 3MF and COLLADA.
//! Thin wrapper over `roxmltree::Document` adding typed attribute
//! accessors; numeric parsing goes through `str::parse`, which is
//! inherently locale-independent (no grouping separators, `.` decimal
//! point always), satisfying the "locale-independent parsers
//! unconditionally" redesign rule without any extra crate.

use roxmltree::{Document, Node};

use crate::error::{Error, Result};

pub struct XmlTree {
    document: Document<'static>,
}

impl XmlTree {
    /// Parses a whole XML document. The input is leaked into a
    /// `'static` buffer internally so the returned tree can outlive the
    /// original `String`/`Vec<u8>` without a lifetime parameter leaking
    /// into every codec that stores an `XmlTree`.
    pub fn parse(text: String) -> Result<Self> {
        let leaked: &'static str = Box::leak(text.into_boxed_str());
        let document = Document::parse(leaked)
            .map_err(|e| Error::malformed(format!("xml parse error: {e}")))?;
        Ok(XmlTree { document })
    }

    pub fn root_element(&self) -> XmlNode<'_> {
        XmlNode(self.document.root_element())
    }
}

#[derive(Clone, Copy)]
pub struct XmlNode<'a>(Node<'a, 'a>);

impl<'a> XmlNode<'a> {
    pub fn tag_name(&self) -> &'a str {
        self.0.tag_name().name()
    }

    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.0.attribute(name)
    }

    pub fn attribute_int(&self, name: &str) -> Option<i64> {
        self.attribute(name)?.trim().parse().ok()
    }

    pub fn attribute_uint(&self, name: &str) -> Option<u64> {
        self.attribute(name)?.trim().parse().ok()
    }

    pub fn attribute_float(&self, name: &str) -> Option<f32> {
        self.attribute(name)?.trim().parse().ok()
    }

    pub fn attribute_double(&self, name: &str) -> Option<f64> {
        self.attribute(name)?.trim().parse().ok()
    }

    pub fn attribute_bool(&self, name: &str) -> Option<bool> {
        match self.attribute(name)?.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }

    pub fn text(&self) -> &'a str {
        self.0.text().unwrap_or("").trim()
    }

    pub fn children(&self) -> impl Iterator<Item = XmlNode<'a>> {
        self.0.children().filter(|n| n.is_element()).map(XmlNode)
    }

    pub fn children_named(&self, name: &'a str) -> impl Iterator<Item = XmlNode<'a>> {
        self.children().filter(move |n| n.tag_name() == name)
    }

    pub fn child_named(&self, name: &str) -> Option<XmlNode<'a>> {
        self.children().find(|n| n.tag_name() == name)
    }

    /// Expects exactly one matching child; errors otherwise. Grounds the
    /// "typed combinator library" redesign rule (`expect-one`).
    pub fn expect_one(&self, name: &'static str) -> Result<XmlNode<'a>> {
        let mut matches = self.children_named(name);
        let first = matches
            .next()
            .ok_or_else(|| Error::malformed_at(format!("expected <{name}>"), self.tag_name().to_string()))?;
        if matches.next().is_some() {
            return Err(Error::malformed_at(
                format!("expected exactly one <{name}>"),
                self.tag_name().to_string(),
            ));
        }
        Ok(first)
    }

    /// `expect-at-most-one` combinator.
    pub fn expect_at_most_one(&self, name: &'static str) -> Result<Option<XmlNode<'a>>> {
        let mut matches = self.children_named(name);
        let first = matches.next();
        if first.is_some() && matches.next().is_some() {
            return Err(Error::malformed_at(
                format!("expected at most one <{name}>"),
                self.tag_name().to_string(),
            ));
        }
        Ok(first)
    }

    /// `expect-sequence` combinator: all matching children, in document
    /// order, with no cardinality constraint.
    pub fn expect_sequence(&self, name: &'static str) -> Vec<XmlNode<'a>> {
        self.children_named(name).collect()
    }

    /// `read-typed-leaf` combinator: reads a required float-valued leaf
    /// element's text content.
    pub fn read_float_leaf(&self, name: &'static str) -> Result<f32> {
        let node = self.expect_one(name)?;
        node.text()
            .parse()
            .map_err(|_| Error::malformed_at(format!("<{name}> is not a number"), name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_accessors_are_locale_independent() {
        let tree = XmlTree::parse(r#"<a x="3.5" n="42" b="true"/>"#.to_string()).unwrap();
        let root = tree.root_element();
        assert_eq!(root.attribute_double("x"), Some(3.5));
        assert_eq!(root.attribute_int("n"), Some(42));
        assert_eq!(root.attribute_bool("b"), Some(true));
    }

    #[test]
    fn expect_one_rejects_multiple() {
        let tree = XmlTree::parse("<a><b/><b/></a>".to_string()).unwrap();
        let root = tree.root_element();
        assert!(root.expect_one("b").is_err());
    }

    #[test]
    fn expect_sequence_collects_in_order() {
        let tree = XmlTree::parse("<a><b n=\"1\"/><b n=\"2\"/></a>".to_string()).unwrap();
        let root = tree.root_element();
        let seq = root.expect_sequence("b");
        assert_eq!(seq.len(), 2);
        assert_eq!(seq[0].attribute("n"), Some("1"));
        assert_eq!(seq[1].attribute("n"), Some("2"));
    }
}
