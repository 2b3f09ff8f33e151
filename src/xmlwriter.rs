//! A small indenting XML writer used by the COLLADA and 3MF exporters.
//! `original_source/code/ColladaExporter.cpp` emits its output by
//! hand-writing tag text with manual indentation rather than going through
//! a DOM/builder API; this is the same approach generalised into a reusable
//! helper instead of duplicated per exporter.

use std::fmt::Write as _;

pub struct XmlWriter {
    out: String,
    depth: usize,
    stack: Vec<String>,
}

impl XmlWriter {
    pub fn new() -> Self {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        XmlWriter {
            out,
            depth: 0,
            stack: Vec::new(),
        }
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    pub fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        for (key, value) in attrs {
            let _ = write!(self.out, " {key}=\"{}\"", escape_attr(value));
        }
        self.out.push_str(">\n");
        self.depth += 1;
        self.stack.push(tag.to_string());
    }

    pub fn close(&mut self) {
        self.depth -= 1;
        let tag = self.stack.pop().expect("unbalanced close()");
        self.indent();
        self.out.push_str("</");
        self.out.push_str(&tag);
        self.out.push_str(">\n");
    }

    pub fn leaf(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        for (key, value) in attrs {
            let _ = write!(self.out, " {key}=\"{}\"", escape_attr(value));
        }
        self.out.push_str("/>\n");
    }

    pub fn text_element(&mut self, tag: &str, text: &str) {
        self.indent();
        let _ = write!(self.out, "<{tag}>{}</{tag}>\n", escape_text(text));
    }

    /// Writes a line of raw text content as a child of the currently open
    /// element (used for space-separated number lists such as
    /// `<float_array>` contents).
    pub fn raw_text(&mut self, text: &str) {
        self.indent();
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub fn finish(mut self) -> String {
        while !self.stack.is_empty() {
            self.close();
        }
        self.out
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_balanced_nested_tags() {
        let mut w = XmlWriter::new();
        w.open("a", &[]);
        w.leaf("b", &[("x", "1")]);
        w.close();
        let xml = w.finish();
        assert!(xml.contains("<a>"));
        assert!(xml.contains("<b x=\"1\"/>"));
        assert!(xml.contains("</a>"));
    }

    #[test]
    fn escapes_attribute_special_characters() {
        let mut w = XmlWriter::new();
        w.leaf("x", &[("n", "a\"b<c>&d")]);
        let xml = w.finish();
        assert!(xml.contains("a&quot;b&lt;c&gt;&amp;d"));
    }
}
