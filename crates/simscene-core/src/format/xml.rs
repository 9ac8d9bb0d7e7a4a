//! Minimal indenting XML writer

use std::fmt::Display;

use glam::{Quat, Vec3};

/// Appends XML to a string buffer with two-space indentation
#[derive(Debug, Default)]
pub struct XmlWriter {
    out: String,
    stack: Vec<String>,
}

impl XmlWriter {
    pub fn new() -> Self {
        let mut writer = Self::default();
        writer.out.push_str("<?xml version=\"1.0\"?>\n");
        writer
    }

    fn indent(&mut self) {
        for _ in 0..self.stack.len() {
            self.out.push_str("  ");
        }
    }

    /// Open an element with attributes
    pub fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        for (key, value) in attrs {
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            self.out.push_str(&escape(value));
            self.out.push('"');
        }
        self.out.push_str(">\n");
        self.stack.push(tag.to_string());
    }

    /// Close the innermost open element
    pub fn close(&mut self) {
        if let Some(tag) = self.stack.pop() {
            self.indent();
            self.out.push_str("</");
            self.out.push_str(&tag);
            self.out.push_str(">\n");
        }
    }

    /// `<tag>value</tag>`
    pub fn leaf(&mut self, tag: &str, value: impl Display) {
        self.indent();
        self.out.push_str(&format!("<{tag}>{}</{tag}>\n", escape(&value.to_string())));
    }

    pub fn opt_leaf(&mut self, tag: &str, value: Option<impl Display>) {
        if let Some(value) = value {
            self.leaf(tag, value);
        }
    }

    pub fn vec3(&mut self, tag: &str, v: Vec3) {
        self.open(tag, &[]);
        self.leaf("x", v.x);
        self.leaf("y", v.y);
        self.leaf("z", v.z);
        self.close();
    }

    pub fn quat(&mut self, tag: &str, q: Quat) {
        self.open(tag, &[]);
        self.leaf("x", q.x);
        self.leaf("y", q.y);
        self.leaf("z", q.z);
        self.leaf("w", q.w);
        self.close();
    }

    /// Color with an opaque alpha channel
    pub fn rgba(&mut self, tag: &str, rgb: [f32; 3]) {
        self.open(tag, &[]);
        self.leaf("r", rgb[0]);
        self.leaf("g", rgb[1]);
        self.leaf("b", rgb[2]);
        self.leaf("a", 1.0);
        self.close();
    }

    /// Close all open elements and return the document
    pub fn finish(mut self) -> String {
        while !self.stack.is_empty() {
            self.close();
        }
        self.out
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_output() {
        let mut xml = XmlWriter::new();
        xml.open("node", &[("name", "a<b")]);
        xml.leaf("index", 3);
        xml.vec3("pivot", Vec3::new(0.0, 0.5, -1.0));
        let out = xml.finish();

        assert!(out.starts_with("<?xml version=\"1.0\"?>\n<node name=\"a&lt;b\">\n"));
        assert!(out.contains("  <index>3</index>\n"));
        assert!(out.contains("    <y>0.5</y>\n"));
        assert!(out.ends_with("</node>\n"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("R&D \"x\""), "R&amp;D &quot;x&quot;");
    }
}
