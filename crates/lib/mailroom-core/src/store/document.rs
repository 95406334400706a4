use std::fmt::Write;

use roxmltree::{Document, Node, NodeType};

const INDENT: &str = "    ";
const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#;

/// Owned element tree loaded from a store document.
///
/// Element names, attributes, non-blank text, comments and processing
/// instructions are kept. Whitespace-only text between elements is indentation
/// and is regenerated on save. Namespace prefixes and anything outside the
/// root element are not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<XmlNode>,
}

/// A child of an [`XmlElement`], in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Comment(String),
    Instruction { target: String, value: Option<String> },
}

impl XmlNode {
    #[must_use]
    pub const fn as_element(&self) -> Option<&XmlElement> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.text = Some(text.into());
        element
    }

    /// Appends a child element after every existing child.
    pub fn push(&mut self, element: Self) {
        self.children.push(XmlNode::Element(element));
    }

    /// Child elements, skipping comments and instructions.
    pub fn elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    /// Parses a full document and returns its root element.
    ///
    /// # Errors
    /// Returns `roxmltree::Error` if the text is not well-formed XML.
    pub fn parse(xml: &str) -> Result<Self, roxmltree::Error> {
        let doc = Document::parse(xml)?;
        Ok(Self::from_node(doc.root_element()))
    }

    fn from_node(node: Node<'_, '_>) -> Self {
        let mut element = Self::new(node.tag_name().name());
        element.attributes = node
            .attributes()
            .map(|attr| (attr.name().to_string(), attr.value().to_string()))
            .collect();

        let mut text = String::new();
        for child in node.children() {
            match child.node_type() {
                NodeType::Element => element.push(Self::from_node(child)),
                NodeType::Text => text.push_str(child.text().unwrap_or("")),
                NodeType::Comment => element
                    .children
                    .push(XmlNode::Comment(child.text().unwrap_or("").to_string())),
                NodeType::PI => {
                    if let Some(pi) = child.pi() {
                        element.children.push(XmlNode::Instruction {
                            target: pi.target.to_string(),
                            value: pi.value.map(str::to_string),
                        });
                    }
                }
                NodeType::Root => {}
            }
        }
        let text = text.trim();
        if !text.is_empty() {
            element.text = Some(text.to_string());
        }
        element
    }

    /// Concatenated text of this element and everything beneath it.
    ///
    /// Comments and instructions contribute nothing.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut output = self.text.clone().unwrap_or_default();
        for child in self.elements() {
            output.push_str(&child.text_content());
        }
        output
    }

    /// Every element named `name` below this one, in document order.
    ///
    /// The element itself is never included.
    #[must_use]
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Self> {
        let mut found = Vec::new();
        self.collect_named(name, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, name: &str, found: &mut Vec<&'a Self>) {
        for child in self.elements() {
            if child.name == name {
                found.push(child);
            }
            child.collect_named(name, found);
        }
    }

    /// First element named `name` below this one.
    #[must_use]
    pub fn first_descendant(&self, name: &str) -> Option<&Self> {
        self.elements().find_map(|child| {
            if child.name == name {
                Some(child)
            } else {
                child.first_descendant(name)
            }
        })
    }

    /// Serializes the tree as a full document with a four space indent.
    #[must_use]
    pub fn to_document_string(&self) -> String {
        let mut output = String::with_capacity(1024);
        output.push_str(DECLARATION);
        output.push('\n');
        self.write_indented(&mut output, 0);
        output
    }

    fn write_indented(&self, output: &mut String, depth: usize) {
        let indent = INDENT.repeat(depth);
        let _ = write!(output, "{indent}<{}", self.name);
        for (name, value) in &self.attributes {
            let _ = write!(output, " {name}=\"{}\"", escape(value));
        }

        match (&self.text, self.children.is_empty()) {
            (None, true) => {
                output.push_str("/>\n");
            }
            (Some(text), true) => {
                let _ = writeln!(output, ">{}</{}>", escape(text), self.name);
            }
            (text, false) => {
                output.push_str(">\n");
                if let Some(text) = text {
                    let _ = writeln!(output, "{indent}{INDENT}{}", escape(text));
                }
                for child in &self.children {
                    match child {
                        XmlNode::Element(element) => element.write_indented(output, depth + 1),
                        XmlNode::Comment(comment) => {
                            let _ = writeln!(output, "{indent}{INDENT}<!--{comment}-->");
                        }
                        XmlNode::Instruction { target, value } => {
                            let _ = match value {
                                Some(value) => {
                                    writeln!(output, "{indent}{INDENT}<?{target} {value}?>")
                                }
                                None => writeln!(output, "{indent}{INDENT}<?{target}?>"),
                            };
                        }
                    }
                }
                let _ = writeln!(output, "{indent}</{}>", self.name);
            }
        }
    }
}

/// First character of `value` that would not come back unchanged after a
/// write and reload.
///
/// XML 1.0 forbids C0 controls other than tab, line feed and carriage return,
/// and the noncharacters U+FFFE and U+FFFF. Parsers fold a carriage return
/// into a line feed.
#[must_use]
pub fn unstorable_char(value: &str) -> Option<char> {
    value.chars().find(|ch| {
        matches!(ch, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\r')
            || matches!(ch, '\u{FFFE}' | '\u{FFFF}')
    })
}

fn escape(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            _ => output.push(ch),
        }
    }
    output
}
