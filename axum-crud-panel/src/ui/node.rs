//! Renderer output tree and HTML serialization

use serde::Serialize;
use std::collections::BTreeMap;

/// A rendered node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Node {
    Element {
        tag: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        attributes: BTreeMap<String, String>,
        children: Vec<Node>,
    },
    Text {
        text: String,
    },
    Fragment {
        children: Vec<Node>,
    },
}

/// Tags that never have children or a closing tag
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];

impl Node {
    pub fn element(tag: impl Into<String>) -> Self {
        Node::Element {
            tag: tag.into(),
            key: None,
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text { text: text.into() }
    }

    pub fn fragment(children: Vec<Node>) -> Self {
        Node::Fragment { children }
    }

    /// Set an attribute (no-op on text and fragments)
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Node::Element { attributes, .. } = &mut self {
            attributes.insert(name.into(), value.into());
        }
        self
    }

    /// Append a child (no-op on text)
    pub fn child(mut self, node: Node) -> Self {
        match &mut self {
            Node::Element { children, .. } | Node::Fragment { children } => children.push(node),
            Node::Text { .. } => {}
        }
        self
    }

    /// Append several children (no-op on text)
    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        match &mut self {
            Node::Element { children, .. } | Node::Fragment { children } => children.extend(nodes),
            Node::Text { .. } => {}
        }
        self
    }

    /// Reconciliation key, if this is an element
    pub fn key(&self) -> Option<&str> {
        match self {
            Node::Element { key, .. } => key.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn set_key(&mut self, new_key: String) {
        if let Node::Element { key, .. } = self {
            *key = Some(new_key);
        }
    }

    /// Serialize to an HTML fragment
    pub fn to_html(&self) -> String {
        let mut output = String::new();
        self.write_html(&mut output);
        output
    }

    fn write_html(&self, output: &mut String) {
        match self {
            Node::Text { text } => output.push_str(&escape(text)),
            Node::Fragment { children } => {
                for child in children {
                    child.write_html(output);
                }
            }
            Node::Element {
                tag,
                key,
                attributes,
                children,
            } => {
                output.push('<');
                output.push_str(tag);
                if let Some(key) = key {
                    output.push_str(&format!(" data-key=\"{}\"", escape(key)));
                }
                for (name, value) in attributes {
                    output.push_str(&format!(" {}=\"{}\"", name, escape(value)));
                }
                output.push('>');

                if VOID_TAGS.contains(&tag.as_str()) {
                    return;
                }
                for child in children {
                    child.write_html(output);
                }
                output.push_str(&format!("</{}>", tag));
            }
        }
    }
}

/// Render a list of sibling nodes to HTML
pub fn nodes_to_html(nodes: &[Node]) -> String {
    nodes.iter().map(Node::to_html).collect()
}

/// Escape text for HTML content and double-quoted attributes
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_text_and_attributes() {
        let node = Node::element("p")
            .attr("title", "a \"quoted\" <title>")
            .child(Node::text("1 < 2 & 3"));
        assert_eq!(
            node.to_html(),
            "<p title=\"a &quot;quoted&quot; &lt;title&gt;\">1 &lt; 2 &amp; 3</p>"
        );
    }

    #[test]
    fn key_is_emitted_first() {
        let mut node = Node::element("div").attr("class", "x");
        node.set_key("Stack-0".into());
        assert_eq!(node.to_html(), "<div data-key=\"Stack-0\" class=\"x\"></div>");
    }

    #[test]
    fn void_tags_have_no_closing_tag() {
        let node = Node::element("input").attr("name", "email");
        assert_eq!(node.to_html(), "<input name=\"email\">");
    }

    #[test]
    fn fragments_flatten() {
        let node = Node::fragment(vec![Node::text("a"), Node::element("br"), Node::text("b")]);
        assert_eq!(node.to_html(), "a<br>b");
    }
}
