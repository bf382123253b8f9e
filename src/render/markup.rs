//! In-memory markup tree.
//!
//! A [`Node`] is what components produce and what the stream renderer
//! serializes. Component nodes stay unevaluated until the renderer reaches
//! them, so a failing component only costs its own subtree.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::render::component::{FunctionComponent, ResolveError};

/// Inline style declarations, rendered as `name:value;` pairs.
pub type StyleMap = BTreeMap<String, String>;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Whether `name` is safe to write unescaped as a tag or attribute name.
///
/// Allows ASCII letters, digits and `-_:.`, starting with a letter.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

fn checked_name(kind: &'static str, name: &str) -> Result<(), ResolveError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(ResolveError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}

/// A node in the markup tree.
#[derive(Clone, Debug)]
pub enum Node {
    /// A tagged element with attributes and children.
    Element(Element),
    /// Text content, escaped on output.
    Text(String),
    /// Pre-escaped HTML written as-is.
    Raw(String),
    /// A list of siblings without a wrapper element.
    Fragment(Vec<Node>),
    /// A function component evaluated while streaming.
    Component {
        component: FunctionComponent,
        props: Value,
    },
}

/// An element node: type tag, attribute bag, children.
#[derive(Clone, Debug, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// Start building an element.
pub fn element(tag: impl Into<String>) -> Element {
    Element {
        tag: tag.into(),
        ..Default::default()
    }
}

impl Element {
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Add the attribute only when a value is present.
    pub fn attr_opt<V: Into<String>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.attr(name, v),
            None => self,
        }
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    /// Look up an attribute value by name.
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn raw(html: impl Into<String>) -> Self {
        Node::Raw(html.into())
    }

    pub fn component(component: FunctionComponent, props: Value) -> Self {
        Node::Component { component, props }
    }

    /// Build a tree from its duck-typed JSON form.
    ///
    /// Objects must carry both `type` and `props`; `props.children` holds
    /// child nodes and every other prop becomes an attribute. Strings and
    /// numbers become text, arrays become fragments, `null` is empty.
    pub fn from_json(value: &Value) -> Result<Self, ResolveError> {
        match value {
            Value::Null => Ok(Node::Fragment(Vec::new())),
            Value::String(s) => Ok(Node::Text(s.clone())),
            Value::Number(n) => Ok(Node::Text(n.to_string())),
            Value::Bool(b) => Ok(Node::Text(b.to_string())),
            Value::Array(items) => items
                .iter()
                .map(Node::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Node::Fragment),
            Value::Object(map) => element_from_json(map).map(Node::Element),
        }
    }
}

/// Whether a JSON value has the shape of a markup tree.
pub(crate) fn is_tree_shape(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            matches!(map.get("type"), Some(t) if !t.is_null())
                && matches!(map.get("props"), Some(p) if !p.is_null())
        }
        _ => false,
    }
}

fn element_from_json(map: &Map<String, Value>) -> Result<Element, ResolveError> {
    let (tag, props) = match (map.get("type"), map.get("props")) {
        (Some(Value::String(tag)), Some(Value::Object(props))) => (tag, props),
        _ => return Err(ResolveError::Unclassifiable { found: "object" }),
    };

    checked_name("tag", tag)?;
    let mut el = element(tag.as_str());
    for (name, value) in props {
        if name == "children" {
            match value {
                Value::Array(items) => {
                    for item in items {
                        el.children.push(Node::from_json(item)?);
                    }
                }
                other => el.children.push(Node::from_json(other)?),
            }
            continue;
        }

        let name = if name == "className" { "class" } else { name.as_str() };
        checked_name("attribute", name)?;
        match value {
            Value::Null | Value::Bool(false) => {}
            Value::Bool(true) => el.attrs.push((name.to_string(), String::new())),
            Value::String(s) => el.attrs.push((name.to_string(), s.clone())),
            Value::Number(n) => el.attrs.push((name.to_string(), n.to_string())),
            Value::Object(style) if name == "style" => {
                let style: StyleMap = style
                    .iter()
                    .map(|(k, v)| (k.clone(), json_scalar(v)))
                    .collect();
                el.attrs.push(("style".to_string(), style_attr(&style)));
            }
            other => el.attrs.push((name.to_string(), other.to_string())),
        }
    }
    Ok(el)
}

fn json_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a style map as an inline `style` attribute value.
pub fn style_attr(style: &StyleMap) -> String {
    style
        .iter()
        .map(|(k, v)| format!("{k}:{v};"))
        .collect::<String>()
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text)
    }
}

impl From<Vec<Node>> for Node {
    fn from(nodes: Vec<Node>) -> Self {
        Node::Fragment(nodes)
    }
}
