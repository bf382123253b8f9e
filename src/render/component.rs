//! Component classification and cache-key derivation.
//!
//! # Responsibilities
//! - Model the three things a page can render: a markup tree, a function
//!   component, or a page wrapper around either
//! - Adapt duck-typed JSON input into that model at the boundary
//! - Resolve a component into renderable content plus its cache key
//!
//! # Design Decisions
//! - Classification is an exhaustive match; the only structural probe is
//!   [`Component::from_json`]
//! - Cache keys are `identity + request URL`; props are not part of the key

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::render::markup::{is_tree_shape, Element, Node};
use crate::render::options::{Head, RenderConfig};

/// Cache identity used for anonymous markup trees.
pub const TREE_IDENTITY: &str = "default";

/// Error raised by a component body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ComponentError {
    pub message: String,
}

impl ComponentError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Resolution failures. These are programmer errors in the page definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("cannot render {found}: expected a markup tree with `type` and `props`")]
    Unclassifiable { found: &'static str },

    #[error("invalid {kind} name `{name}`")]
    InvalidName { kind: &'static str, name: String },
}

type RenderFn = dyn Fn(&Value) -> Result<Node, ComponentError> + Send + Sync;

/// A named pure function from props to markup.
#[derive(Clone)]
pub struct FunctionComponent {
    name: Arc<str>,
    render: Arc<RenderFn>,
}

impl FunctionComponent {
    pub fn new<F>(name: impl Into<Arc<str>>, render: F) -> Self
    where
        F: Fn(&Value) -> Result<Node, ComponentError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            render: Arc::new(render),
        }
    }

    /// The declared name; used for the cache key and the hydration bundle path.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, props: &Value) -> Result<Node, ComponentError> {
        (self.render)(props)
    }
}

impl fmt::Debug for FunctionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FunctionComponent").field(&self.name).finish()
    }
}

type LayoutFn = dyn Fn(Node, &Value) -> Result<Node, ComponentError> + Send + Sync;

/// Wraps a page's content; called with the content and the render's props.
#[derive(Clone)]
pub struct Layout(Arc<LayoutFn>);

impl Layout {
    pub fn new<F>(layout: F) -> Self
    where
        F: Fn(Node, &Value) -> Result<Node, ComponentError> + Send + Sync + 'static,
    {
        Self(Arc::new(layout))
    }

    pub fn apply(&self, children: Node, data: &Value) -> Result<Node, ComponentError> {
        (self.0)(children, data)
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Layout")
    }
}

/// A component plus page-level metadata.
#[derive(Clone, Debug)]
pub struct PageComponent {
    pub component: Box<Component>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub layout: Option<Layout>,
}

impl PageComponent {
    pub fn new(component: impl Into<Component>) -> Self {
        Self {
            component: Box::new(component.into()),
            title: None,
            description: None,
            layout: None,
        }
    }

    pub fn layout<F>(mut self, layout: F) -> Self
    where
        F: Fn(Node, &Value) -> Result<Node, ComponentError> + Send + Sync + 'static,
    {
        self.layout = Some(Layout::new(layout));
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Fill head fields the page options left unset.
    fn apply_metadata(&self, head: &mut Head) {
        if head.title.is_none() {
            head.title = self.title.clone();
        }
        if let Some(description) = &self.description {
            head.ensure_description(description);
        }
    }
}

/// Anything a page can ask the pipeline to render.
#[derive(Clone, Debug)]
pub enum Component {
    Tree(Node),
    Function(FunctionComponent),
    Page(PageComponent),
}

impl Component {
    /// Classify a duck-typed value. Only markup trees can arrive this way.
    pub fn from_json(value: &Value) -> Result<Self, ResolveError> {
        if is_tree_shape(value) {
            return Node::from_json(value).map(Component::Tree);
        }
        let found = match value {
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Array(_) => "an array",
            Value::Object(_) => "an object without `type` and `props`",
        };
        Err(ResolveError::Unclassifiable { found })
    }
}

impl From<Node> for Component {
    fn from(node: Node) -> Self {
        Component::Tree(node)
    }
}

impl From<Element> for Component {
    fn from(el: Element) -> Self {
        Component::Tree(Node::Element(el))
    }
}

impl From<FunctionComponent> for Component {
    fn from(fc: FunctionComponent) -> Self {
        Component::Function(fc)
    }
}

impl From<PageComponent> for Component {
    fn from(page: PageComponent) -> Self {
        Component::Page(page)
    }
}

/// Key of an entry in the render cache.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(identity: &str, request_url: &str) -> Self {
        Self(format!("{identity}{request_url}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What kind of component a render resolved to.
#[derive(Clone, Debug)]
pub enum ResolvedKind {
    Tree,
    Function(FunctionComponent),
}

/// A resolved component: cache key, kind, and the content for `#root`.
#[derive(Clone, Debug)]
pub struct Resolved {
    pub key: CacheKey,
    pub kind: ResolvedKind,
    pub content: Node,
    /// Page layouts to wrap `content` in, innermost first.
    pub layouts: Vec<Layout>,
}

impl Resolved {
    /// Wrap the content in every layout.
    pub fn laid_out(content: Node, layouts: &[Layout], data: &Value) -> Result<Node, ComponentError> {
        layouts
            .iter()
            .try_fold(content, |children, layout| layout.apply(children, data))
    }
}

/// Resolve a component for `request_url`, unwrapping page wrappers.
pub fn resolve(component: &Component, config: &mut RenderConfig, request_url: &str) -> Resolved {
    match component {
        Component::Tree(node) => Resolved {
            key: CacheKey::new(TREE_IDENTITY, request_url),
            kind: ResolvedKind::Tree,
            content: node.clone(),
            layouts: Vec::new(),
        },
        Component::Function(fc) => Resolved {
            key: CacheKey::new(fc.name(), request_url),
            kind: ResolvedKind::Function(fc.clone()),
            content: Node::component(fc.clone(), config.props.clone()),
            layouts: Vec::new(),
        },
        Component::Page(page) => {
            page.apply_metadata(&mut config.html.head);
            let mut resolved = resolve(&page.component, config, request_url);
            resolved.layouts.extend(page.layout.clone());
            resolved
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderDefaults;
    use crate::render::markup::element;
    use crate::render::options::RenderOptions;
    use serde_json::json;

    fn config() -> RenderConfig {
        RenderOptions::default().normalize(&RenderDefaults::default())
    }

    fn greet() -> FunctionComponent {
        FunctionComponent::new("Greet", |props| {
            Ok(Node::text(format!("Hello {}", props["user"].as_str().unwrap_or("?"))))
        })
    }

    #[test]
    fn test_tree_uses_sentinel_identity() {
        let component = Component::from(element("p").child("hi"));
        let resolved = resolve(&component, &mut config(), "/about");
        assert_eq!(resolved.key.as_str(), "default/about");
        assert!(matches!(resolved.kind, ResolvedKind::Tree));
    }

    #[test]
    fn test_function_uses_its_name() {
        let resolved = resolve(&greet().into(), &mut config(), "/greet");
        assert_eq!(resolved.key.as_str(), "Greet/greet");
        assert!(matches!(resolved.kind, ResolvedKind::Function(ref fc) if fc.name() == "Greet"));
        assert!(matches!(resolved.content, Node::Component { .. }));
    }

    #[test]
    fn test_page_unwraps_to_inner_component() {
        let page = PageComponent::new(greet()).title("Greeting").description("Says hi");
        let mut config = config();
        let resolved = resolve(&page.into(), &mut config, "/greet");

        assert_eq!(resolved.key.as_str(), "Greet/greet");
        assert_eq!(config.html.head.title.as_deref(), Some("Greeting"));
        assert_eq!(config.html.head.meta[0].name.as_deref(), Some("description"));
    }

    #[test]
    fn test_page_around_tree() {
        let page = PageComponent::new(element("main"));
        let resolved = resolve(&page.into(), &mut config(), "/");
        assert_eq!(resolved.key.as_str(), "default/");
    }

    #[test]
    fn test_nested_page_layouts_apply_innermost_first() {
        let inner = PageComponent::new(element("p").child("hi"))
            .layout(|children, _| Ok(element("main").child(children).into()));
        let outer = PageComponent::new(inner)
            .layout(|children, data| {
                let theme = data["theme"].as_str().unwrap_or("plain").to_string();
                Ok(element("div").attr("class", theme).child(children).into())
            });

        let resolved = resolve(&outer.into(), &mut config(), "/");
        assert_eq!(resolved.layouts.len(), 2);

        let wrapped = Resolved::laid_out(resolved.content, &resolved.layouts, &json!({"theme": "dark"})).unwrap();
        let Node::Element(div) = wrapped else {
            panic!("expected outer layout element");
        };
        assert_eq!(div.get_attr("class"), Some("dark"));
        assert!(matches!(&div.children[0], Node::Element(main) if main.tag == "main"));
    }

    #[test]
    fn test_layout_error_propagates() {
        let layouts = vec![Layout::new(|_, _| Err(ComponentError::new("no layout")))];
        let err = Resolved::laid_out(Node::text("x"), &layouts, &json!({})).unwrap_err();
        assert_eq!(err.message, "no layout");
    }

    #[test]
    fn test_page_title_does_not_override_options() {
        let mut config = config();
        config.html.head.title = Some("Explicit".into());
        let page = PageComponent::new(greet()).title("From page");
        resolve(&page.into(), &mut config, "/");
        assert_eq!(config.html.head.title.as_deref(), Some("Explicit"));
    }

    #[test]
    fn test_distinct_names_do_not_collide() {
        let other = FunctionComponent::new("Farewell", |_| Ok(Node::text("bye")));
        let a = resolve(&greet().into(), &mut config(), "/x").key;
        let b = resolve(&other.into(), &mut config(), "/x").key;
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_json_classification() {
        assert!(matches!(
            Component::from_json(&json!({"type": "div", "props": {}})),
            Ok(Component::Tree(_))
        ));
        assert_eq!(
            Component::from_json(&json!(42)).unwrap_err(),
            ResolveError::Unclassifiable { found: "a number" }
        );
        assert!(Component::from_json(&json!({"type": "div"})).is_err());
    }
}
