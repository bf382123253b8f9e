//! Full HTML document assembly.
//!
//! Wraps the resolved content in `<html>`, a `<head>` built from the
//! normalized head description, and a `<body>` holding the `#root`
//! container followed by the body scripts.

use crate::render::markup::{element, style_attr, Element, Node};
use crate::render::options::{HtmlDocument, Link, Meta, Script};

const DEFAULT_THEME: &str = "dark";

/// Assemble the document tree around `content`.
pub fn assemble(html: &HtmlDocument, content: Node) -> Node {
    element("html")
        .attr_opt("lang", html.lang.as_deref())
        .attr_opt("class", html.class.as_deref())
        .attr_opt("style", html.style.as_ref().map(style_attr))
        .child(head(html))
        .child(body(html, content))
        .into()
}

fn head(html: &HtmlDocument) -> Element {
    let head = &html.head;
    let mut el = element("head");

    if let Some(title) = &head.title {
        el = el.child(element("title").child(title.as_str()));
    }
    el = el.children(head.meta.iter().map(meta));
    el = el.children(head.link.iter().map(link));
    if let Some(no_script) = &head.no_script_link {
        el = el.child(
            element("noscript").child(
                element("link")
                    .attr_opt("rel", no_script.rel.as_deref())
                    .attr_opt("href", no_script.href.as_deref()),
            ),
        );
    }
    if let Some(style) = &head.head_style {
        el = el.child(element("style").child(Node::raw(style.as_str())));
    }
    el = el.children(head.script.iter().map(|s| script(s, true)));
    if let Some(inline) = &head.head_script {
        el = el.child(element("script").child(Node::raw(inline.as_str())));
    }
    el
}

fn body(html: &HtmlDocument, content: Node) -> Element {
    let body = &html.body;
    let root = element("div")
        .attr("id", "root")
        .attr_opt("class", body.root.class.as_deref())
        .attr_opt("style", body.root.style.as_ref().map(style_attr))
        .attr("data-color-mode", "auto")
        .attr("data-light-theme", "light")
        .attr("data-dark-theme", "dark")
        .child(content);

    element("body")
        .attr("data-bs-theme", body.theme.as_deref().unwrap_or(DEFAULT_THEME))
        .attr_opt("class", body.class.as_deref())
        .attr_opt("style", body.style.as_ref().map(style_attr))
        .child(root)
        .children(body.script.iter().map(|s| script(s, false)))
}

fn meta(m: &Meta) -> Element {
    element("meta")
        .attr_opt("property", m.property.as_deref())
        .attr_opt("name", m.name.as_deref())
        .attr_opt("content", m.content.as_deref())
        .attr_opt("itemprop", m.itemprop.as_deref())
        .attr_opt("charset", m.charset.as_deref())
}

fn link(l: &Link) -> Element {
    element("link")
        .attr_opt("href", l.href.as_deref())
        .attr_opt("integrity", l.integrity.as_deref())
        .attr_opt("rel", l.rel.as_deref())
        .attr_opt("as", l.as_.as_deref())
        .attr_opt("onload", l.onload.as_deref())
        .attr_opt("media", l.media.as_deref())
        .attr_opt("crossorigin", l.crossorigin.as_deref())
}

// Head scripts may carry an integrity hash; body scripts never do.
fn script(s: &Script, in_head: bool) -> Element {
    let el = element("script")
        .attr_opt("src", s.src.as_deref())
        .attr_opt("type", s.type_.as_deref())
        .attr_opt("crossorigin", s.crossorigin.as_deref())
        .attr_opt("nonce", s.nonce.as_deref());
    if in_head {
        el.attr_opt("integrity", s.integrity.as_deref())
    } else {
        el
    }
}
