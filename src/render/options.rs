//! Render options and their normalization.
//!
//! # Responsibilities
//! - Describe the partial options a page hands to the renderer
//! - Merge them with server defaults into a complete [`RenderConfig`]
//!
//! # Design Decisions
//! - Normalization is total: every gap is filled, nothing is rejected
//! - Every list the pipeline appends to exists after normalization
//! - Idempotent: feeding a normalized config back yields the same config

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::RenderDefaults;
use crate::render::markup::StyleMap;
use crate::render::stream::ErrorHook;

/// A `<meta>` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub property: Option<String>,
    pub name: Option<String>,
    pub content: Option<String>,
    pub itemprop: Option<String>,
    pub charset: Option<String>,
}

impl Meta {
    pub fn named(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn charset(charset: impl Into<String>) -> Self {
        Self {
            charset: Some(charset.into()),
            ..Default::default()
        }
    }
}

/// A `<link>` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub href: Option<String>,
    pub integrity: Option<String>,
    pub rel: Option<String>,
    #[serde(rename = "as")]
    pub as_: Option<String>,
    pub onload: Option<String>,
    pub media: Option<String>,
    pub crossorigin: Option<String>,
}

/// A `<script>` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Script {
    pub src: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub crossorigin: Option<String>,
    pub nonce: Option<String>,
    pub integrity: Option<String>,
}

impl Script {
    pub fn src(src: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            ..Default::default()
        }
    }
}

/// Attributes of the `#root` container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootAttributes {
    pub class: Option<String>,
    pub style: Option<StyleMap>,
}

/// Partial `<head>` description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadOptions {
    pub title: Option<String>,
    pub descriptions: Option<String>,
    pub meta: Option<Vec<Meta>>,
    pub link: Option<Vec<Link>>,
    pub script: Option<Vec<Script>>,
    pub no_script_link: Option<Link>,
    pub head_style: Option<String>,
    pub head_script: Option<String>,
}

/// Partial `<body>` description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyOptions {
    pub theme: Option<String>,
    pub class: Option<String>,
    pub style: Option<StyleMap>,
    pub script: Option<Vec<Script>>,
    pub root: Option<RootAttributes>,
}

/// Partial document description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlOptions {
    pub lang: Option<String>,
    pub class: Option<String>,
    pub style: Option<StyleMap>,
    pub head: Option<HeadOptions>,
    pub body: Option<BodyOptions>,
}

/// Options supplied by a page for one render. Any subset may be set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub status: Option<u16>,
    pub page_folder: Option<String>,
    pub cache: Option<bool>,
    pub development: Option<bool>,
    pub hydrate: Option<bool>,
    pub props: Value,
    pub html: Option<HtmlOptions>,
    #[serde(skip)]
    pub on_error: Option<ErrorHook>,
    #[serde(skip)]
    pub cancel: Option<CancellationToken>,
}

/// Normalized `<head>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Head {
    pub title: Option<String>,
    pub descriptions: Option<String>,
    pub meta: Vec<Meta>,
    pub link: Vec<Link>,
    pub script: Vec<Script>,
    pub no_script_link: Option<Link>,
    pub head_style: Option<String>,
    pub head_script: Option<String>,
}

impl Head {
    /// Prepend a description meta unless one is already present.
    pub fn ensure_description(&mut self, description: &str) {
        let present = self
            .meta
            .iter()
            .any(|m| m.name.as_deref() == Some("description"));
        if !present {
            self.meta.insert(0, Meta::named("description", description));
        }
    }
}

/// Normalized `<body>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyConfig {
    pub theme: Option<String>,
    pub class: Option<String>,
    pub style: Option<StyleMap>,
    pub script: Vec<Script>,
    pub root: RootAttributes,
}

/// Normalized document description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlDocument {
    pub lang: Option<String>,
    pub class: Option<String>,
    pub style: Option<StyleMap>,
    pub head: Head,
    pub body: BodyConfig,
}

/// Complete configuration owned by one render invocation.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub status: StatusCode,
    pub page_folder: String,
    pub cache: bool,
    pub development: bool,
    pub hydrate: bool,
    pub props: Value,
    pub html: HtmlDocument,
    pub on_error: Option<ErrorHook>,
    pub cancel: Option<CancellationToken>,
}

fn default_meta() -> Vec<Meta> {
    vec![
        Meta::charset("utf-8"),
        Meta::named("viewport", "width=device-width, initial-scale=1.0"),
    ]
}

impl RenderOptions {
    /// Merge with defaults into a complete configuration.
    pub fn normalize(self, defaults: &RenderDefaults) -> RenderConfig {
        let status = self
            .status
            .or(Some(defaults.status))
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::OK);

        let html = self.html.unwrap_or_default();
        let head = html.head.unwrap_or_default();
        let body = html.body.unwrap_or_default();

        let mut head = Head {
            title: head.title,
            descriptions: head.descriptions,
            meta: head.meta.unwrap_or_else(default_meta),
            link: head.link.unwrap_or_default(),
            script: head.script.unwrap_or_default(),
            no_script_link: head.no_script_link,
            head_style: head.head_style,
            head_script: head.head_script,
        };
        if let Some(description) = head.descriptions.clone() {
            head.ensure_description(&description);
        }

        RenderConfig {
            status,
            page_folder: self
                .page_folder
                .unwrap_or_else(|| defaults.page_folder.clone()),
            cache: self.cache.unwrap_or(defaults.cache),
            development: self.development.unwrap_or(defaults.development),
            hydrate: self.hydrate.unwrap_or(defaults.hydrate),
            props: self.props,
            html: HtmlDocument {
                lang: html.lang,
                class: html.class,
                style: html.style,
                head,
                body: BodyConfig {
                    theme: body.theme,
                    class: body.class,
                    style: body.style,
                    script: body.script.unwrap_or_default(),
                    root: body.root.unwrap_or_default(),
                },
            },
            on_error: self.on_error,
            cancel: self.cancel,
        }
    }
}

impl From<RenderConfig> for RenderOptions {
    fn from(config: RenderConfig) -> Self {
        let HtmlDocument {
            lang,
            class,
            style,
            head,
            body,
        } = config.html;

        Self {
            status: Some(config.status.as_u16()),
            page_folder: Some(config.page_folder),
            cache: Some(config.cache),
            development: Some(config.development),
            hydrate: Some(config.hydrate),
            props: config.props,
            html: Some(HtmlOptions {
                lang,
                class,
                style,
                head: Some(HeadOptions {
                    title: head.title,
                    descriptions: head.descriptions,
                    meta: Some(head.meta),
                    link: Some(head.link),
                    script: Some(head.script),
                    no_script_link: head.no_script_link,
                    head_style: head.head_style,
                    head_script: head.head_script,
                }),
                body: Some(BodyOptions {
                    theme: body.theme,
                    class: body.class,
                    style: body.style,
                    script: Some(body.script),
                    root: Some(body.root),
                }),
            }),
            on_error: config.on_error,
            cancel: config.cancel,
        }
    }
}
