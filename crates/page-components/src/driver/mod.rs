// Native driver facade
//
// The capability set this crate needs from a browser-automation session. Concrete sessions
// (a WebDriver client, a CDP adapter, an in-memory fake for tests) implement `NativeDriver`;
// everything above this module only speaks in terms of `By` descriptors and opaque `ElementRef`s.
//
// Architecture:
// - `NativeDriver` is object safe and used as `Arc<dyn NativeDriver>` by `ExecutionContext`
// - Element references are plain ids; validity can only be tested by probing (see `ext::is_stale`)
// - Detached references must surface as `Error::StaleElement` so the locator layer can re-resolve

pub mod ext;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// An immutable locator descriptor: a selector strategy plus its value.
///
/// # Example
///
/// ```ignore
/// use page_components::By;
///
/// let by = By::css("button[type='submit']");
/// assert_eq!(by.to_string(), "By.CssSelector: button[type='submit']");
///
/// // Plain strings are treated as CSS selectors
/// let by: By = "#login".into();
/// assert_eq!(by, By::Css("#login".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "using", content = "value", rename_all = "camelCase")]
pub enum By {
    /// CSS selector
    Css(String),
    /// XPath expression
    XPath(String),
    /// Element id attribute
    Id(String),
    /// Element name attribute
    Name(String),
    /// Single CSS class name
    ClassName(String),
    /// Tag name
    TagName(String),
    /// Exact anchor text
    LinkText(String),
    /// Substring of anchor text
    PartialLinkText(String),
}

impl By {
    pub fn css(selector: impl Into<String>) -> Self {
        By::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        By::XPath(expression.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        By::Id(id.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        By::Name(name.into())
    }

    pub fn class_name(class: impl Into<String>) -> Self {
        By::ClassName(class.into())
    }

    pub fn tag_name(tag: impl Into<String>) -> Self {
        By::TagName(tag.into())
    }

    pub fn link_text(text: impl Into<String>) -> Self {
        By::LinkText(text.into())
    }

    pub fn partial_link_text(text: impl Into<String>) -> Self {
        By::PartialLinkText(text.into())
    }

    /// Strategy name as rendered in descriptions
    pub fn strategy(&self) -> &'static str {
        match self {
            By::Css(_) => "CssSelector",
            By::XPath(_) => "XPath",
            By::Id(_) => "Id",
            By::Name(_) => "Name",
            By::ClassName(_) => "ClassName",
            By::TagName(_) => "TagName",
            By::LinkText(_) => "LinkText",
            By::PartialLinkText(_) => "PartialLinkText",
        }
    }

    /// The selector value
    pub fn value(&self) -> &str {
        match self {
            By::Css(v)
            | By::XPath(v)
            | By::Id(v)
            | By::Name(v)
            | By::ClassName(v)
            | By::TagName(v)
            | By::LinkText(v)
            | By::PartialLinkText(v) => v,
        }
    }
}

impl fmt::Display for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "By.{}: {}", self.strategy(), self.value())
    }
}

impl From<&str> for By {
    fn from(selector: &str) -> Self {
        By::Css(selector.to_string())
    }
}

impl From<String> for By {
    fn from(selector: String) -> Self {
        By::Css(selector)
    }
}

impl From<&By> for By {
    fn from(by: &By) -> Self {
        by.clone()
    }
}

/// Opaque reference to a DOM node owned by the browser session.
///
/// Cloning is cheap (`Arc<str>`). A reference becomes invalid when its node is detached or
/// replaced; the only way to find out is to use it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(Arc<str>);

impl ElementRef {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// The driver-assigned id of this reference
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Top-left position of an element in CSS pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

/// Rendered size of an element in CSS pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i64,
    pub height: i64,
}

/// The browser-automation session capability set.
///
/// `scope` arguments restrict a search to descendants of the given reference; `None` searches
/// the currently selected document (top-level or the entered frame).
///
/// Implementations report detached references as `Error::StaleElement` and session failures as
/// `Error::Transport`/`Error::Protocol`. They must not retry internally: polling is owned by the
/// locator layer.
#[async_trait]
pub trait NativeDriver: Send + Sync {
    /// Returns all nodes matching `by`, in document order. An empty vector means no match.
    async fn find_elements(&self, scope: Option<&ElementRef>, by: &By) -> Result<Vec<ElementRef>>;

    /// Returns the first node matching `by`, if any.
    async fn find_element(&self, scope: Option<&ElementRef>, by: &By) -> Result<Option<ElementRef>> {
        Ok(self.find_elements(scope, by).await?.into_iter().next())
    }

    async fn click(&self, element: &ElementRef) -> Result<()>;

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<()>;

    async fn clear(&self, element: &ElementRef) -> Result<()>;

    async fn submit(&self, element: &ElementRef) -> Result<()>;

    /// Moves the pointer over the element
    async fn hover(&self, element: &ElementRef) -> Result<()>;

    async fn text(&self, element: &ElementRef) -> Result<String>;

    async fn tag_name(&self, element: &ElementRef) -> Result<String>;

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool>;

    async fn is_selected(&self, element: &ElementRef) -> Result<bool>;

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool>;

    async fn location(&self, element: &ElementRef) -> Result<Point>;

    async fn size(&self, element: &ElementRef) -> Result<Size>;

    async fn get_attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>>;

    async fn get_css_value(&self, element: &ElementRef, name: &str) -> Result<String>;

    async fn get_property(&self, element: &ElementRef, name: &str) -> Result<Option<String>>;

    /// Executes `script` in the selected document. `args` are exposed as `arguments[n]`.
    async fn execute_script(&self, script: &str, args: &[ElementRef]) -> Result<Value>;

    async fn switch_to_frame(&self, frame: &ElementRef) -> Result<()>;

    async fn switch_to_default_content(&self) -> Result<()>;

    async fn navigate(&self, url: &str) -> Result<()>;
}
