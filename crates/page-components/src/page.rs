// Page composition helpers
//
// Page objects group the handles of one screen, components group the handles under one root
// element, and component lists turn every member of a collection into a component.

use crate::assertions::ElementsVerification;
use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::locator::{Element, Elements};
use std::fmt;
use std::marker::PhantomData;
use url::Url;

/// A screen reachable by URL.
///
/// # Example
///
/// ```ignore
/// use page_components::{Element, ExecutionContext, PageObject, open_page};
///
/// struct LoginPage {
///     ctx: ExecutionContext,
///     user: Element,
///     password: Element,
///     submit: Element,
/// }
///
/// impl PageObject for LoginPage {
///     fn new(ctx: &ExecutionContext) -> Self {
///         Self {
///             ctx: ctx.clone(),
///             user: ctx.element("#user").named("LoginPage.user"),
///             password: ctx.element("#password").named("LoginPage.password"),
///             submit: ctx.element("button[type=submit]").named("LoginPage.submit"),
///         }
///     }
///
///     fn context(&self) -> &ExecutionContext {
///         &self.ctx
///     }
///
///     fn uri(&self) -> Option<&str> {
///         Some("login")
///     }
/// }
///
/// let page: LoginPage = open_page(&ctx).await?;
/// page.user.set_text("admin").await?;
/// ```
pub trait PageObject: Sized {
    /// Declares the page's handles. Must not touch the browser.
    fn new(context: &ExecutionContext) -> Self;

    fn context(&self) -> &ExecutionContext;

    /// Path of the page relative to its domain, or an absolute URL
    fn uri(&self) -> Option<&str>;

    /// Base address of the page; `None` falls back to the configured `DefaultUrl`
    fn domain(&self) -> Option<&str> {
        None
    }

    /// The address `open_page` navigates to
    fn url(&self) -> Result<Url> {
        let uri = self.uri().ok_or_else(|| {
            Error::Configuration(format!(
                "{} does not declare a uri",
                std::any::type_name::<Self>()
            ))
        })?;

        // An absolute uri needs no base
        if let Ok(url) = Url::parse(uri) {
            return Ok(url);
        }

        let domain = match self.domain() {
            Some(domain) => domain,
            None => self.context().config().default_url.as_deref().ok_or_else(|| {
                Error::Configuration(format!(
                    "No domain for {} and no DefaultUrl configured",
                    std::any::type_name::<Self>()
                ))
            })?,
        };

        join_url(domain, uri)
    }
}

/// Builds `P`, navigates to its URL and returns it.
pub async fn open_page<P: PageObject>(context: &ExecutionContext) -> Result<P> {
    let page = P::new(context);
    let url = page.url()?;
    context.log(&format!("Opening page {}", url));
    context.driver().navigate(url.as_str()).await?;
    Ok(page)
}

// The uri is always appended to the domain's path, so "https://host/app" + "/login"
// gives "https://host/app/login".
fn join_url(domain: &str, uri: &str) -> Result<Url> {
    let mut base = Url::parse(domain)
        .map_err(|e| Error::Configuration(format!("Invalid domain '{}': {}", domain, e)))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(uri.trim_start_matches('/'))
        .map_err(|e| Error::Configuration(format!("Invalid uri '{}': {}", uri, e)))
}

/// A group of handles declared relative to one root element.
///
/// ```ignore
/// struct SearchResult {
///     root: Element,
///     title: Element,
/// }
///
/// impl Component for SearchResult {
///     fn from_root(root: Element) -> Self {
///         Self {
///             title: root.element("h3").named("SearchResult.title"),
///             root,
///         }
///     }
///
///     fn root(&self) -> &Element {
///         &self.root
///     }
/// }
/// ```
pub trait Component: Sized {
    fn from_root(root: Element) -> Self;

    fn root(&self) -> &Element;
}

/// A collection whose members are wrapped as components
pub struct ComponentList<T> {
    elements: Elements,
    _component: PhantomData<fn() -> T>,
}

impl<T: Component> ComponentList<T> {
    pub fn new(elements: Elements) -> Self {
        Self {
            elements,
            _component: PhantomData,
        }
    }

    pub fn elements(&self) -> &Elements {
        &self.elements
    }

    /// Resolves the collection and builds one component per member, in order
    pub async fn items(&self) -> Result<Vec<T>> {
        Ok(self
            .elements
            .resolve()
            .await?
            .into_iter()
            .map(T::from_root)
            .collect())
    }

    pub async fn count(&self) -> Result<usize> {
        self.elements.count().await
    }

    pub fn verify(&self) -> ElementsVerification<'_> {
        self.elements.verify()
    }

    pub fn verify_not(&self) -> ElementsVerification<'_> {
        self.elements.verify_not()
    }
}

impl<T> Clone for ComponentList<T> {
    fn clone(&self) -> Self {
        Self {
            elements: self.elements.clone(),
            _component: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ComponentList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentList")
            .field("elements", &self.elements)
            .finish()
    }
}
