//! page-components: lazy, self-healing element handles for browser UI automation
//!
//! Declare a handle once; it resolves to a live element on first use, caches the reference in
//! its execution context, and transparently re-resolves when the page replaces the node.
//! Verifications poll instead of asserting once, so tests tolerate asynchronous page updates.
//!
//! The browser itself is reached through the [`NativeDriver`] trait, implemented outside this
//! crate for whatever WebDriver client the tests use.
//!
//! # Examples
//!
//! ## Declaring and using handles
//!
//! ```ignore
//! use page_components::{ComponentConfig, ExecutionContext};
//! use std::sync::Arc;
//!
//! async fn search(driver: Arc<dyn page_components::NativeDriver>) -> page_components::Result<()> {
//!     let ctx = ExecutionContext::new(driver, ComponentConfig::from_env()?);
//!
//!     let form = ctx.element("form#search").named("SearchPage.form");
//!     let query = form.element("input[name='q']").named("SearchPage.query");
//!     let results = ctx.elements(".result").named("SearchPage.results");
//!
//!     query.set_text("lazy handles").await?;
//!     form.submit().await?;
//!
//!     results.verify().count_greater_than(0).await?;
//!     for title in results.texts().await? {
//!         println!("{}", title);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Frames
//!
//! ```ignore
//! let editor = ctx.frame("iframe#editor").named("Editor");
//! let body = editor.element("body");
//!
//! // default content -> iframe#editor -> body
//! body.verify().text_contains("Draft").await?;
//! ```
//!
//! ## Configuration
//!
//! Settings come from [`ComponentConfig`]: JSON (`ElementTimeoutMs`, `FindHidden`,
//! `HighlightOnFind`, `WaitForAjax`, `PollIntervalMs`, `DefaultUrl`, `BrowserName`) or the
//! environment variables of the same names.

pub mod api;
pub mod assertions;
pub mod cache;
pub mod context;
pub mod driver;
mod error;
pub mod locator;
pub mod page;

// Re-export error types
pub use error::{Error, Result};

// Re-export configuration and session boundary
pub use api::{BrowserKind, ComponentConfig, SessionProvider};
pub use api::config::{DEFAULT_BROWSER_NAME, DEFAULT_ELEMENT_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS};

// Re-export driver boundary types
pub use driver::{By, ElementRef, NativeDriver, Point, Size};

// Re-export context and handles
pub use context::{ExecutionContext, LogSink};
pub use locator::{Element, Elements, Frame, Select, SelectOption, Visibility};

// Re-export verification API
pub use assertions::{ElementVerification, ElementsVerification};

// Re-export page composition helpers
pub use page::{Component, ComponentList, PageObject, open_page};
