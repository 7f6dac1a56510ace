// Frame - iframe boundary
//
// A Frame is an Element whose reference is handed to `switch_to_frame` before anything inside
// it is searched. Elements declared with `in_frame(&frame)` (or `frame.element(...)`) enter the
// frame on every fresh resolution, after default content and their container chain.

use crate::context::ExecutionContext;
use crate::driver::By;
use crate::error::{Error, Result};
use crate::locator::element::{Element, Resolution};
use crate::locator::Elements;
use futures_util::future::BoxFuture;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// An iframe that must be selected before its descendants can be found.
///
/// # Example
///
/// ```ignore
/// let editor = ctx.frame("iframe#editor").named("Editor");
/// let body = editor.element("body#tinymce");
///
/// // default content -> find iframe#editor -> switch into it -> find body#tinymce
/// body.set_text("Hello from inside the frame").await?;
/// ```
#[derive(Clone)]
pub struct Frame {
    element: Element,
}

impl Frame {
    /// Declares a new frame scope. Use `ctx.frame(...)` in application code.
    pub fn new(context: &ExecutionContext, by: impl Into<By>) -> Self {
        Self {
            element: Element::new(context, by).named("Frame"),
        }
    }

    pub fn named(self, name: impl Into<String>) -> Self {
        Self {
            element: self.element.named(name),
        }
    }

    /// Restricts the search for the iframe element to descendants of `container`
    pub fn within(self, container: &Element) -> Self {
        Self {
            element: self.element.within(container),
        }
    }

    /// Declares this frame as nested inside `parent`
    pub fn in_frame(self, parent: &Frame) -> Self {
        Self {
            element: self.element.in_frame(parent),
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            element: self.element.with_timeout(timeout),
        }
    }

    /// The iframe element itself
    pub fn element_handle(&self) -> &Element {
        &self.element
    }

    /// Declares an element inside this frame
    pub fn element(&self, by: impl Into<By>) -> Element {
        Element::new(self.element.context(), by).in_frame(self)
    }

    /// Declares a collection inside this frame
    pub fn elements(&self, by: impl Into<By>) -> Elements {
        Elements::new(self.element.context(), by).in_frame(self)
    }

    /// Declares a frame nested inside this one
    pub fn frame(&self, by: impl Into<By>) -> Frame {
        Frame::new(self.element.context(), by).in_frame(self)
    }

    /// Switches the session into this frame, waiting up to the frame's timeout for it.
    ///
    /// Handles declared inside the frame do this themselves; call it directly only when driving
    /// the session by hand.
    pub async fn enter(&self) -> Result<()> {
        // A fresh search for the iframe starts from default content, and a cached iframe
        // reference only passes its probe while its own document is selected
        let deadline = Instant::now() + self.element.timeout();
        if self.enter_by(deadline).await? {
            Ok(())
        } else {
            Err(Error::ElementNotFound {
                description: self.to_string(),
                timeout_ms: self.element.timeout().as_millis() as u64,
            })
        }
    }

    /// Enters parent frames (outermost first), resolves the iframe and switches into it.
    ///
    /// Returns false if the iframe could not be found before `deadline`.
    pub(crate) fn enter_by(&self, deadline: Instant) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move {
            if let Some(parent) = self.element.frame_scope() {
                if !parent.enter_by(deadline).await? {
                    return Ok(false);
                }
            }

            let frame = match self.element.locate(deadline).await? {
                Resolution::Found(frame) => frame,
                Resolution::NotFound => return Ok(false),
            };

            let context = self.element.context();
            match context.driver().switch_to_frame(&frame).await {
                Ok(()) => {
                    context.log(&format!("Selected frame {}", self));
                    Ok(true)
                }
                Err(e) if e.is_stale() => {
                    self.element.forget();
                    Ok(false)
                }
                Err(e) => Err(e),
            }
        })
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.element, f)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("description", &self.to_string())
            .finish()
    }
}
