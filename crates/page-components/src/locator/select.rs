// Dropdown selection helper
//
// Wraps a `<select>` element and picks options by value, visible label, or position.

use crate::driver::By;
use crate::error::{Error, Result};
use crate::locator::Element;
use std::fmt;

/// Select option variant
///
/// Represents different ways to select an option in a `<select>` element.
///
/// # Example
///
/// ```ignore
/// use page_components::SelectOption;
///
/// // Select by value
/// let opt = SelectOption::Value("option1".to_string());
///
/// // Select by label (visible text)
/// let opt = SelectOption::Label("First Option".to_string());
///
/// // Select by index (0-based)
/// let opt = SelectOption::Index(0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SelectOption {
    /// Select by option value attribute
    Value(String),
    /// Select by option label (visible text)
    Label(String),
    /// Select by option index (0-based)
    Index(usize),
}

impl fmt::Display for SelectOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectOption::Value(v) => write!(f, "value '{}'", v),
            SelectOption::Label(l) => write!(f, "label '{}'", l),
            SelectOption::Index(i) => write!(f, "index {}", i),
        }
    }
}

// Plain strings select by value
impl From<&str> for SelectOption {
    fn from(value: &str) -> Self {
        SelectOption::Value(value.to_string())
    }
}

impl From<String> for SelectOption {
    fn from(value: String) -> Self {
        SelectOption::Value(value)
    }
}

impl From<usize> for SelectOption {
    fn from(index: usize) -> Self {
        SelectOption::Index(index)
    }
}

/// Dropdown helper bound to a `<select>` element.
///
/// Obtained from [`Element::select`]. Each call re-resolves the select if it went stale.
pub struct Select<'a> {
    element: &'a Element,
}

impl<'a> Select<'a> {
    pub(crate) fn new(element: &'a Element) -> Self {
        Self { element }
    }

    /// Visible labels of all options, in order
    pub async fn options(&self) -> Result<Vec<String>> {
        self.element
            .with_element(|driver, select| async move {
                let mut labels = Vec::new();
                for option in driver.find_elements(Some(&select), &option_tag()).await? {
                    labels.push(driver.text(&option).await?.trim().to_string());
                }
                Ok(labels)
            })
            .await
    }

    /// Selects one option, returning its value attribute (or label when it has no value).
    ///
    /// Options that are already selected are left alone, so this never toggles a multi-select
    /// option off.
    pub async fn select(&self, option: impl Into<SelectOption>) -> Result<String> {
        let option = option.into();
        self.element
            .context()
            .log(&format!("Selecting {} in {}", option, self.element));

        let wanted = &option;
        let chosen = self
            .element
            .with_element(move |driver, select| async move {
                let options = driver.find_elements(Some(&select), &option_tag()).await?;
                for (i, candidate) in options.into_iter().enumerate() {
                    let label = driver.text(&candidate).await?.trim().to_string();
                    let value = driver.get_attribute(&candidate, "value").await?;
                    let matches = match wanted {
                        SelectOption::Value(v) => value.as_deref() == Some(v.as_str()),
                        SelectOption::Label(l) => label == l.trim(),
                        SelectOption::Index(n) => i == *n,
                    };
                    if matches {
                        if !driver.is_selected(&candidate).await? {
                            driver.click(&candidate).await?;
                        }
                        return Ok(Some(value.unwrap_or(label)));
                    }
                }
                Ok(None)
            })
            .await?;

        chosen.ok_or_else(|| Error::ElementNotFound {
            description: format!("Option with {} in {}", option, self.element),
            timeout_ms: 0,
        })
    }

    /// Value attributes of the currently selected options
    pub async fn selected_values(&self) -> Result<Vec<String>> {
        self.element
            .with_element(|driver, select| async move {
                let mut values = Vec::new();
                for option in driver.find_elements(Some(&select), &option_tag()).await? {
                    if driver.is_selected(&option).await? {
                        values.push(
                            driver
                                .get_attribute(&option, "value")
                                .await?
                                .unwrap_or_default(),
                        );
                    }
                }
                Ok(values)
            })
            .await
    }
}

fn option_tag() -> By {
    By::tag_name("option")
}
