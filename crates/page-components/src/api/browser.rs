// Browser selection and the session provider boundary
//
// Launching and quitting browsers happens outside this crate. A `SessionProvider` hands out
// one driver session per execution context; this module only decides which browser to ask for.

use crate::api::ComponentConfig;
use crate::driver::NativeDriver;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Browsers a session provider can be asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    Chrome,
    Firefox,
    Edge,
    InternetExplorer,
    Safari,
    /// A remote WebDriver endpoint; the provider decides the actual browser
    Remote,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Edge => "edge",
            BrowserKind::InternetExplorer => "ie",
            BrowserKind::Safari => "safari",
            BrowserKind::Remote => "remote",
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Ok(BrowserKind::Chrome),
            "firefox" | "ff" => Ok(BrowserKind::Firefox),
            "edge" | "msedge" => Ok(BrowserKind::Edge),
            "ie" | "internetexplorer" | "internet explorer" => Ok(BrowserKind::InternetExplorer),
            "safari" => Ok(BrowserKind::Safari),
            "remote" => Ok(BrowserKind::Remote),
            _ => Err(Error::UnsupportedDriver(name.to_string())),
        }
    }
}

/// Supplies one native driver session per execution context.
///
/// Window sizing, headless flags and quitting are the provider's concern.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn launch(
        &self,
        browser: BrowserKind,
        config: &ComponentConfig,
    ) -> Result<Arc<dyn NativeDriver>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!("Chrome".parse::<BrowserKind>().unwrap(), BrowserKind::Chrome);
        assert_eq!("ff".parse::<BrowserKind>().unwrap(), BrowserKind::Firefox);
        assert_eq!(" IE ".parse::<BrowserKind>().unwrap(), BrowserKind::InternetExplorer);
        assert_eq!("remote".parse::<BrowserKind>().unwrap(), BrowserKind::Remote);
    }

    #[test]
    fn test_parse_unknown_name() {
        let err = "netscape".parse::<BrowserKind>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedDriver(ref name) if name == "netscape"));
    }

    #[test]
    fn test_display_round_trip() {
        for kind in [
            BrowserKind::Chrome,
            BrowserKind::Firefox,
            BrowserKind::Edge,
            BrowserKind::InternetExplorer,
            BrowserKind::Safari,
            BrowserKind::Remote,
        ] {
            assert_eq!(kind.to_string().parse::<BrowserKind>().unwrap(), kind);
        }
    }
}
