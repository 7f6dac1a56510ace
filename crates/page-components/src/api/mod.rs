// Public API types module
//
// Configuration values and the session-provider boundary. Everything here is consumed when an
// `ExecutionContext` is built; none of it changes resolution behaviour afterwards.

pub mod browser;
pub mod config;

pub use browser::{BrowserKind, SessionProvider};
pub use config::ComponentConfig;
