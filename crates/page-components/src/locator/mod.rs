// Locators - lazily resolved handles to page elements
//
// Architecture:
// - `Element` owns the resolution protocol (cache probe, activation order, retry-until-timeout)
// - `Frame` and `Elements` wrap an `Element` and reuse that protocol
// - All handles carry an `ExecutionContext`; nothing here touches global state

mod element;
mod elements;
mod frame;
mod select;

pub use element::{Element, Visibility};
pub use elements::Elements;
pub use frame::Frame;
pub use select::{Select, SelectOption};
