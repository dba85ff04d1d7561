#![forbid(unsafe_code)]

//! Page-enhancement behaviors for server-rendered pages.
//!
//! `pagekit-core` decides *what* happens when a page loads and the user
//! interacts with it: flash banners dismiss themselves, dropdowns and the
//! mobile menu toggle, required fields are checked on submit, textareas fit
//! their content, copy buttons give feedback, and protected pages bounce
//! signed-out users to the login page.
//!
//! Design goals:
//! - **Host-driven**: every DOM read and write goes through [`PageHost`];
//!   the host forwards events into [`PageBehaviors`].
//! - **Deterministic time**: timers live in a queue keyed by offsets the
//!   host supplies; nothing here reads a clock.
//! - **Explicit state**: dropdown open/closed, outside-click subscriptions,
//!   copy-label countdowns, and field → error-node links are owned values,
//!   with the markup as a projection.
//!
//! `pagekit-web` binds this to a browser; [`memory::MemoryDocument`] is a
//! headless host for tests.

pub mod autoresize;
pub mod behaviors;
pub mod clipboard;
pub mod config;
pub mod dropdown;
pub mod error;
pub mod flash;
pub mod gate;
pub mod host;
pub mod memory;
pub mod mobile_menu;
pub mod timer;
pub mod validation;

pub use behaviors::{ClickOutcome, InstallReport, PageBehaviors, TimerAction};
pub use clipboard::CopyRequest;
pub use config::PageConfig;
pub use dropdown::DropdownState;
pub use error::{ClipboardError, PageError};
pub use gate::GateDecision;
pub use host::{Height, NodeId, PageHost, Selector, SubscriptionId};
pub use validation::SubmitOutcome;
