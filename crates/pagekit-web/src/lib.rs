#![forbid(unsafe_code)]

//! Browser frontend for pagekit.
//!
//! On `wasm32` this crate exports a `wasm-bindgen` API:
//! - `new PageKit(options?)` parses [`WebOptions`] and sets up console logging,
//! - `install()` enhances the document once it is parsed,
//! - `teardown()` removes every listener and restores copy labels,
//! - `start(options?)` does the first two in one call.
//!
//! All decisions are made by [`pagekit_core::PageBehaviors`]; this crate
//! adapts the DOM to [`pagekit_core::PageHost`] and forwards events.

pub mod console;
pub mod options;

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
mod lifecycle;
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
mod table;

#[cfg(target_arch = "wasm32")]
mod host;
#[cfg(target_arch = "wasm32")]
mod wasm;

pub use options::WebOptions;
#[cfg(target_arch = "wasm32")]
pub use wasm::{PageKit, start};

/// Native builds compile this crate as a stub so `cargo test --workspace`
/// stays green on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct PageKit {
    options: WebOptions,
}

#[cfg(not(target_arch = "wasm32"))]
impl PageKit {
    pub fn new(options: Option<&str>) -> Result<Self, pagekit_core::PageError> {
        let options = match options {
            Some(json) => WebOptions::from_json_str(json)?,
            None => WebOptions::default(),
        };
        Ok(Self { options })
    }

    #[must_use]
    pub const fn options(&self) -> &WebOptions {
        &self.options
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn stub_parses_options() {
        let kit = PageKit::new(Some(r#"{"text": {"copied": "Done"}}"#)).unwrap();
        assert_eq!(kit.options().page.text.copied, "Done");
        assert!(PageKit::new(Some("[]")).is_err());
        assert!(PageKit::new(None).is_ok());
    }
}
