#![forbid(unsafe_code)]

//! Submit-time required-field validation.
//!
//! Every required control in the submitted form is checked, in document
//! order, so all errors show at once. A missing value marks the field and
//! attaches one error-message node after it; a filled value clears both.
//!
//! Error nodes are tracked in a field → node map once inserted (or once a
//! server-rendered error node next to the field is adopted), so repeated
//! invalid submits reuse the same node instead of stacking new ones.

use std::collections::HashMap;

use crate::config::PageConfig;
use crate::error::PageError;
use crate::host::{NodeId, PageHost, Selector};

/// Verdict for a single required value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCheck {
    Filled,
    Missing,
}

/// A value counts as missing when it is empty after trimming whitespace.
#[must_use]
pub fn check_required(value: &str) -> FieldCheck {
    if value.trim().is_empty() {
        FieldCheck::Missing
    } else {
        FieldCheck::Filled
    }
}

/// What the host should do with the submit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Let the browser submit natively.
    Proceed,
    /// Cancel the submission; `invalid` lists failing fields in document order.
    Blocked { invalid: Vec<NodeId> },
}

impl SubmitOutcome {
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

#[derive(Debug, Default)]
pub struct FormValidator {
    forms: Vec<NodeId>,
    errors: HashMap<NodeId, NodeId>,
}

impl FormValidator {
    pub fn install<H: PageHost>(host: &mut H, config: &PageConfig) -> Self {
        let forms = host.query_all(&Selector::Attr {
            tag: Some("form"),
            name: &config.markers.validate_attr,
            value: Some(&config.markers.validate_value),
        });
        Self {
            forms,
            errors: HashMap::new(),
        }
    }

    #[must_use]
    pub fn forms(&self) -> &[NodeId] {
        &self.forms
    }

    #[must_use]
    pub fn is_validated(&self, form: NodeId) -> bool {
        self.forms.contains(&form)
    }

    /// Validate `form` and update error markup. Forms not opted in always
    /// proceed untouched.
    pub fn on_submit<H: PageHost>(
        &mut self,
        host: &mut H,
        config: &PageConfig,
        form: NodeId,
    ) -> Result<SubmitOutcome, PageError> {
        if !self.is_validated(form) {
            return Ok(SubmitOutcome::Proceed);
        }
        let fields = host.query_within(
            form,
            &Selector::Attr {
                tag: None,
                name: &config.markers.required_attr,
                value: None,
            },
        );

        let mut invalid = Vec::new();
        for field in fields {
            let Some(value) = host.value(field) else {
                continue;
            };
            match check_required(&value) {
                FieldCheck::Missing => {
                    self.mark_invalid(host, config, field)?;
                    invalid.push(field);
                }
                FieldCheck::Filled => self.mark_valid(host, config, field)?,
            }
        }

        if invalid.is_empty() {
            Ok(SubmitOutcome::Proceed)
        } else {
            #[cfg(feature = "tracing")]
            tracing::debug!(%form, invalid = invalid.len(), "form submission blocked");
            Ok(SubmitOutcome::Blocked { invalid })
        }
    }

    fn mark_invalid<H: PageHost>(
        &mut self,
        host: &mut H,
        config: &PageConfig,
        field: NodeId,
    ) -> Result<(), PageError> {
        host.add_class(field, &config.classes.invalid_field)?;
        if self.error_node(host, config, field).is_none() {
            let node = host.insert_after(
                field,
                &config.text.error_tag,
                &config.classes.error_classes(),
                &config.text.required,
            )?;
            self.errors.insert(field, node);
        }
        Ok(())
    }

    fn mark_valid<H: PageHost>(
        &mut self,
        host: &mut H,
        config: &PageConfig,
        field: NodeId,
    ) -> Result<(), PageError> {
        host.remove_class(field, &config.classes.invalid_field)?;
        if let Some(node) = self.error_node(host, config, field) {
            host.remove(node)?;
        }
        self.errors.remove(&field);
        Ok(())
    }

    /// The error node attached to `field`, adopting an adjacent one if the
    /// map has none.
    fn error_node<H: PageHost>(
        &mut self,
        host: &mut H,
        config: &PageConfig,
        field: NodeId,
    ) -> Option<NodeId> {
        if let Some(&node) = self.errors.get(&field) {
            if host.is_connected(node) {
                return Some(node);
            }
            self.errors.remove(&field);
        }
        let sibling = host.next_element_sibling(field)?;
        if !host.has_class(sibling, &config.classes.error_marker) {
            return None;
        }
        self.errors.insert(field, sibling);
        Some(sibling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ElementSpec, MemoryDocument};
    use pretty_assertions::assert_eq;

    struct Fixture {
        doc: MemoryDocument,
        form: NodeId,
        name: NodeId,
        email: NodeId,
        note: NodeId,
    }

    fn fixture() -> Fixture {
        let mut doc = MemoryDocument::new();
        let form = doc.append(
            doc.root(),
            ElementSpec::new("form").attr("data-validate", "true"),
        );
        let name = doc.append(form, ElementSpec::new("input").attr("required", ""));
        let email = doc.append(form, ElementSpec::new("input").attr("required", ""));
        let note = doc.append(form, ElementSpec::new("textarea"));
        doc.append(form, ElementSpec::new("button").text("Send"));
        Fixture {
            doc,
            form,
            name,
            email,
            note,
        }
    }

    fn error_nodes(doc: &MemoryDocument, form: NodeId) -> Vec<NodeId> {
        doc.children(form)
            .iter()
            .copied()
            .filter(|n| doc.has_class(*n, "error-message"))
            .collect()
    }

    #[test]
    fn check_required_trims() {
        assert_eq!(check_required(""), FieldCheck::Missing);
        assert_eq!(check_required(" \t\n"), FieldCheck::Missing);
        assert_eq!(check_required(" x "), FieldCheck::Filled);
    }

    #[test]
    fn empty_fields_block_and_get_errors() {
        let config = PageConfig::default();
        let mut f = fixture();
        let mut validator = FormValidator::install(&mut f.doc, &config);
        let outcome = validator.on_submit(&mut f.doc, &config, f.form).unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Blocked {
                invalid: vec![f.name, f.email]
            }
        );
        assert!(f.doc.has_class(f.name, "border-red-500"));
        assert!(f.doc.has_class(f.email, "border-red-500"));
        assert!(!f.doc.has_class(f.note, "border-red-500"));

        let errors = error_nodes(&f.doc, f.form);
        assert_eq!(errors.len(), 2);
        assert_eq!(f.doc.next_element_sibling(f.name), Some(errors[0]));
        assert_eq!(f.doc.text(errors[0]), "This field is required");
        assert_eq!(f.doc.tag(errors[0]), Some("p"));
        assert_eq!(
            f.doc.classes(errors[0]),
            &["error-message", "text-red-500", "text-xs", "mt-1"].map(String::from)
        );
    }

    #[test]
    fn resubmitting_does_not_duplicate_errors() {
        let config = PageConfig::default();
        let mut f = fixture();
        let mut validator = FormValidator::install(&mut f.doc, &config);
        for _ in 0..3 {
            assert!(validator.on_submit(&mut f.doc, &config, f.form).unwrap().is_blocked());
        }
        assert_eq!(error_nodes(&f.doc, f.form).len(), 2);
    }

    #[test]
    fn fixing_a_field_clears_its_error_only() {
        let config = PageConfig::default();
        let mut f = fixture();
        let mut validator = FormValidator::install(&mut f.doc, &config);
        validator.on_submit(&mut f.doc, &config, f.form).unwrap();

        f.doc.set_value(f.name, "Ada").unwrap();
        let outcome = validator.on_submit(&mut f.doc, &config, f.form).unwrap();
        assert_eq!(outcome, SubmitOutcome::Blocked { invalid: vec![f.email] });
        assert!(!f.doc.has_class(f.name, "border-red-500"));
        assert_eq!(error_nodes(&f.doc, f.form).len(), 1);

        f.doc.set_value(f.email, "ada@example.com").unwrap();
        let outcome = validator.on_submit(&mut f.doc, &config, f.form).unwrap();
        assert_eq!(outcome, SubmitOutcome::Proceed);
        assert!(error_nodes(&f.doc, f.form).is_empty());
    }

    #[test]
    fn server_rendered_error_is_adopted() {
        let config = PageConfig::default();
        let mut doc = MemoryDocument::new();
        let form = doc.append(doc.root(), ElementSpec::new("form").attr("data-validate", "true"));
        let field = doc.append(form, ElementSpec::new("input").attr("required", ""));
        let existing = doc.append(
            form,
            ElementSpec::new("p").class("error-message").text("Already taken"),
        );
        let mut validator = FormValidator::install(&mut doc, &config);
        validator.on_submit(&mut doc, &config, form).unwrap();
        assert_eq!(error_nodes(&doc, form), vec![existing]);

        doc.set_value(field, "x").unwrap();
        validator.on_submit(&mut doc, &config, form).unwrap();
        assert!(!doc.is_connected(existing));
    }

    #[test]
    fn error_removed_externally_is_recreated() {
        let config = PageConfig::default();
        let mut f = fixture();
        let mut validator = FormValidator::install(&mut f.doc, &config);
        validator.on_submit(&mut f.doc, &config, f.form).unwrap();
        let first = error_nodes(&f.doc, f.form)[0];
        f.doc.remove(first).unwrap();
        validator.on_submit(&mut f.doc, &config, f.form).unwrap();
        assert_eq!(error_nodes(&f.doc, f.form).len(), 2);
    }

    #[test]
    fn forms_not_opted_in_proceed() {
        let config = PageConfig::default();
        let mut doc = MemoryDocument::new();
        let form = doc.append(doc.root(), ElementSpec::new("form"));
        let field = doc.append(form, ElementSpec::new("input").attr("required", ""));
        let mut validator = FormValidator::install(&mut doc, &config);
        assert!(validator.forms().is_empty());
        assert_eq!(
            validator.on_submit(&mut doc, &config, form).unwrap(),
            SubmitOutcome::Proceed
        );
        assert!(!doc.has_class(field, "border-red-500"));
    }

    #[test]
    fn required_non_controls_are_skipped() {
        let config = PageConfig::default();
        let mut doc = MemoryDocument::new();
        let form = doc.append(doc.root(), ElementSpec::new("form").attr("data-validate", "true"));
        doc.append(form, ElementSpec::new("fieldset").attr("required", ""));
        let mut validator = FormValidator::install(&mut doc, &config);
        assert_eq!(
            validator.on_submit(&mut doc, &config, form).unwrap(),
            SubmitOutcome::Proceed
        );
    }
}
