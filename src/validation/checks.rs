//! Validation checks for schemas and field bindings.
//!
//! Each check returns a `ValidationResult`.

use std::collections::HashSet;

use crate::schema::{Field, Magic, Schema};

use super::diagnostic::{Diagnostic, ValidationResult};

/// Check the fields bound by a data block against the resolved schema fields.
///
/// A resolved field without a binding is an error. A binding the schema does
/// not know, or a field bound more than once, is a warning; the last binding
/// of a field wins.
pub fn check_bindings(
    magic: Magic,
    version: u32,
    resolved: &[&Field],
    bound: &[&str],
) -> ValidationResult {
    let mut result = ValidationResult::new();

    for field in resolved {
        if !bound.contains(&field.name.as_str()) {
            result.push(
                Diagnostic::error(
                    "rcdgen::validate::missing-field",
                    format!(
                        "Field '{}' of block '{}' version {} is not set",
                        field.name, magic, version
                    ),
                )
                .with_help(format!("Add a value of type {}", field.data_type)),
            );
        }
    }

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for name in bound {
        let known = resolved.iter().any(|f| f.name == *name);
        if seen.insert(*name) {
            if !known {
                result.push(
                    Diagnostic::warning(
                        "rcdgen::validate::unused-field",
                        format!(
                            "Field '{}' is not used by block '{}' version {}",
                            name, magic, version
                        ),
                    )
                    .with_help("Check the field name and its version window in the schema"),
                );
            }
        } else if reported.insert(*name) {
            result.warning(
                "rcdgen::validate::redefined-field",
                format!(
                    "Field '{}' of block '{}' is set more than once, the last value is used",
                    name, magic
                ),
            );
        }
    }

    result
}

/// Resolve every field set of every block and report conflicts.
pub fn check_schema(schema: &Schema) -> ValidationResult {
    let mut result = ValidationResult::new();
    for error in schema.check() {
        result.push(
            Diagnostic::error("rcdgen::validate::schema", error.to_string())
                .with_help("Give the fields distinct names or non-overlapping version windows"),
        );
    }
    result
}
