//! Diagnostics for schemas and data bindings.
//!
//! Checks report errors and warnings instead of failing on the first
//! problem. Used by both `rcdgen validate` and `rcdgen build`.

mod checks;
mod diagnostic;

pub use checks::{check_bindings, check_schema};
pub use diagnostic::{Diagnostic, Severity, ValidationResult};

use crate::output::Printer;

/// Print diagnostics through the status printer.
pub fn print_diagnostics(printer: &Printer, result: &ValidationResult) {
    for d in result.iter() {
        eprintln!(
            "{}[{}]: {}",
            printer.severity(d.severity),
            d.code,
            d.message
        );
        if let Some(help) = &d.help {
            eprintln!("  {} {}", printer.dim("help:"), help);
        }
    }
}

/// One-line summary of a validation run.
pub fn summary(result: &ValidationResult) -> String {
    let errors = result.error_count();
    let warnings = result.warning_count();
    if errors > 0 {
        format!("failed: {} error(s), {} warning(s)", errors, warnings)
    } else if warnings > 0 {
        format!("passed ({} warning(s))", warnings)
    } else {
        "passed".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let mut result = ValidationResult::new();
        assert_eq!(summary(&result), "passed");

        result.warning("rcdgen::test", "odd");
        assert_eq!(summary(&result), "passed (1 warning(s))");

        result.error("rcdgen::test", "broken");
        assert_eq!(summary(&result), "failed: 1 error(s), 1 warning(s)");
    }
}
