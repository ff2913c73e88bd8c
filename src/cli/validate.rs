//! Row validation CLI command.

use std::path::{Path, PathBuf};

use crate::{Dataset, IdentifierFormat, RowValidator};

use super::basic::{load_dataset, save_dataset, RoleArgs};

/// Flag rows unfit for use as ground truth.
pub(crate) fn cmd_validate(
    path: &Path,
    roles: &RoleArgs,
    identifier_format: Option<IdentifierFormat>,
    format: &str,
    output: Option<&PathBuf>,
) -> crate::Result<()> {
    let dataset = load_dataset(path)?;
    let roles = roles.roles()?;

    let mut validator = RowValidator::new();
    if let Some(identifier_format) = identifier_format {
        validator = validator.identifier_format(identifier_format);
    }
    let validity = validator.validate(&dataset, &roles)?;

    if let Some(output_path) = output {
        let flagged = validity.attach(&dataset)?;
        save_dataset(&flagged, output_path)?;
    }

    if format == "json" {
        let json = serde_json::json!({
            "path": path.display().to_string(),
            "rows": dataset.len(),
            "valid": validity.valid_count(),
            "invalid": validity.invalid_count(),
            "reasons": validity.reason_counts().iter().map(|(reason, n)| {
                serde_json::json!({ "reason": reason.description(), "rows": n })
            }).collect::<Vec<_>>(),
            "output": output.map(|p| p.display().to_string()),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).map_err(|e| crate::Error::Format(e.to_string()))?
        );
    } else {
        println!("Row Validation");
        println!("==============");
        println!("File: {}", path.display());
        println!("Rows: {}", dataset.len());
        println!("Valid: {}", validity.valid_count());
        println!("Invalid: {}", validity.invalid_count());

        let reasons = validity.reason_counts();
        if !reasons.is_empty() {
            println!();
            for (reason, n) in reasons {
                println!("  - {}: {}", reason.description(), n);
            }
        }
        if let Some(output_path) = output {
            println!();
            println!("Flagged dataset written to: {}", output_path.display());
        }
    }

    Ok(())
}
