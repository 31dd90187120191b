//! Shared helpers for command handlers.

use std::collections::BTreeMap;

use panreport_core::DateRange;

use crate::cli::RangeArgs;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Map a dialoguer / rpassword failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

pub fn date_range(args: &RangeArgs) -> Option<DateRange> {
    DateRange::from_bounds(args.start.as_deref(), args.end.as_deref())
}

/// Parse repeated `FIELD=VALUE` arguments. Later duplicates win.
pub fn parse_filters(raw: &[String]) -> Result<BTreeMap<String, String>, CliError> {
    raw.iter()
        .map(|item| {
            let (field, value) = item.split_once('=').ok_or_else(|| CliError::Validation {
                field: "--where".into(),
                reason: format!("expected FIELD=VALUE, got {item:?}"),
            })?;
            let field = field.trim();
            if field.is_empty() {
                return Err(CliError::Validation {
                    field: "--where".into(),
                    reason: format!("empty field name in {item:?}"),
                });
            }
            Ok((field.to_owned(), value.trim().to_owned()))
        })
        .collect()
}

/// Human-readable byte count.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut unit = 0;
    let mut whole = bytes;
    let mut rem = 0;
    while whole >= 1024 && unit < UNITS.len() - 1 {
        rem = whole % 1024;
        whole /= 1024;
        unit += 1;
    }
    if unit == 0 {
        format!("{whole} B")
    } else {
        format!("{whole}.{} {}", rem * 10 / 1024, UNITS[unit])
    }
}
