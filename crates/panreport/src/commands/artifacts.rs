//! Exported file listing, history and deletion.

use tabled::Tabled;

use panreport_core::artifacts;

use crate::Context;
use crate::cli::{GlobalOpts, ReportsArgs, ReportsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Format")]
    format: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Modified")]
    modified: String,
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Report")]
    report_type: String,
    #[tabled(rename = "Format")]
    format: String,
    #[tabled(rename = "File")]
    file_name: String,
    #[tabled(rename = "Created")]
    created_at: String,
}

const LISTING_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn handle(args: ReportsArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let dir = ctx.session.reports_dir();
    match args.command {
        ReportsCommand::List => {
            let files = artifacts::list_reports(dir)?;
            let out = output::render_list(
                &global.output,
                &files,
                |f| FileRow {
                    name: f.name.clone(),
                    format: f.kind.to_string(),
                    size: util::human_size(f.size),
                    modified: f.modified.format(LISTING_TIME_FORMAT).to_string(),
                },
                |f| f.path.display().to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ReportsCommand::History => {
            let history = artifacts::report_history(dir)?;
            let out = output::render_list(
                &global.output,
                &history,
                |h| HistoryRow {
                    report_type: h.report_type.clone(),
                    format: h.format.to_string(),
                    file_name: h.file_name.clone(),
                    created_at: h.created_at.format(LISTING_TIME_FORMAT).to_string(),
                },
                |h| h.file_path.display().to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ReportsCommand::Delete { path } => {
            // Bare file names resolve inside the reports directory.
            let path = if path.is_relative() && path.components().count() == 1 {
                dir.join(path)
            } else {
                path
            };
            if !util::confirm(&format!("Delete {}?", path.display()), global.yes)? {
                return Ok(());
            }
            artifacts::delete_report(dir, &path)?;
            if !global.quiet {
                eprintln!("Deleted {}", path.display());
            }
            Ok(())
        }
    }
}
