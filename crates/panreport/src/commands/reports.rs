//! Report handlers: generate, batch, search, filter.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;
use tabled::builder::Builder;
use tabled::settings::Style;

use panreport_core::export::render_value;
use panreport_core::{BatchOutcome, BatchRequest, ExportKind, FilterResult, SearchResult};

use crate::Context;
use crate::cli::{BatchArgs, FilterArgs, GenerateArgs, GlobalOpts, OutputFormat, SearchArgs};
use crate::error::CliError;
use crate::output;
use crate::progress::Spinner;

use super::util;

/// Columns shown when printing entries as a table.
const MAX_TABLE_COLUMNS: usize = 8;

// ── generate ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateSummary {
    report_type: String,
    label: &'static str,
    shape: String,
    entries: usize,
    fetched_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    artifact: Option<PathBuf>,
}

pub async fn generate(args: GenerateArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let range = util::date_range(&args.range);
    let label = ctx
        .session
        .registry()
        .get(&args.report_type)
        .map_or("", |e| e.label);

    let spinner = Spinner::start(&format!("Fetching {}...", args.report_type), global.quiet);
    let payload = ctx
        .session
        .generate_report(&args.report_type, range.as_ref())
        .await?;
    spinner.finish();

    let artifact = match args.export {
        Some(format) => Some(
            ctx.session
                .export(&args.report_type, format.into())
                .await?
                .path,
        ),
        None => None,
    };

    let summary = GenerateSummary {
        label,
        shape: payload.shape().to_string(),
        entries: payload.items().len(),
        fetched_at: ctx.session.cache().fetched_at(&args.report_type),
        artifact,
        report_type: args.report_type,
    };
    let out = output::render_single(
        &global.output,
        &summary,
        |s| {
            let mut pairs = vec![
                ("report", s.report_type.clone()),
                ("label", s.label.to_owned()),
                ("shape", s.shape.clone()),
                ("entries", s.entries.to_string()),
            ];
            if let Some(at) = s.fetched_at {
                pairs.push(("fetched", at.to_rfc3339()));
            }
            if let Some(path) = &s.artifact {
                pairs.push(("exported", path.display().to_string()));
            }
            output::detail(&pairs)
        },
        |s| {
            s.artifact
                .as_ref()
                .map_or_else(|| s.report_type.clone(), |p| p.display().to_string())
        },
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── batch ────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "Report")]
    report_type: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "File / Error")]
    detail: String,
}

pub async fn batch(args: BatchArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let kind: ExportKind = args.format.into();
    let request = BatchRequest::new(
        args.report_types,
        kind.extension(),
        util::date_range(&args.range),
    )?;

    let spinner = Spinner::start(
        &format!("Running {} reports...", request.report_types().len()),
        global.quiet,
    );
    let outcome = ctx.session.run_batch(request).await;
    spinner.finish();

    let out = match global.output {
        OutputFormat::Table => render_batch_table(&outcome),
        _ => output::render_single(&global.output, &outcome, |_| String::new(), |o| {
            o.results
                .values()
                .filter_map(|item| item.path.as_ref())
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join("\n")
        }),
    };
    output::print_output(&out, global.quiet);

    if outcome.summary.failed > 0 && !global.quiet {
        eprintln!(
            "{} of {} reports failed",
            outcome.summary.failed, outcome.summary.total
        );
    }
    Ok(())
}

fn render_batch_table(outcome: &BatchOutcome) -> String {
    let rows: Vec<BatchRow> = outcome
        .results
        .iter()
        .map(|(report_type, item)| BatchRow {
            report_type: report_type.clone(),
            status: if item.success { "ok" } else { "failed" },
            detail: match (&item.path, &item.error) {
                (Some(path), _) => path.display().to_string(),
                (None, Some(error)) => error.clone(),
                (None, None) => String::new(),
            },
        })
        .collect();
    format!(
        "{}\n{} total, {} successful, {} failed ({})",
        output::render_table(&rows),
        outcome.summary.total,
        outcome.summary.successful,
        outcome.summary.failed,
        outcome.summary.format,
    )
}

// ── search ───────────────────────────────────────────────────────────

#[derive(Tabled)]
struct MatchRow {
    #[tabled(rename = "Report")]
    report_type: String,
    #[tabled(rename = "Matches")]
    count: usize,
}

pub async fn search(args: SearchArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    if args.term.is_empty() {
        return Err(CliError::Validation {
            field: "term".into(),
            reason: "search term cannot be empty".into(),
        });
    }

    let spinner = Spinner::start("Fetching reports...", global.quiet);
    for report_type in &args.reports {
        if let Err(e) = ctx.session.generate_report(report_type, None).await {
            if !global.quiet {
                eprintln!("skipping {report_type}: {e}");
            }
        }
    }
    spinner.finish();

    let result = ctx.session.search(&args.term)?;
    let out = match global.output {
        OutputFormat::Table => render_search_table(&result),
        _ => output::render_single(&global.output, &result, |_| String::new(), |r| {
            r.results.keys().cloned().collect::<Vec<_>>().join("\n")
        }),
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn render_search_table(result: &SearchResult) -> String {
    if !result.found {
        return format!(
            "No matches for '{}' in {} reports",
            result.term, result.reports_searched
        );
    }
    let rows: Vec<MatchRow> = result
        .results
        .iter()
        .map(|(report_type, m)| MatchRow {
            report_type: report_type.clone(),
            count: m.count,
        })
        .collect();
    format!(
        "{}\n'{}' found in {} of {} reports",
        output::render_table(&rows),
        result.term,
        result.reports_with_matches,
        result.reports_searched
    )
}

// ── filter ───────────────────────────────────────────────────────────

pub async fn filter(args: FilterArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let filters = util::parse_filters(&args.filters)?;

    let spinner = Spinner::start(&format!("Fetching {}...", args.report_type), global.quiet);
    ctx.session.generate_report(&args.report_type, None).await?;
    spinner.finish();

    let result = ctx.session.filter(&args.report_type, &filters)?;

    let out = match global.output {
        OutputFormat::Table => render_filter_table(&result),
        _ => output::render_single(&global.output, &result, |_| String::new(), |r| {
            r.result
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("\n")
        }),
    };
    output::print_output(&out, global.quiet);

    if let Some(format) = args.export {
        let artifact = if result.filtered {
            ctx.session
                .export_filtered(&args.report_type, format.into())
                .await?
        } else {
            ctx.session.export(&args.report_type, format.into()).await?
        };
        if !global.quiet {
            eprintln!("Exported to {}", artifact.path.display());
        }
    }
    Ok(())
}

fn render_filter_table(result: &FilterResult) -> String {
    let summary = format!("{} of {} entries", result.count, result.total);
    if result.result.is_empty() {
        return summary;
    }
    format!("{}\n{summary}", entries_table(&result.result))
}

/// Dynamic table over record entries; columns are the sorted key union.
fn entries_table(entries: &[Value]) -> String {
    let columns: Vec<String> = entries
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|obj| obj.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .take(MAX_TABLE_COLUMNS)
        .collect();

    let mut builder = Builder::default();
    builder.push_record(columns.iter().cloned());
    for entry in entries {
        match entry.as_object() {
            Some(obj) => builder.push_record(
                columns
                    .iter()
                    .map(|c| obj.get(c).map(render_value).unwrap_or_default()),
            ),
            None => builder.push_record([render_value(entry)]),
        }
    }
    builder.build().with(Style::rounded()).to_string()
}
