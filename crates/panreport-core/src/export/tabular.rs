// CSV rendering.
//
// Layout: a small metadata block, a blank separator row, then the table.
// Records are flexible-width, so metadata rows don't have to match the
// header width.

use std::collections::BTreeSet;
use std::io::Write;

use panreport_api::{PayloadShape, ReportPayload};
use serde_json::{Map, Value};

use super::value::render_value;
use super::{RenderError, Rendering};
use crate::config::ExportMode;

/// Spreadsheet tools need the BOM to detect UTF-8.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Render `payload` as CSV into `out`.
pub(crate) fn write_tabular<W: Write>(
    mut out: W,
    payload: &ReportPayload,
    rendering: &Rendering,
) -> Result<(), RenderError> {
    out.write_all(UTF8_BOM)?;
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b',')
        .flexible(true)
        .from_writer(out);

    match payload {
        ReportPayload::Structured(Value::Array(items)) => write_sequence(&mut wtr, items, rendering)?,
        _ => {
            let record = payload
                .as_record()
                .ok_or_else(|| RenderError::Shape(payload.shape()))?;
            write_metadata(&mut wtr, rendering, None)?;
            let headers: Vec<&String> = record.keys().collect();
            let headers = sorted(headers);
            wtr.write_record(&headers)?;
            wtr.write_record(row(&record, &headers))?;
        }
    }

    wtr.flush()?;
    Ok(())
}

fn write_sequence<W: Write>(
    wtr: &mut csv::Writer<W>,
    items: &[Value],
    rendering: &Rendering,
) -> Result<(), RenderError> {
    if items.is_empty() {
        wtr.write_record(["No Data", "Generated At"])?;
        wtr.write_record(["No data available", rendering.generated.as_str()])?;
        return Ok(());
    }

    let records = items
        .iter()
        .map(Value::as_object)
        .collect::<Option<Vec<_>>>()
        .ok_or(RenderError::Shape(PayloadShape::MixedSequence))?;

    let headers = match rendering.mode {
        ExportMode::Standard => sorted(records[0].keys().collect()),
        ExportMode::Complete => records
            .iter()
            .flat_map(|record| record.keys())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
    };

    let total = records.len();
    let shown = match rendering.max_rows {
        0 => total,
        cap => cap.min(total),
    };

    write_metadata(wtr, rendering, Some(total))?;
    wtr.write_record(&headers)?;
    for record in &records[..shown] {
        wtr.write_record(row(record, &headers))?;
    }

    if shown < total {
        let mut note = vec![String::new(); headers.len().max(1)];
        note[0] = format!("Note: Output limited to {shown} of {total} rows");
        wtr.write_record(&note)?;
    }
    Ok(())
}

fn write_metadata<W: Write>(
    wtr: &mut csv::Writer<W>,
    rendering: &Rendering,
    total: Option<usize>,
) -> Result<(), RenderError> {
    wtr.write_record(["Report Information"])?;
    wtr.write_record(["Generated", rendering.generated.as_str()])?;
    wtr.write_record(["Source", rendering.source])?;
    if let Some(total) = total {
        wtr.write_record(["Total Items".to_owned(), total.to_string()])?;
    }
    wtr.write_record(["", ""])?;
    Ok(())
}

fn sorted(mut headers: Vec<&String>) -> Vec<&String> {
    headers.sort();
    headers
}

fn row(record: &Map<String, Value>, headers: &[&String]) -> Vec<String> {
    headers
        .iter()
        .map(|h| record.get(h.as_str()).map(render_value).unwrap_or_default())
        .collect()
}
