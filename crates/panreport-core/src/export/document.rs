// Single-page PDF rendering of a record as a Field / Value table.

use panreport_api::ReportPayload;
use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rgb};

use super::value::render_value;
use super::{RenderError, Rendering};

// A4 portrait, millimetres.
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
const TOP: f32 = PAGE_HEIGHT - 15.0;
const ROW_HEIGHT: f32 = 8.0;

const TITLE_SIZE: f32 = 14.0;
const HEADER_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 10.0;

// Character budgets approximating the 30 / 70 column split at body size.
const KEY_CHARS: usize = 28;
const VALUE_CHARS: usize = 72;

/// Render a single-record payload into PDF bytes.
pub(crate) fn render_document(
    title: &str,
    payload: &ReportPayload,
    rendering: &Rendering,
) -> Result<Vec<u8>, RenderError> {
    let record = payload
        .as_record()
        .ok_or_else(|| RenderError::Shape(payload.shape()))?;

    let (doc, page, layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;
    let layer = doc.get_page(page).get_layer(layer);

    let key_x = MARGIN;
    let value_x = MARGIN + (PAGE_WIDTH - 2.0 * MARGIN) * 0.3;
    let mut y = TOP;

    layer.use_text(
        format!("{title} - generated {}", rendering.generated),
        TITLE_SIZE,
        Mm(key_x),
        Mm(y),
        &bold,
    );
    y -= ROW_HEIGHT * 1.5;

    layer.set_fill_color(Color::Rgb(Rgb::new(0.12, 0.29, 0.49, None)));
    layer.use_text("Field", HEADER_SIZE, Mm(key_x), Mm(y), &bold);
    layer.use_text("Value", HEADER_SIZE, Mm(value_x), Mm(y), &bold);
    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    y -= ROW_HEIGHT;

    let mut fields: Vec<_> = record.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    let capacity = rows_that_fit(y);
    let shown = if fields.len() > capacity {
        capacity.saturating_sub(1)
    } else {
        fields.len()
    };

    for (key, value) in &fields[..shown] {
        write_row(&layer, &regular, key_x, value_x, y, key, &render_value(value));
        y -= ROW_HEIGHT;
    }

    if shown < fields.len() {
        let hidden = fields.len() - shown;
        layer.use_text(
            format!("... {hidden} more fields not shown"),
            BODY_SIZE,
            Mm(key_x),
            Mm(y),
            &regular,
        );
    } else if fields.is_empty() {
        layer.use_text("(no fields)", BODY_SIZE, Mm(key_x), Mm(y), &regular);
    }

    doc.save_to_bytes().map_err(pdf_error)
}

#[allow(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn rows_that_fit(top: f32) -> usize {
    let usable = (top - MARGIN).max(0.0);
    (usable / ROW_HEIGHT).floor() as usize + 1
}

fn write_row(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    key_x: f32,
    value_x: f32,
    y: f32,
    key: &str,
    value: &str,
) {
    layer.use_text(clip(key, KEY_CHARS), BODY_SIZE, Mm(key_x), Mm(y), font);
    layer.use_text(clip(value, VALUE_CHARS), BODY_SIZE, Mm(value_x), Mm(y), font);
}

/// Single-line, length-capped text for a table cell.
fn clip(text: &str, max_chars: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut clipped: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
    clipped.push_str("...");
    clipped
}

fn pdf_error(err: impl std::fmt::Display) -> RenderError {
    RenderError::Io(std::io::Error::other(err.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Map, Value, json};

    use super::*;
    use crate::config::ExportMode;

    fn rendering() -> Rendering {
        Rendering {
            max_rows: 1000,
            mode: ExportMode::Standard,
            generated: "2024-06-01 12:00:00".into(),
            source: "panreport",
        }
    }

    #[test]
    fn record_renders_pdf_bytes() {
        let payload = ReportPayload::Structured(json!({"hostname": "fw01", "serial": "0071"}));
        let bytes = render_document("systemInfo", &payload, &rendering()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn many_fields_still_render() {
        let mut map = Map::new();
        for i in 0..200 {
            map.insert(format!("field{i:03}"), Value::from(i));
        }
        let payload = ReportPayload::Structured(Value::Object(map));
        let bytes = render_document("big", &payload, &rendering()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn sequence_is_rejected() {
        let payload = ReportPayload::Structured(json!([{"a": 1}]));
        let err = render_document("zones", &payload, &rendering()).unwrap_err();
        assert!(matches!(err, RenderError::Shape(_)));
    }

    #[test]
    fn clip_flattens_and_truncates() {
        assert_eq!(clip("a\nb", 10), "a b");
        assert_eq!(clip("abcdefghij", 6), "abc...");
        assert_eq!(clip("short", 6), "short");
    }

    #[test]
    fn overflow_capacity_leaves_room_for_note() {
        let capacity = rows_that_fit(TOP - ROW_HEIGHT * 2.5);
        assert!(capacity > 20);
        assert!(capacity < 40);
    }
}
