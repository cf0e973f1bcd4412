use std::{io::Write, path::Path};

use grid_client::domain::{timestamp::format_date, ForecastPoint};

pub const REPORT_TITLE: &str = "Smart Grid Forecast Report";

// A4 portrait, in points.
const PAGE_WIDTH: f64 = 595.28;
const PAGE_HEIGHT: f64 = 841.89;
const TOP_MARGIN: f64 = 28.35;
const LEFT_MARGIN: f64 = 28.35;
const BOTTOM_MARGIN: f64 = 56.7;
const FONT_SIZE: f64 = 12.0;
const LINE_HEIGHT: f64 = 28.35;
/// Courier glyph advance, as a fraction of the font size.
const COURIER_ADVANCE: f64 = 0.6;

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("no forecast points to report")]
    EmptyForecast,
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Fixed-width `Date` / `Forecast (kW)` table, one row per point.
pub fn forecast_table_text(points: &[ForecastPoint]) -> String {
    let mut out = format!("{:>10}  {:>13}", "Date", "Forecast (kW)");
    for p in points {
        out.push('\n');
        out.push_str(&format!("{:>10}  {:>13.6}", format_date(p.date), p.value));
    }
    out
}

/// Escape a line for a PDF literal string. Non-ASCII is replaced since the
/// standard Courier font only covers the base encoding.
fn pdf_escape(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(ch);
            }
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
}

fn push_text(content: &mut String, x: f64, baseline: f64, text: &str) {
    content.push_str(&format!("BT /F1 {FONT_SIZE:.0} Tf {x:.2} {baseline:.2} Td ("));
    pdf_escape(text, content);
    content.push_str(") Tj ET\n");
}

enum Line<'a> {
    Centered(&'a str),
    Left(&'a str),
    Blank,
}

/// Lay lines out top to bottom, starting a new page when the bottom margin
/// is reached. Returns one content stream per page.
fn layout(lines: &[Line<'_>]) -> Vec<String> {
    let mut pages = Vec::new();
    let mut content = String::new();
    let mut cursor = TOP_MARGIN;

    for line in lines {
        if cursor + LINE_HEIGHT > PAGE_HEIGHT - BOTTOM_MARGIN {
            pages.push(std::mem::take(&mut content));
            cursor = TOP_MARGIN;
        }

        let baseline = PAGE_HEIGHT - cursor - LINE_HEIGHT / 2.0 - FONT_SIZE * 0.3;
        match line {
            Line::Centered(text) => {
                let width = text.chars().count() as f64 * FONT_SIZE * COURIER_ADVANCE;
                push_text(&mut content, ((PAGE_WIDTH - width) / 2.0).max(LEFT_MARGIN), baseline, text);
            }
            Line::Left(text) => push_text(&mut content, LEFT_MARGIN, baseline, text),
            Line::Blank => {}
        }
        cursor += LINE_HEIGHT;
    }

    pages.push(content);
    pages
}

/// Serialize page content streams into a complete PDF 1.4 document.
///
/// Object layout: 1 catalog, 2 page tree, 3 font, then a page object and its
/// content stream for each page.
fn encode_document(pages: &[String]) -> Vec<u8> {
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + 2 * i).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Courier >>".to_string(),
    ];
    for (page_id, content) in page_ids.iter().zip(pages) {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            page_id + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ));
    }

    let mut out: Vec<u8> = Vec::with_capacity(1024 + pages.iter().map(String::len).sum::<usize>());
    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (idx, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", idx + 1).as_bytes());
    }

    let xref_offset = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for off in &offsets {
        xref.push_str(&format!("{off:010} 00000 n \n"));
    }
    out.extend_from_slice(xref.as_bytes());

    let digest = blake3::hash(&out).to_hex();
    let doc_id = &digest.as_str()[..32];
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R /ID [<{doc_id}> <{doc_id}>] >>\nstartxref\n{xref_offset}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );

    out
}

/// Render the forecast report: centered title, a blank line, then the
/// forecast table.
pub fn render_forecast_report(points: &[ForecastPoint]) -> Result<Vec<u8>, ReportError> {
    if points.is_empty() {
        return Err(ReportError::EmptyForecast);
    }

    let table = forecast_table_text(points);
    let mut lines = vec![Line::Centered(REPORT_TITLE), Line::Blank];
    lines.extend(table.lines().map(Line::Left));

    Ok(encode_document(&layout(&lines)))
}

/// Render and write the report to `path`, returning the bytes written.
///
/// The document is written to a uniquely named sibling file and renamed into
/// place, so concurrent exports never leave a torn file at `path`.
pub fn write_forecast_report<P: AsRef<Path>>(path: P, points: &[ForecastPoint]) -> Result<Vec<u8>, ReportError> {
    let path = path.as_ref();
    let bytes = render_forecast_report(points)?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.persist(path).map_err(|e| e.error)?;

    metrics::counter!("report_exports_total").increment(1);
    tracing::info!(path = %path.display(), points = points.len(), "forecast report written");
    Ok(bytes)
}
