#![allow(dead_code)]

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use materai::SourceFile;
use rust_xlsxwriter::Workbook;
use std::io::{Cursor, Read};
use zip::ZipArchive;

pub const HEADER: &str = "SID Number|Transaction Type|Transaction Date|Stamp Duty Fee|Gross Transaction Amount (IDR Equivalent)";

/// A pipe-delimited export with the standard header and the given lines.
pub fn export_file(name: &str, lines: &[&str]) -> SourceFile {
    let mut text = String::from(HEADER);
    for line in lines {
        text.push('\n');
        text.push_str(line);
    }
    text.push('\n');
    SourceFile::new(name, text)
}

/// A lookup workbook with `SID` and `Account` headers on the first sheet.
pub fn lookup_workbook(name: &str, pairs: &[(&str, &str)]) -> SourceFile {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "SID").unwrap();
    sheet.write_string(0, 1, "Account").unwrap();
    for (i, (sid, account)) in pairs.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, *sid).unwrap();
        sheet.write_string(row, 1, *account).unwrap();
    }
    let bytes = workbook.save_to_buffer().unwrap();
    SourceFile::new(name, bytes)
}

/// All rows (header included) of the named sheet in an xlsx buffer.
pub fn read_sheet(bytes: &[u8], sheet: &str) -> Vec<Vec<Data>> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.to_vec())).unwrap();
    let range = workbook.worksheet_range(sheet).unwrap();
    range.rows().map(|r| r.to_vec()).collect()
}

/// Numeric value of an exported cell, whichever numeric variant the reader chose.
pub fn number(cell: &Data) -> f64 {
    match cell {
        Data::Float(v) => *v,
        Data::Int(v) => *v as f64,
        other => panic!("expected a number, got {:?}", other),
    }
}

pub fn text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => Some(s.clone()),
        Data::Empty => None,
        other => panic!("expected text, got {:?}", other),
    }
}

/// Raw XML of one part of an xlsx package, e.g. "xl/styles.xml".
pub fn workbook_part(bytes: &[u8], part: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut file = archive.by_name(part).unwrap();
    let mut xml = String::new();
    file.read_to_string(&mut xml).unwrap();
    xml
}

/// Value of `name` in a single XML start tag.
pub fn xml_attr<'a>(element: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!(" {}=\"", name);
    let start = element.find(&needle)? + needle.len();
    let len = element[start..].find('"')?;
    Some(&element[start..start + len])
}

/// Start tags named `tag` (e.g. "col", "xf") inside `within`, in document order.
pub fn xml_elements<'a>(within: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{} ", tag);
    let mut found = Vec::new();
    let mut rest = within;
    while let Some(pos) = rest.find(&open) {
        let tail = &rest[pos..];
        let end = tail.find('>').map_or(tail.len(), |e| e + 1);
        found.push(&tail[..end]);
        rest = &tail[end..];
    }
    found
}

/// Width and style index of a 1-based worksheet column from its `<col>` entry.
pub fn column_settings(sheet_xml: &str, column: u32) -> Option<(f64, Option<usize>)> {
    xml_elements(sheet_xml, "col").into_iter().find_map(|col| {
        let min: u32 = xml_attr(col, "min")?.parse().ok()?;
        let max: u32 = xml_attr(col, "max")?.parse().ok()?;
        if !(min..=max).contains(&column) {
            return None;
        }
        let width = xml_attr(col, "width")?.parse().ok()?;
        let style = xml_attr(col, "style").and_then(|s| s.parse().ok());
        Some((width, style))
    })
}

/// Number format code behind a cell style index, resolving built-in ids.
pub fn style_number_format(styles_xml: &str, style: usize) -> Option<String> {
    let cell_xfs = &styles_xml[styles_xml.find("<cellXfs")?..];
    let xf = *xml_elements(cell_xfs, "xf").get(style)?;
    let id = xml_attr(xf, "numFmtId")?;
    let custom = xml_elements(styles_xml, "numFmt")
        .into_iter()
        .find(|f| xml_attr(f, "numFmtId") == Some(id))
        .and_then(|f| xml_attr(f, "formatCode"));
    match (custom, id) {
        (Some(code), _) => Some(code.replace("&quot;", "\"")),
        // built-in Excel formats are referenced by id only
        (None, "4") => Some("#,##0.00".to_string()),
        (None, "0") => Some("General".to_string()),
        (None, other) => Some(format!("builtin:{}", other)),
    }
}
