//! In-memory template fixtures for tests.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::docx::substitution::RunFormatting;
use crate::docx::template::{Template, DOCUMENT_PART};

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"</Types>"#,
);

const RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"</Relationships>"#,
);

const SLOTS_PER_ROW: u32 = 5;

/// A sticker sheet body with slots `1..=capacity` in a single table.
///
/// Slot `i` carries bookmark id `i`; a `_GoBack` bookmark with id 0 sits before
/// the table. Odd slots hold an empty bold run, even slots are bare markers.
/// Slots listed in `omit` get no bookmark at all.
pub fn document_xml(capacity: u32, omit: &[u32]) -> String {
    let mut rows = String::new();
    let mut slot = 1;
    while slot <= capacity {
        rows.push_str("<w:tr>");
        for _ in 0..SLOTS_PER_ROW {
            if slot > capacity {
                break;
            }
            rows.push_str("<w:tc><w:p>");
            if !omit.contains(&slot) {
                rows.push_str(&format!(r#"<w:bookmarkStart w:id="{slot}" w:name="n{slot}"/>"#));
                if slot % 2 == 1 {
                    rows.push_str(r#"<w:r><w:rPr><w:b/><w:sz w:val="20"/></w:rPr><w:t></w:t></w:r>"#);
                }
                rows.push_str(&format!(r#"<w:bookmarkEnd w:id="{slot}"/>"#));
            }
            rows.push_str("</w:p></w:tc>");
            slot += 1;
        }
        rows.push_str("</w:tr>");
    }

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
            r#"<w:p><w:bookmarkStart w:id="0" w:name="_GoBack"/><w:bookmarkEnd w:id="0"/></w:p>"#,
            "<w:tbl><w:tblPr/><w:tblGrid/>{rows}</w:tbl>",
            "<w:p/><w:sectPr/></w:body></w:document>",
        ),
        rows = rows
    )
}

/// Packs `body` into a minimal `.docx` archive.
pub fn template_bytes(body: &str) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", RELS),
        (DOCUMENT_PART, body),
    ] {
        writer.start_file(name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A loaded template with `capacity` slots and default formatting.
pub fn template(capacity: u32) -> Template {
    Template::from_bytes(
        template_bytes(&document_xml(capacity, &[])),
        capacity,
        RunFormatting::default(),
    )
    .unwrap()
}

pub fn read_document_part(archive: &[u8]) -> String {
    read_part(archive, DOCUMENT_PART)
}

pub fn read_part(archive: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(archive)).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut out = String::new();
    part.read_to_string(&mut out).unwrap();
    out
}

pub fn read_part_names(archive: &[u8]) -> Vec<String> {
    let mut archive = ZipArchive::new(Cursor::new(archive)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}
