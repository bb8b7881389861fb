//! Packaging of generated archives into one download.

use std::io::{Cursor, Write};

use anyhow::{Context, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::docx::DOCX_CONTENT_TYPE;
use crate::generation::generator::NamedArchive;
use crate::generation::naming::OutputNaming;

pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// A file ready to be sent to the client.
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// A single archive is delivered as-is; several are bundled into one zip.
pub fn into_download(mut archives: Vec<NamedArchive>, naming: &OutputNaming) -> Result<Download> {
    if archives.len() == 1 {
        if let Some(archive) = archives.pop() {
            return Ok(Download {
                filename: archive.name,
                content_type: DOCX_CONTENT_TYPE,
                bytes: archive.bytes,
            });
        }
    }
    Ok(Download {
        filename: naming.bundle(),
        content_type: ZIP_CONTENT_TYPE,
        bytes: bundle(&archives)?,
    })
}

/// Zips the archives under their own names, in order.
///
/// `.docx` parts are already deflated, so entries are stored.
pub fn bundle(archives: &[NamedArchive]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for archive in archives {
        writer
            .start_file(archive.name.as_str(), options)
            .with_context(|| format!("Failed to add {} to bundle", archive.name))?;
        writer.write_all(&archive.bytes)?;
    }
    let cursor = writer.finish().context("Failed to finish bundle")?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::test_support::{read_part, read_part_names};

    fn archive(name: &str, content: &str) -> NamedArchive {
        NamedArchive {
            name: name.to_string(),
            bytes: content.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_single_archive_is_delivered_directly() {
        let naming = OutputNaming::new("USB_Stickers");
        let download = into_download(vec![archive("USB_Stickers.docx", "doc")], &naming).unwrap();
        assert_eq!(download.filename, "USB_Stickers.docx");
        assert_eq!(download.content_type, DOCX_CONTENT_TYPE);
        assert_eq!(download.bytes, b"doc");
    }

    #[test]
    fn test_several_archives_are_bundled_in_order() {
        let naming = OutputNaming::new("USB_Stickers");
        let download = into_download(
            vec![
                archive("USB_Stickers_1.docx", "one"),
                archive("USB_Stickers_2.docx", "two"),
            ],
            &naming,
        )
        .unwrap();

        assert_eq!(download.filename, "USB_Stickers_All.zip");
        assert_eq!(download.content_type, ZIP_CONTENT_TYPE);
        assert_eq!(
            read_part_names(&download.bytes),
            vec!["USB_Stickers_1.docx", "USB_Stickers_2.docx"]
        );
        assert_eq!(read_part(&download.bytes, "USB_Stickers_2.docx"), "two");
    }
}
