//! Output file names.

/// Builds every output name from one stem, e.g. `USB_Stickers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNaming {
    stem: String,
}

impl OutputNaming {
    pub fn new(stem: impl Into<String>) -> Self {
        Self { stem: stem.into() }
    }

    /// The only document of a single-page run.
    pub fn single(&self) -> String {
        format!("{}.docx", self.stem)
    }

    /// One of several separate documents.
    pub fn page(&self, page_number: u32) -> String {
        format!("{}_{page_number}.docx", self.stem)
    }

    /// The fused document of a multi-page run.
    pub fn fused(&self, page_count: usize) -> String {
        format!("{}_Combined_{page_count}pages.docx", self.stem)
    }

    /// Container bundling several separate documents.
    pub fn bundle(&self) -> String {
        format!("{}_All.zip", self.stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        let naming = OutputNaming::new("USB_Stickers");
        assert_eq!(naming.single(), "USB_Stickers.docx");
        assert_eq!(naming.page(3), "USB_Stickers_3.docx");
        assert_eq!(naming.fused(4), "USB_Stickers_Combined_4pages.docx");
        assert_eq!(naming.bundle(), "USB_Stickers_All.zip");
    }
}
