// Document engine for the sticker sheet template (.docx).
// bookmarks: region index; substitution: slot rewriting;
// fusion: multi-page renumbering; template: archive load and rewrite.

pub mod bookmarks;
pub mod fusion;
pub mod substitution;
pub mod template;

#[cfg(test)]
pub mod test_support;

pub use substitution::RunFormatting;
pub use template::{Template, TemplateError, TemplateSummary, DOCX_CONTENT_TYPE};
