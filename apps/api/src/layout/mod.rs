// Sheet layout: splitting the value list across template copies.
// Pure computation, no template access. Page descriptors feed the docx engine.

pub mod mapping;
pub mod paginator;

pub use paginator::{PageDescriptor, PaginationError};
