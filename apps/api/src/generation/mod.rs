// Sticker sheet generation: values → pages → rendered archives → download.
// Rendering is CPU-bound and runs inside tokio::task::spawn_blocking.

pub mod bundle;
pub mod generator;
pub mod handlers;
pub mod naming;
