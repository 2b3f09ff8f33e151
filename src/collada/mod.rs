//! COLLADA codec (frontend + backend). See `SPEC_FULL.md` §4.10.

mod export;
mod import;

pub use export::export_collada;
pub use import::import_collada;
