pub mod editors;
pub mod gallery;
pub mod preview;
pub mod templates;
