pub mod book;
pub mod common;
pub mod completions;
pub mod consult;
pub mod delete;
pub mod list;
pub mod status;
pub mod sync;
