//! Vault mirror: one markdown file per booking

mod codec;
mod viewer;
mod writer;

pub use codec::{
    format_mirror_time, mirror_file_name, render_mirror_content, sanitize_name, MirrorFile,
    BOOKING_PREFIX, CONSULTATION_PREFIX, CONTACT_NOT_PROVIDED, MIRROR_EXTENSION,
    MAX_NAME_BYTES, MIRROR_TIME_ZONE, NOT_PROVIDED, RECORD_DIR_NAME,
};
pub use viewer::{NoopNotifier, ObsidianNotifier, ViewerNotifier};
pub use writer::{
    ensure_record_dir, mirror_file_exists, write_if_absent, write_mirror_file,
    InlineMirrorWriter, WriteOutcome,
};
