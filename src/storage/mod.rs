//! Storage layer.
//!
//! Every artifact lives in its own file under the repository's data
//! directory and is replaced through a temp-file-then-rename write:
//! - `config.json`: store configuration
//! - `notes/<YYYY>/<MM>/<id>.json`: one note per file
//! - `tags/<tag>.md`: tag descriptions
//! - `views/<id>.json`: spatial views (read-only)

mod notes;
mod paths;
mod port;
mod tags;
mod views;

pub use notes::{NewNote, NoteRecordStore, StoredNote};
pub use paths::{DATA_DIR_NAME, StorePaths};
pub use port::{LocalStorage, StoragePort};
pub use tags::{TagDescriptionStore, is_valid_tag_name};
pub(crate) use tags::ensure_valid as ensure_valid_tag;
pub use views::ViewStore;
