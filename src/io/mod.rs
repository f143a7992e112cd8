pub mod board_file;
pub mod scroll_file;

pub use board_file::{load_document, save_document, BoardDocument, LocalBoard};
pub use scroll_file::ScrollFile;
