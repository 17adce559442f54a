pub mod antonyms;
pub mod text;

pub use antonyms::AntonymTable;
