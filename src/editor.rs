//! Client-side editing state: validated drafts and the chapter list of an
//! article under edit.

mod chapters;
pub use chapters::{ChapterEntry, ChapterList, EditorError, Partition};

mod form;
pub use form::Form;
