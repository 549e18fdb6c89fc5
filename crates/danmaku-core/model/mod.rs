//! Input data model: comment records, modes and colors

mod color;
mod comment;

pub use color::Rgb;
pub use comment::{CommentRecord, Mode};
