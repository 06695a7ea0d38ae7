mod collection;
mod number;

pub use self::collection::{Collection, FileEntry};
pub use self::number::{FileNumber, Scheme};
