pub mod heading;
pub mod lecture_file;
pub mod page_number;
pub mod reference;

pub use heading::{Heading, HeadingType, gen_id};
pub use lecture_file::{LectureFile, heading_type_for, valid_file_bgn};
pub use page_number::{PageNumber, PageValue};
pub use reference::{Reference, ReferenceKind};
