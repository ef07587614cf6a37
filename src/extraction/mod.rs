//! Markup → record. Everything here works on captured page source and never
//! touches the live browser.

pub mod dom;
pub mod fields;
pub mod patterns;

pub use dom::MarkupSnapshot;
pub use fields::FieldExtractor;
pub use patterns::DescriptionFields;
