pub mod json_source;
pub mod records;
pub mod registry;
pub mod resolver;
pub mod source;
