pub mod catalog;
pub mod concat;
pub mod convert;
pub mod dedup;
pub mod inspect;
