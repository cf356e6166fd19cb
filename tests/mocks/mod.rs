pub mod generator;
pub mod source;
