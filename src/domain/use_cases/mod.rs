pub mod submit;
pub mod validate;
