pub mod eval;
pub mod grade;
pub mod init;
pub mod render;
pub mod sample;
pub mod validate;
