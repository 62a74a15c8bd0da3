pub mod pathext;
pub mod text;
