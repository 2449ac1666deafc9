pub mod bundle;
pub mod decode;
pub mod text;
