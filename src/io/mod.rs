//! Random-access reading over an open archive source.

mod local;
mod reader;

pub use reader::BinaryReader;
