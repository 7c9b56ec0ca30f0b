pub mod libs;

pub use crate::libs::fas::{next_fas_block, FasBlock, FasEntry};
pub use crate::libs::io::{reader, writer};
