pub mod align;
pub mod fas;
pub mod io;
pub mod maf;
pub mod trim;
