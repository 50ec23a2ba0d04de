pub mod scan;
pub mod signatures;
