pub mod aligner;
pub mod binner;
