pub mod series;
pub mod visibility;
