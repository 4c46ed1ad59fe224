pub mod analysis;
pub mod entities;
pub mod risk;
pub mod sentiment;
