pub mod games;
pub mod model;
