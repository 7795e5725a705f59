pub mod game;
pub mod health_check;
