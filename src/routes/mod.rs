pub mod health;
pub mod paper;
