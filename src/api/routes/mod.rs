pub mod health;
pub mod websites;
