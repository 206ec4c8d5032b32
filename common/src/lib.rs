pub mod languages;
pub mod models;
