// src/lib.rs

pub mod db;
pub mod repositories;
pub mod services;
pub mod test_utils;
pub mod utils;

pub use db::Database;
pub use spinwheel_common::error::Error;
pub use spinwheel_common::models;
