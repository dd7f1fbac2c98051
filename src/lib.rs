pub mod api;
pub mod billing;
pub mod db;
pub mod error;
pub mod models;
