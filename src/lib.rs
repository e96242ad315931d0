pub mod app;
pub mod auth;
pub mod books;
pub mod config;
pub mod cron;
pub mod db;
pub mod error;
pub mod extractors;
pub mod images;
pub mod memory;
pub mod state;
pub mod storage;
