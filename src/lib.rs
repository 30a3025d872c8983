pub mod aggregate;
pub mod app;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod notes;
pub mod output;
pub mod reader;
pub mod resolver;
pub mod store;
pub mod table;
pub mod transport;
