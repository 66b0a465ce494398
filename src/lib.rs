pub mod app;
pub mod config;
pub mod generator;
pub mod model;
pub mod session;
pub mod share;
pub mod store;
pub mod view;
