pub mod config;
pub mod controller;
pub mod dom;
pub mod hub;
pub mod owner;
pub mod panel;
pub mod store;
pub mod template;
pub mod transport;
