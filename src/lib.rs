pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod feed;
pub mod logging;
pub mod map;
pub mod registry;
pub mod selection;
pub mod status;
pub mod summary;
pub mod tree;
pub mod ui;
