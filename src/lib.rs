pub mod api;
pub mod app;
pub mod comments;
pub mod config;
pub mod errors;
pub mod flex_num;
pub mod handlers;
pub mod library;
pub mod menu;
pub mod player;
pub mod router;
pub mod search;
pub mod setup;
pub mod storage;
pub mod toast;
pub mod ui;
