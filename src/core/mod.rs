pub mod app;
pub mod appearance;
pub mod config;
pub mod conversation;
pub mod markup;
pub mod message;
pub mod storage;
