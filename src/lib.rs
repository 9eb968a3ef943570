pub mod ai;
pub mod catalog;
pub mod cli;
pub mod core;
pub mod openai;
pub mod recommend;
pub mod spotify;
pub mod sync;
