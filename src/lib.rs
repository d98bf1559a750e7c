pub mod ai;
pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod protocol;
pub mod session;
pub mod types;
pub mod wasm;

pub use wasm::wasm_ready;
