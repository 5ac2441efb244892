// Public API for integration tests and the binary

pub mod api;
pub mod broadcast;
pub mod config;
pub mod lexicon;
pub mod protocol;
pub mod puzzle;
pub mod state;
pub mod transform;
pub mod translate;
pub mod types;
pub mod ws;
