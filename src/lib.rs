//! Dream oracle - turns a written dream into AI-generated images and a reading
//!
//! A dream narrative is expanded into photorealistic image prompts, rendered
//! through an image generation API, and interpreted by a chat model that
//! answers with a structured JSON reading. Results live in an in-memory
//! session history.

pub mod ai;
pub mod app;
pub mod error;
pub mod image;
pub mod models;
pub mod parse;
pub mod present;
pub mod progress;
pub mod prompts;
pub mod repl;
pub mod session;
pub mod share;
pub mod variation;

pub use error::{Error, Result};
