//! # Agent Builder
//!
//! A small HTTP service that lets a user chat with a tool-using LLM agent.
//!
//! This library provides:
//! - An HTTP API that streams agent output as Server-Sent Events
//! - A reactive agent loop over a streaming chat model (Google Gemini)
//! - A weather lookup tool backed by the Open-Meteo API
//!
//! ## Architecture
//!
//! A chat request carries the whole conversation and the agent settings:
//! 1. Rebuild the message history and append the new user message
//! 2. Build a fresh agent from the request's model, key, prompt and tools
//! 3. Stream model tokens; run any tool the model asks for and feed back the result
//! 4. Relay tokens and tool notices to the client, then a `[DONE]` sentinel
//!
//! ## Example
//!
//! ```rust,ignore
//! use agent_builder::{api, config::Config};
//!
//! let config = Config::from_env()?;
//! api::serve(config).await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod http;
pub mod llm;
pub mod tools;

pub use config::Config;
