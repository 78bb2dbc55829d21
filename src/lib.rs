//! Bootstrap orchestrator for a local Open WebUI + Ollama setup.
//!
//! The engine brings up the model runtime and the front-end container,
//! narrating every step through an append-only activity log that an
//! independent status process tails; a flag file next to the log signals
//! terminal success.

pub mod launch;
