//! Tarpit — a scam-engagement honeypot engine.
//!
//! Single Rust library plus binary. Engages an adversarial correspondent in
//! multi-turn conversation, classifies the exchange as fraudulent, extracts
//! financial/contact identifiers from free text, and fires a one-shot
//! intelligence report once enough evidence has accumulated. In-character
//! dialogue comes from an external generator; every internal failure
//! degrades to a safe canned reply.
//!
//! See `DESIGN.md` for architecture documentation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod logging;
pub mod patterns;

pub mod detection;
pub mod intel;
pub mod session;

pub mod engage;

pub mod generator;
pub mod report;
