//! Study Companion — client-side session and study-artifact state for a
//! document-grounded study assistant.

pub mod backend;
pub mod chat;
pub mod config;
pub mod error;
pub mod study;
pub mod view;
