//! Slack Integration - Socket Mode change-feed listener
//!
//! This crate provides the Slack interface for schemawatch:
//! - **Events** (`events`) - typed event envelope and wire parsing
//! - **Extractor** (`extract`) - change-feed attachment to `SchemaChange`
//! - **Router** (`router`) - per-event classification and handling
//! - **Socket Mode** (`socket`) - envelope loop with reconnection logic
//! - **Web API** (`web`) - `auth.test` / `conversations.info` / `users.info`
//!
//! # Architecture
//!
//! ```text
//! Socket Mode envelopes → SocketModeRunner (ack) → MessageRouter
//!     → extract_schema_change → PullRequestReader (GitHub)
//! ```
//!
//! Every failure is local to one event: the runner acknowledges each
//! envelope on receipt, routes it, logs any error, and moves on.

pub mod events;
pub mod extract;
pub mod router;
pub mod socket;
pub mod web;
