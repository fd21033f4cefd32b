//! GitHub Integration - pull request lookups
//!
//! This crate provides the read-only GitHub surface for schemawatch: given
//! an organization, repository, and pull request number, fetch the pull
//! request's description text. The router consumes it through the
//! [`PullRequestReader`] trait so tests can substitute fakes.
//!
//! Rate-limit waiting and retry are the remote service's/deployment's
//! concern; this client surfaces failures and applies a bounded per-call
//! timeout.

mod client;

pub use client::{Client, GitHubError, Options, PullRequestReader, DEFAULT_TIMEOUT};
