//! Detects posts on supported social platforms, injects a save control into
//! each one and submits the post to the Linkogenei save service on click.
//!
//! The pipeline runs against an in-process page model ([`dom`]) so it can be
//! driven by a capture script, a test, or the bundled CLI.

pub mod annotate;
pub mod cli;
pub mod dom;
pub mod engine;
pub mod extract;
pub mod platform;
pub mod scan;
pub mod submit;
