//! Submission module
//!
//! Packages a session's consensus sequence into the outbound wire contract,
//! enforces the local acceptance gate before any network traffic, and talks
//! to the contribution endpoint with retry/backoff.

pub mod assembler;
pub mod client;
pub mod payload;

pub use assembler::SubmissionAssembler;
pub use client::{SubmissionClient, SubmitConfig};
pub use payload::{ClientMetadata, SubmissionAccepted, SubmissionPayload, SubmissionRejected};
