//! Pipeline stages for document analysis.
//!
//! Each submodule implements one step; [`session`] strings them together
//! into the per-tool state machine.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ validate ──▶ [encode] ──▶ backend ──▶ decode ──▶ session
//! (path/URL)  (type/size/   (images)    (HTTP)     (sentinels,  (state,
//!              signature)                           envelopes)   results)
//! ```
//!
//! 1. [`input`]   : read a local file or download a URL into memory
//! 2. [`validate`]: allow-list, size limit and magic-number checks; pure
//! 3. [`encode`]  : downscale and base64 radiographs; runs in `spawn_blocking`
//! 4. [`backend`] : the network seam; exactly one attempt per call
//! 5. [`decode`]  : turn raw bodies into typed outcomes, including in-band
//!    failures signalled with HTTP 200
//! 6. [`session`] : drive the above per [`profile`], with [`demo`] content
//!    standing in for the backend in demo mode

pub mod backend;
pub mod decode;
pub mod demo;
pub mod encode;
pub mod input;
pub mod profile;
pub mod session;
pub mod validate;
