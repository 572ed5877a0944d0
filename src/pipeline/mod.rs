//! Pipeline stages around the per-format converters.
//!
//! Each submodule implements exactly one step. Converters themselves live in
//! [`crate::converters`]; the stages here decide which converter runs and
//! tidy what it produced.
//!
//! ## Data Flow
//!
//! ```text
//! bytes ──▶ detect ──▶ converter ──▶ postprocess ──▶ Markdown
//!          (format)    (registry)     (cleanup)
//! ```
//!
//! 1. [`detect`] — derive a format from the source key's suffix or sniff the
//!    byte signature
//! 2. converter — looked up in the [`crate::ConverterRegistry`] by
//!    [`crate::convert`]
//! 3. [`postprocess`] — deterministic cleanup rules plus optional truncation

pub mod detect;
pub mod postprocess;
