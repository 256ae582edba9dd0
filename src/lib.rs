//! Indify: rewrite direct method calls into dynamic call sites
//!
//! Indify takes a compiled, binary unit and replaces every direct
//! method-invocation instruction in its method bodies with an
//! `invokedynamic`-style call site bound to an external bootstrap
//! procedure, so a late-dispatch strategy can be substituted for static
//! linkage at load time. Everything other than call instructions passes
//! through byte-for-byte.
//!
//! # Quick Start
//!
//! ```no_run
//! use indify::rewrite::{rewrite_file, Discard};
//! use std::path::Path;
//!
//! fn main() -> indify::Result<()> {
//!     rewrite_file(Path::new("Foo.cu"), Path::new("Foo.indy.cu"), &mut Discard)?;
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! The pipeline flows: input bytes → [`classfile::parse`] → [`rewrite`] →
//! [`classfile::encode`] → output bytes
//!
//! | Category | Modules |
//! |----------|---------|
//! | **Model** | [`classfile`] (unit structure, instructions, dispatch kinds), [`descriptor`] |
//! | **Core** | [`rewrite`] (per-method call rewriting, observers) |
//! | **Support** | [`error`](Error) |

pub mod classfile;
pub mod descriptor;
pub mod error;
pub mod rewrite;

pub use classfile::{BootstrapRef, ClassFile, DispatchKind, Instruction};
pub use error::{Error, Result};
pub use rewrite::{rewrite_file, transform, CallSiteObserver};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
