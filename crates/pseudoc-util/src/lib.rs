//! pseudoc-util - foundation types shared by every stage of the pseudoc
//! pipeline.
//!
//! A compilation walks `source -> tokens -> AST -> IR -> IR' -> result`
//! strictly left to right; every stage needs to point back into the
//! original source (`span`), needs to name things cheaply (`symbol`), and
//! needs to report failure the same way (`diagnostic`). Those three
//! concerns live here so the stage crates don't each reinvent them.

pub mod diagnostic;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, Handler, Level, Stage};
pub use span::Span;
pub use symbol::{Interner, Symbol};

pub use rustc_hash::{FxHashMap, FxHashSet};
