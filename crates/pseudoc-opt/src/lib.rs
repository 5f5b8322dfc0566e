//! Peephole optimiser: constant folding and dead-temporary elimination
//! over the IR (`spec.md` §4.5).

mod optimize;

pub use optimize::optimize;
