//! Stack headroom for passes that recurse through [`Expr`](crate::expr::Expr).
//!
//! Parsers happily build expressions nested far deeper than a thread's stack
//! can recurse. Every [`Expr::accept`](crate::expr::Expr::accept) (and the
//! structural `Clone`/`PartialEq`/`Debug` impls) runs its step through
//! [`ensure_sufficient_stack`], which switches to a freshly allocated segment
//! when the current one is nearly used up. On wasm32 the step runs in place.

/// Headroom that must remain before a step runs on the current segment.
const MIN_HEADROOM: usize = 128 * 1024;

/// Size of each segment allocated once the headroom is gone.
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run one recursive step of a tree walk, moving to a new stack segment first
/// when less than [`MIN_HEADROOM`] is left.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(step: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(MIN_HEADROOM, SEGMENT_SIZE, step)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(step: impl FnOnce() -> R) -> R {
    step()
}
