//! Stack growth for deeply recursive parsing and evaluation
//!
//! The parser and the interpreter both recurse once per nesting level (and
//! the interpreter once per skill call), so deep programs would otherwise
//! exhaust the host thread's stack long before any language limit applies.

/// Grow the stack when less than this remains (100KB)
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment (1MB)
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first moving to a fresh stack segment if the current one is
/// nearly exhausted
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_recursion() {
        fn depth(n: u64) -> u64 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { depth(n - 1) + 1 })
        }
        assert_eq!(depth(200_000), 200_000);
    }
}
