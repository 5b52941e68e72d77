//! Cross-module scenario tests for the ganged-machines workspace live in
//! `tests/`. This crate intentionally exports nothing.
