//! Integration test crate for the Yatri workspace. The tests live in
//! `tests/`; this library is intentionally empty.
