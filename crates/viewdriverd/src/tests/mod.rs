//! Test suites spanning several modules.

pub(crate) mod support;
