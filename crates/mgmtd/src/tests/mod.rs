//! Test suites for the management gateway.

mod pipeline_behaviour;
mod pipeline_unit;
pub(crate) mod support;
