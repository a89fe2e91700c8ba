//! Test suites for the management client.

mod behaviour;
mod support;
