//! Shared doubles for the gateway test suites.

mod connector;
mod directory;
mod mocks;
mod restrictor;

pub use connector::RecordingConnector;
pub use directory::{InMemoryDirectory, resource};
pub use mocks::{MockDirectory, MockPolicy, MockRemoteConnector};
pub use restrictor::SelectiveRestrictor;
