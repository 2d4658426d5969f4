mod bootstrap_configuration;
mod bootstrap_configuration_builder;
mod secure_client;

pub use bootstrap_configuration::*;
pub use bootstrap_configuration_builder::*;
pub use secure_client::*;
