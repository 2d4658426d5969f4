mod jks_codec;
mod pem_bundle;
mod pkcs12_crypto;
mod pkcs12_reader;
mod trust_material;
mod trust_store_loader;

pub use trust_material::*;
pub use trust_store_loader::*;
