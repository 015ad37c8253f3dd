pub mod document;
pub mod signer;
