pub mod document;
pub mod document_file;
pub mod document_signer;
pub mod refresh_token;
pub mod signer;
pub mod user;
