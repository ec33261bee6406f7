/// Errors produced by hash and OID operations.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("invalid hex in object id '{input}'")]
    InvalidHex { input: String },

    #[error("invalid hex length: expected 40, got {actual}")]
    InvalidHexLength { actual: usize },

    #[error("invalid hash length: expected 20 bytes, got {actual}")]
    InvalidHashLength { actual: usize },

    #[error("SHA-1 collision detected")]
    Sha1Collision,
}
