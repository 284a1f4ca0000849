use tessera_core::KeyScheme;

/// BLAKE3 hash (32 bytes).
pub type Hash = [u8; 32];

/// Hash arbitrary data using BLAKE3.
pub fn hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Content-addressed id of a public key inside a document: `#0x<hex>`.
///
/// The scheme tag is hashed together with the key bytes so the same bytes
/// under two schemes never collide.
pub fn key_id(scheme: KeyScheme, public_key: &[u8]) -> String {
    let mut input = Vec::with_capacity(1 + public_key.len());
    input.push(scheme.tag());
    input.extend_from_slice(public_key);
    format!("#0x{}", hex::encode(hash(&input)))
}
