use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Derive the cache key for an item identifier.
///
/// URL-safe base64 (unpadded) over the raw identifier bytes. Deterministic,
/// and injective: distinct identifiers can never collide because the encoding
/// is reversible. The URL-safe alphabet keeps the key usable verbatim as a
/// path segment in store namespaces.
pub fn fingerprint(guid: &str) -> String {
    URL_SAFE_NO_PAD.encode(guid.as_bytes())
}
