use sha2::{Digest, Sha256};

// Record-separator control byte keeps "ab"+"c" and "a"+"bc" from
// colliding; it cannot appear in legitimate card text.
const FIELD_SEPARATOR: u8 = 0x1e;

/// Stable content fingerprint for a flashcard. Equal (front, back)
/// pairs hash identically across restarts and instances; the flashcard
/// table enforces global uniqueness on this value.
pub fn card_fingerprint(front: &str, back: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(front.as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(back.as_bytes());
    hex::encode(hasher.finalize())
}

/// Paragraph-based chunking for uploaded material.
pub fn chunk_material(content: &str) -> Vec<String> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(str::to_string)
        .collect()
}
