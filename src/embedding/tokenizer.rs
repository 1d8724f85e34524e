/// Lower-cased runs of ASCII alphanumerics; everything else separates tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Bucket for `term` in a vector of `buckets` slots.
///
/// FNV-1a; assignment must not change between runs, since persisted
/// embeddings are scored against freshly computed query vectors.
pub fn bucket(term: &str, buckets: usize) -> usize {
    let hash = term.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    });
    (hash % buckets.max(1) as u64) as usize
}
