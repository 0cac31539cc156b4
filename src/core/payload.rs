//! Binary payload encoding for on-chain verification.
//!
//! Layout follows the Solidity contract ABI (v2 head/tail encoding):
//!
//! - An entry is `abi.encode(uint32 estateID, string description, string cid)`:
//!   three head words (the id, then one offset per string) followed by each
//!   string as a length word plus its bytes right-padded to 32.
//! - The aggregate is `abi.encode(bytes[] entries)`: an offset word, the
//!   array length, one offset per element relative to the first offset word,
//!   then each element as length plus padded bytes.
//!
//! Decoders are strict: every offset and length is bounds-checked and the
//! high-order bytes of numeric words must be zero.

use thiserror::Error;

/// ABI word size in bytes
pub const WORD: usize = 32;

/// Head size of an entry: id, description offset, address offset
const ENTRY_HEAD: usize = 3 * WORD;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("identifier {0} does not fit in uint32")]
    IdentifierOutOfRange(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("word at offset {offset} does not fit in a usize")]
    ValueOverflow { offset: usize },

    #[error("word at offset {offset} is not a valid uint32")]
    InvalidUint32 { offset: usize },

    #[error("string at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },

    #[error("hex decode failed: {0}")]
    Hex(String),
}

/// Field values recovered from one encoded entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEntry {
    pub estate_id: u32,
    pub description: String,
    pub content_address: String,
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

/// Size of a dynamic value in the tail: length word plus padded data
fn tail_len(data: &[u8]) -> usize {
    WORD + padded_len(data.len())
}

fn push_word(buf: &mut Vec<u8>, value: u64) {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    buf.extend_from_slice(&word);
}

fn push_dynamic(buf: &mut Vec<u8>, data: &[u8]) {
    push_word(buf, data.len() as u64);
    buf.extend_from_slice(data);
    let padding = padded_len(data.len()) - data.len();
    buf.resize(buf.len() + padding, 0);
}

/// Narrow an estate id to the `uint32` the contract expects
pub fn checked_id(estate_id: i64) -> Result<u32, EncodeError> {
    u32::try_from(estate_id).map_err(|_| EncodeError::IdentifierOutOfRange(estate_id))
}

/// Encode one `(uint32, string, string)` entry.
///
/// Fails when `estate_id` is negative or above `u32::MAX`.
pub fn encode_entry(
    estate_id: i64,
    description: &str,
    content_address: &str,
) -> Result<Vec<u8>, EncodeError> {
    let id = checked_id(estate_id)?;

    let description = description.as_bytes();
    let content_address = content_address.as_bytes();

    let description_offset = ENTRY_HEAD;
    let address_offset = description_offset + tail_len(description);

    let mut buf = Vec::with_capacity(address_offset + tail_len(content_address));
    push_word(&mut buf, u64::from(id));
    push_word(&mut buf, description_offset as u64);
    push_word(&mut buf, address_offset as u64);
    push_dynamic(&mut buf, description);
    push_dynamic(&mut buf, content_address);

    Ok(buf)
}

/// Encode an ordered list of entries as a single `bytes[]` value
pub fn encode_aggregate<E: AsRef<[u8]>>(entries: &[E]) -> Vec<u8> {
    let tails: usize = entries.iter().map(|e| tail_len(e.as_ref())).sum();
    let mut buf = Vec::with_capacity(2 * WORD + entries.len() * WORD + tails);

    // Single top-level dynamic argument: its data starts right after this word
    push_word(&mut buf, WORD as u64);
    push_word(&mut buf, entries.len() as u64);

    let mut offset = entries.len() * WORD;
    for entry in entries {
        push_word(&mut buf, offset as u64);
        offset += tail_len(entry.as_ref());
    }
    for entry in entries {
        push_dynamic(&mut buf, entry.as_ref());
    }

    buf
}

/// Render bytes the way an ethers ABI coder returns them
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a `0x`-prefixed (or bare) hex string
pub fn from_hex(text: &str) -> Result<Vec<u8>, DecodeError> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(digits).map_err(|e| DecodeError::Hex(e.to_string()))
}

fn word_at(data: &[u8], offset: usize) -> Result<&[u8], DecodeError> {
    let end = offset.checked_add(WORD).ok_or(DecodeError::ValueOverflow { offset })?;
    data.get(offset..end).ok_or(DecodeError::Truncated {
        needed: end,
        available: data.len(),
    })
}

fn read_usize(data: &[u8], offset: usize) -> Result<usize, DecodeError> {
    let word = word_at(data, offset)?;
    if word[..WORD - 8].iter().any(|&b| b != 0) {
        return Err(DecodeError::ValueOverflow { offset });
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(low)).map_err(|_| DecodeError::ValueOverflow { offset })
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, DecodeError> {
    let word = word_at(data, offset)?;
    if word[..WORD - 4].iter().any(|&b| b != 0) {
        return Err(DecodeError::InvalidUint32 { offset });
    }
    let mut low = [0u8; 4];
    low.copy_from_slice(&word[WORD - 4..]);
    Ok(u32::from_be_bytes(low))
}

fn read_dynamic(data: &[u8], offset: usize) -> Result<&[u8], DecodeError> {
    let len = read_usize(data, offset)?;
    let start = offset + WORD;
    let end = start
        .checked_add(len)
        .ok_or(DecodeError::ValueOverflow { offset })?;
    data.get(start..end).ok_or(DecodeError::Truncated {
        needed: end,
        available: data.len(),
    })
}

fn read_string(data: &[u8], offset: usize) -> Result<String, DecodeError> {
    let bytes = read_dynamic(data, offset)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { offset })
}

/// Decode one entry produced by [`encode_entry`]
pub fn decode_entry(data: &[u8]) -> Result<DecodedEntry, DecodeError> {
    let estate_id = read_u32(data, 0)?;
    let description_offset = read_usize(data, WORD)?;
    let address_offset = read_usize(data, 2 * WORD)?;

    Ok(DecodedEntry {
        estate_id,
        description: read_string(data, description_offset)?,
        content_address: read_string(data, address_offset)?,
    })
}

/// Decode an aggregate produced by [`encode_aggregate`] into its raw entries
pub fn decode_aggregate(data: &[u8]) -> Result<Vec<Vec<u8>>, DecodeError> {
    let array_offset = read_usize(data, 0)?;
    let count = read_usize(data, array_offset)?;
    let base = array_offset + WORD;

    // Each element needs at least its offset word; reject absurd counts early
    let heads = count
        .checked_mul(WORD)
        .and_then(|h| h.checked_add(base))
        .ok_or(DecodeError::ValueOverflow { offset: array_offset })?;
    if heads > data.len() {
        return Err(DecodeError::Truncated {
            needed: heads,
            available: data.len(),
        });
    }

    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let relative = read_usize(data, base + i * WORD)?;
        let offset = base
            .checked_add(relative)
            .ok_or(DecodeError::ValueOverflow { offset: base + i * WORD })?;
        entries.push(read_dynamic(data, offset)?.to_vec());
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(hex_words: &[&str]) -> Vec<u8> {
        hex_words
            .iter()
            .flat_map(|w| {
                let padded = format!("{:0>64}", w);
                hex::decode(padded).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_entry_matches_solidity_layout() {
        let encoded = encode_entry(1, "a", "b").unwrap();
        let mut expected = words(&["1", "60", "a0", "1"]);
        expected.extend(hex::decode(format!("61{}", "00".repeat(31))).unwrap());
        expected.extend(words(&["1"]));
        expected.extend(hex::decode(format!("62{}", "00".repeat(31))).unwrap());

        assert_eq!(encoded.len(), 7 * WORD);
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_empty_strings_have_no_data_words() {
        let encoded = encode_entry(7, "", "").unwrap();
        assert_eq!(encoded, words(&["7", "60", "80", "0", "0"]));
    }

    #[test]
    fn test_aggregate_matches_solidity_layout() {
        let encoded = encode_aggregate(&[vec![0xabu8]]);
        let mut expected = words(&["20", "1", "20", "1"]);
        expected.extend(hex::decode(format!("ab{}", "00".repeat(31))).unwrap());
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_empty_aggregate() {
        let empty: [Vec<u8>; 0] = [];
        assert_eq!(encode_aggregate(&empty), words(&["20", "0"]));
        assert!(decode_aggregate(&encode_aggregate(&empty)).unwrap().is_empty());
    }

    #[test]
    fn test_identifier_range() {
        assert!(encode_entry(0, "d", "c").is_ok());
        assert!(encode_entry(u32::MAX as i64, "d", "c").is_ok());
        assert_eq!(
            encode_entry(u32::MAX as i64 + 1, "d", "c"),
            Err(EncodeError::IdentifierOutOfRange(4_294_967_296))
        );
        assert_eq!(
            encode_entry(-1, "d", "c"),
            Err(EncodeError::IdentifierOutOfRange(-1))
        );
    }

    #[test]
    fn test_entry_round_trip_with_multibyte_text() {
        let description = "ul. Żółkiewskiego 12, Kraków, 31-000, a long enough line to span words";
        let encoded = encode_entry(184_713_191, description, "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG").unwrap();
        let decoded = decode_entry(&encoded).unwrap();
        assert_eq!(decoded.estate_id, 184_713_191);
        assert_eq!(decoded.description, description);
        assert_eq!(decoded.content_address, "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG");
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let a = encode_entry(42, "1 MAIN ST, Bedford, 03110", "QmA").unwrap();
        let b = encode_entry(42, "1 MAIN ST, Bedford, 03110", "QmA").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_rejects_truncated_entry() {
        let encoded = encode_entry(1, "abc", "def").unwrap();
        let err = decode_entry(&encoded[..encoded.len() - WORD]).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { .. }));
    }

    #[test]
    fn test_decode_rejects_wide_identifier() {
        let mut encoded = encode_entry(1, "a", "b").unwrap();
        encoded[27] = 1;
        assert_eq!(
            decode_entry(&encoded).unwrap_err(),
            DecodeError::InvalidUint32 { offset: 0 }
        );
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let mut encoded = encode_entry(1, "a", "b").unwrap();
        encoded[4 * WORD] = 0xff;
        assert_eq!(
            decode_entry(&encoded).unwrap_err(),
            DecodeError::InvalidUtf8 { offset: 3 * WORD }
        );
    }

    #[test]
    fn test_decode_rejects_huge_array_length() {
        let data = words(&["20", "ffffffff"]);
        assert!(matches!(
            decode_aggregate(&data).unwrap_err(),
            DecodeError::Truncated { .. }
        ));
    }

    #[test]
    fn test_hex_helpers() {
        let bytes = vec![0x00, 0xab, 0x10];
        assert_eq!(to_hex(&bytes), "0x00ab10");
        assert_eq!(from_hex("0x00ab10\n").unwrap(), bytes);
        assert_eq!(from_hex("00ab10").unwrap(), bytes);
        assert!(matches!(from_hex("0xzz"), Err(DecodeError::Hex(_))));
    }
}
