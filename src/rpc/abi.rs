//! Minimal hex/ABI helpers: quantities, 32-byte words, call encoding.

use crate::domain::Address;
use thiserror::Error;

/// `balanceOf(address)`
pub const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
/// `pricePerShare()`
pub const PRICE_PER_SHARE_SELECTOR: [u8; 4] = [0x99, 0x53, 0x0b, 0x06];

pub const WORD_BYTES: usize = 32;

pub type Word = [u8; WORD_BYTES];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("invalid hex quantity {0:?}")]
    InvalidQuantity(String),
    #[error("invalid hex payload: {0}")]
    InvalidHex(String),
    #[error("payload length {0} is not a multiple of 32 bytes")]
    Misaligned(usize),
}

fn strip_0x(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Parse a hex quantity such as `"0x96"`.
pub fn parse_quantity(s: &str) -> Result<u64, AbiError> {
    let digits = strip_0x(s);
    if digits.is_empty() {
        return Err(AbiError::InvalidQuantity(s.to_string()));
    }
    u64::from_str_radix(digits, 16).map_err(|_| AbiError::InvalidQuantity(s.to_string()))
}

/// Encode a block number as a hex quantity.
pub fn to_quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

/// Split a hex payload into big-endian 32-byte words.
pub fn decode_words(data: &str) -> Result<Vec<Word>, AbiError> {
    let bytes = hex::decode(strip_0x(data)).map_err(|e| AbiError::InvalidHex(e.to_string()))?;
    if bytes.len() % WORD_BYTES != 0 {
        return Err(AbiError::Misaligned(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(WORD_BYTES)
        .map(|chunk| {
            let mut word = [0u8; WORD_BYTES];
            word.copy_from_slice(chunk);
            word
        })
        .collect())
}

/// Interpret a word as an unsigned integer; `None` if it exceeds 128 bits.
pub fn word_to_u128(word: &Word) -> Option<u128> {
    let (high, low) = word.split_at(16);
    if high.iter().any(|b| *b != 0) {
        return None;
    }
    let mut buf = [0u8; 16];
    buf.copy_from_slice(low);
    Some(u128::from_be_bytes(buf))
}

/// Calldata for `selector(address, ...)`.
pub fn encode_call(selector: [u8; 4], args: &[&Address]) -> String {
    let mut out = format!("0x{}", hex::encode(selector));
    for arg in args {
        out.push_str(&format!("{:0>64}", arg.hex_body()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x96").unwrap(), 150);
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("9d5b340").unwrap(), 165_000_000);
        assert!(parse_quantity("0x").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn test_to_quantity() {
        assert_eq!(to_quantity(200), "0xc8");
        assert_eq!(to_quantity(0), "0x0");
    }

    #[test]
    fn test_decode_words() {
        let data = format!("0x{}{}", "00".repeat(31) + "02", "00".repeat(31) + "01");
        let words = decode_words(&data).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(word_to_u128(&words[0]), Some(2));
        assert_eq!(word_to_u128(&words[1]), Some(1));
    }

    #[test]
    fn test_decode_words_rejects_malformed() {
        assert!(matches!(decode_words("0x123"), Err(AbiError::InvalidHex(_))));
        assert!(matches!(decode_words("0xzz"), Err(AbiError::InvalidHex(_))));
        assert_eq!(decode_words("0x0102"), Err(AbiError::Misaligned(2)));
        assert!(decode_words("0x").unwrap().is_empty());
    }

    #[test]
    fn test_word_to_u128_overflow() {
        let mut word = [0u8; 32];
        word[15] = 1;
        assert_eq!(word_to_u128(&word), None);
        word[15] = 0;
        word[16] = 0xff;
        assert_eq!(word_to_u128(&word), Some(0xff << 120));
    }

    #[test]
    fn test_encode_balance_of() {
        let wallet = Address::parse("0x6833df4E1edB361A04491349833c83A4868ABCdA").unwrap();
        let data = encode_call(BALANCE_OF_SELECTOR, &[&wallet]);
        assert_eq!(
            data,
            "0x70a082310000000000000000000000006833df4e1edb361a04491349833c83a4868abcda"
        );
        assert_eq!(encode_call(PRICE_PER_SHARE_SELECTOR, &[]), "0x99530b06");
    }
}
