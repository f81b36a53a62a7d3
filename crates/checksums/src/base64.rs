//! The modified Base64 alphabet used for MD5 sums inside `.jigdo` files and
//! template headers.
//!
//! The alphabet differs from standard Base64 in two ways: `+` and `/` are
//! replaced with `-` and `_` so the encoded text is safe to embed in a URL or
//! an ini-style value without quoting, and output is never padded with `=`
//! since an MD5 sum's length (16 bytes) is known by both sides.

const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Encodes `data` using the modified Base64 alphabet, without padding.
#[must_use]
pub fn encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 4).div_ceil(3));
    for chunk in data.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied();
        let b2 = chunk.get(2).copied();

        out.push(ALPHABET[(b0 >> 2) as usize] as char);
        out.push(ALPHABET[(((b0 & 0x03) << 4) | (b1.unwrap_or(0) >> 4)) as usize] as char);
        if let Some(b1) = b1 {
            out.push(ALPHABET[(((b1 & 0x0f) << 2) | (b2.unwrap_or(0) >> 6)) as usize] as char);
        }
        if let Some(b2) = b2 {
            out.push(ALPHABET[(b2 & 0x3f) as usize] as char);
        }
    }
    out
}

fn decode_char(c: u8) -> Option<u8> {
    match c {
        b'A'..=b'Z' => Some(c - b'A'),
        b'a'..=b'z' => Some(c - b'a' + 26),
        b'0'..=b'9' => Some(c - b'0' + 52),
        b'-' => Some(62),
        b'_' => Some(63),
        _ => None,
    }
}

/// Decodes a string encoded with [`encode`].
///
/// Any byte that is not part of the modified Base64 alphabet (whitespace,
/// stray padding, a trailing comment) is silently skipped rather than
/// rejected, mirroring the tolerant parsing `.jigdo` files expect of hand
/// edited metadata.
#[must_use]
pub fn decode(text: &str) -> Vec<u8> {
    let mut bits = 0u32;
    let mut bit_count = 0u32;
    let mut out = Vec::with_capacity(text.len() * 3 / 4);

    for byte in text.bytes() {
        let Some(value) = decode_char(byte) else {
            continue;
        };
        bits = (bits << 6) | u32::from(value);
        bit_count += 6;
        if bit_count >= 8 {
            bit_count -= 8;
            out.push((bits >> bit_count) as u8);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_md5_length_input() {
        let data: [u8; 16] = [
            0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef, 0x10, 0x32, 0x54, 0x76, 0x98, 0xba,
            0xdc, 0xfe,
        ];
        let encoded = encode(&data);
        assert!(!encoded.contains('='));
        assert_eq!(decode(&encoded), data);
    }

    #[test]
    fn alphabet_uses_dash_and_underscore() {
        // Bytes chosen so the standard alphabet would emit '+' and '/'.
        let data = [0xfb, 0xff, 0xbf];
        let encoded = encode(&data);
        assert!(encoded.contains('-') || encoded.contains('_'));
    }

    #[test]
    fn decode_skips_invalid_characters() {
        let data = b"hello jigdo";
        let encoded = encode(data);
        let noisy = format!("{encoded}\n# trailing comment\r\n  ");
        assert_eq!(decode(&noisy), data);
    }

    #[test]
    fn empty_input_round_trips() {
        assert_eq!(encode(&[]), "");
        assert_eq!(decode(""), Vec::<u8>::new());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// `decode(encode(b)) == b` for every 16-byte input (an MD5 digest
        /// is always exactly this length on the wire).
        #[test]
        fn md5_length_input_round_trips(bytes in prop::collection::vec(any::<u8>(), 16..=16)) {
            prop_assert_eq!(decode(&encode(&bytes)), bytes);
        }

        /// Decoding never panics on arbitrary text, whitespace/invalid
        /// characters included.
        #[test]
        fn decode_never_panics_on_arbitrary_text(text in ".*") {
            let _ = decode(&text);
        }
    }
}
