use thiserror::Error;

/// The error type that describes failures to decode Base64 encoded strings.
#[derive(Error, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// An invalid byte was found in the input. The offset and offending byte are provided.
    #[error("invalid byte {1} at offset {0}")]
    InvalidByte(usize, u8),
}

/// Decodes a URL-safe Base64 string without padding into bytes.
///
/// TC strings are bit streams encoded 6 bits per character, so the number of bits
/// is rarely a multiple of 8. Bits of the last incomplete byte are set to zero.
pub fn decode_base64_url(s: &str) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::with_capacity(s.len() * 6 / 8 + 1);
    let mut acc: u32 = 0;
    let mut acc_bits = 0;

    for (offset, b) in s.bytes().enumerate() {
        let val = base64_value(b).ok_or(DecodeError::InvalidByte(offset, b))?;
        acc = (acc << 6) | u32::from(val);
        acc_bits += 6;

        if acc_bits >= 8 {
            acc_bits -= 8;
            out.push((acc >> acc_bits) as u8);
            acc &= (1 << acc_bits) - 1;
        }
    }

    if acc_bits > 0 {
        out.push((acc << (8 - acc_bits)) as u8);
    }

    Ok(out)
}

fn base64_value(b: u8) -> Option<u8> {
    match b {
        b'A'..=b'Z' => Some(b - b'A'),
        b'a'..=b'z' => Some(b - b'a' + 26),
        b'0'..=b'9' => Some(b - b'0' + 52),
        b'-' => Some(62),
        b'_' => Some(63),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(b'A' => Some(0))]
    #[test_case(b'Z' => Some(25))]
    #[test_case(b'a' => Some(26))]
    #[test_case(b'z' => Some(51))]
    #[test_case(b'0' => Some(52))]
    #[test_case(b'9' => Some(61))]
    #[test_case(b'-' => Some(62) ; "dash")]
    #[test_case(b'_' => Some(63) ; "underscore")]
    #[test_case(b'+' => None ; "plus")]
    #[test_case(b'/' => None ; "slash")]
    #[test_case(b'=' => None ; "equal")]
    fn base64_value_map(b: u8) -> Option<u8> {
        base64_value(b)
    }

    #[test_case("DBABM" => vec![12, 16, 1, 48] ; "simple header")]
    #[test_case("AAAA" => vec![0, 0, 0] ; "aligned")]
    #[test_case("___" => vec![255, 255, 192] ; "partial byte is zero padded")]
    #[test_case("B" => vec![4] ; "single character")]
    #[test_case("" => Vec::<u8>::new() ; "empty string")]
    fn decode(s: &str) -> Vec<u8> {
        decode_base64_url(s).unwrap()
    }

    #[test_case("===" => DecodeError::InvalidByte(0, b'=') ; "equal signs")]
    #[test_case("a  " => DecodeError::InvalidByte(1, b' ') ; "whitespaces")]
    #[test_case("CP+x" => DecodeError::InvalidByte(2, b'+') ; "standard alphabet")]
    fn decode_error(s: &str) -> DecodeError {
        decode_base64_url(s).unwrap_err()
    }
}
