// ── Server key codec ──
//
// VAPID public keys travel as unpadded base64url. `pushManager.subscribe`
// wants the raw bytes. Decoding mirrors what the browser's `atob` accepts:
// padding is restored here and non-canonical trailing bits are tolerated.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use thiserror::Error;

const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

/// The encoded server key is not valid base64url.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed server public key: {0}")]
pub struct KeyDecodeError(#[from] base64::DecodeError);

/// Decode a base64url server key (padding optional) into raw bytes.
pub fn decode_server_key(encoded: &str) -> Result<Vec<u8>, KeyDecodeError> {
    let encoded = encoded.trim();
    let padding = (4 - encoded.len() % 4) % 4;

    let mut standard = String::with_capacity(encoded.len() + padding);
    standard.extend(encoded.chars().map(|c| match c {
        '-' => '+',
        '_' => '/',
        other => other,
    }));
    standard.extend(std::iter::repeat_n('=', padding));

    Ok(FORGIVING.decode(standard)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_without_padding_needed() {
        assert_eq!(decode_server_key("YWJj").unwrap(), b"abc");
    }

    #[test]
    fn restores_missing_padding() {
        assert_eq!(decode_server_key("YWJ").unwrap(), b"ab");
        assert_eq!(decode_server_key("YQ").unwrap(), b"a");
    }

    #[test]
    fn accepts_already_padded_input() {
        assert_eq!(decode_server_key("YWI=").unwrap(), b"ab");
    }

    #[test]
    fn translates_url_safe_alphabet() {
        assert_eq!(decode_server_key("-_8").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn decodes_vapid_public_key_to_uncompressed_point() {
        let key = "BEl62iUYgUivxIkv69yViEuiBIa-Ib9-SkvMeAtA3LFgDzkrxZJjSgSnfckjBJuBkr3qBUYIHBQFLXYp5Nksh8U";
        let raw = decode_server_key(key).unwrap();
        assert_eq!(raw.len(), 65);
        assert_eq!(raw[0], 0x04);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(decode_server_key("a").is_err());
        assert!(decode_server_key("ab!c").is_err());
    }
}
