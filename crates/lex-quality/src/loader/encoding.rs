//! Character encoding detection and decoding.

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use tracing::{debug, warn};

/// Encoding used when neither a BOM nor valid UTF-8 identifies the input.
///
/// windows-1252 is the WHATWG mapping of latin1 and decodes every byte.
pub fn fallback_encoding() -> &'static Encoding {
    WINDOWS_1252
}

/// Text decoded from raw input bytes.
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
    /// True when the fallback encoding had to be used.
    pub used_fallback: bool,
}

/// Decode raw bytes into text.
///
/// A byte order mark wins; otherwise strict UTF-8 is attempted, then the
/// fallback encoding.
pub fn decode_bytes(bytes: &[u8]) -> DecodedText {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        if !had_errors {
            debug!("Decoded input as {} (byte order mark)", encoding.name());
            return DecodedText {
                text: text.into_owned(),
                encoding,
                used_fallback: false,
            };
        }
        warn!(
            "Input has a {} byte order mark but does not decode cleanly",
            encoding.name()
        );
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => DecodedText {
            text: text.to_string(),
            encoding: UTF_8,
            used_fallback: false,
        },
        Err(e) => {
            warn!(
                "Input is not valid UTF-8 ({}); decoding as {}",
                e,
                fallback_encoding().name()
            );
            let (text, _) = fallback_encoding().decode_without_bom_handling(bytes);
            DecodedText {
                text: text.into_owned(),
                encoding: fallback_encoding(),
                used_fallback: true,
            }
        }
    }
}
