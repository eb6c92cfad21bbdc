//! RFC 2047 encoded-word generation: choosing between the `Q` and `B`
//! encodings when producing a header value that cannot be represented
//! as plain ASCII.

use crate::rfc5322_parser::qp_encode;

/// Number of bytes of `s` that would need `=XX` quoting if encoded with
/// the `Q` encoding (the same classification `qp_encode` uses to decide
/// what to pass through verbatim).
fn quoted_byte_count(s: &str) -> usize {
    s.bytes()
        .filter(|&c| {
            let passthru = (c.is_ascii_alphanumeric() || c.is_ascii_punctuation())
                && c != b'?'
                && c != b'='
                && c != b' '
                && c != b'\t';
            !(passthru || c == b' ')
        })
        .count()
}

/// Picks `B` over `Q` when more than a third of the bytes of `s` would
/// need quoting under `Q`; otherwise prefers `Q`, which stays closer to
/// readable ASCII for mostly-plain text.
pub fn encode_word(s: &str) -> String {
    let total = s.len();
    if total > 0 && quoted_byte_count(s) * 3 > total {
        b_encode(s)
    } else {
        qp_encode(s)
    }
}

fn push_b_chunk(result: &mut String, first: &mut bool, prefix: &str, suffix: &str, chunk: &str) {
    if !*first {
        result.push_str("\r\n\t");
    }
    *first = false;
    result.push_str(prefix);
    result.push_str(&data_encoding::BASE64.encode(chunk.as_bytes()));
    result.push_str(suffix);
}

fn b_encode(s: &str) -> String {
    let prefix = "=?UTF-8?B?";
    let suffix = "?=";

    if s.is_empty() {
        // Empty input still produces a well-formed, empty encoded-word.
        return format!("{prefix}{suffix}");
    }

    // Leave room for prefix/suffix and keep chunks a multiple of 4 base64
    // characters so each encoded-word decodes independently.
    let limit = ((74usize.saturating_sub(prefix.len() + suffix.len())) / 4) * 4;
    let limit = limit.max(4);
    // Each base64 char encodes 6 bits; 3 input bytes -> 4 output chars.
    let max_input = (limit / 4) * 3;

    let mut result = String::new();
    let mut first = true;
    let mut chunk_start = 0;
    let mut chunk_len = 0;

    // Accumulate whole chars so a chunk boundary never lands mid-character
    // -- each encoded-word is decoded independently downstream, so a split
    // multi-byte char would otherwise corrupt silently.
    for (i, ch) in s.char_indices() {
        let char_len = ch.len_utf8();
        if chunk_len > 0 && chunk_len + char_len > max_input {
            push_b_chunk(&mut result, &mut first, prefix, suffix, &s[chunk_start..i]);
            chunk_start = i;
            chunk_len = 0;
        }
        chunk_len += char_len;
    }
    push_b_chunk(&mut result, &mut first, prefix, suffix, &s[chunk_start..]);

    result
}
