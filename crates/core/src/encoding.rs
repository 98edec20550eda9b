//! Text encodings for values passed through helper command lines.

/// Uppercase hex of the UTF-8 bytes of `input`.
///
/// Credentials are handed to the helper as hex so that quoting and shell
/// metacharacters never alter them.
pub fn hex_encode(input: &str) -> String {
    input.bytes().map(|b| format!("{b:02X}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_encode_ascii() {
        assert_eq!(hex_encode("Hi!"), "486921");
    }

    #[test]
    fn test_hex_encode_empty() {
        assert_eq!(hex_encode(""), "");
    }

    #[test]
    fn test_hex_encode_multibyte() {
        assert_eq!(hex_encode("é{"), "C3A97B");
    }
}
