//! Translation of VIX result codes into text.

use super::backend::{VixBackend, VixCode};

/// Text used when the library has no description for a code.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Returns the library's description of `code`.
///
/// Falls back to [`UNKNOWN_ERROR`] when the lookup yields nothing.
#[must_use]
pub fn translate(backend: &dyn VixBackend, code: VixCode) -> String {
    match backend.error_text(code) {
        Some(text) if !text.trim().is_empty() => text,
        _ => UNKNOWN_ERROR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vix::stub::StubVix;

    #[test]
    fn translate_uses_library_text() {
        let backend = StubVix::new();
        let text = translate(&backend, VixCode::CANNOT_CONNECT_TO_HOST);
        assert_eq!(text, "Cannot connect to host");
    }

    #[test]
    fn translate_falls_back_for_unknown_code() {
        let backend = StubVix::new();
        assert_eq!(translate(&backend, VixCode(65_000)), UNKNOWN_ERROR);
    }
}
