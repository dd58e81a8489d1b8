use crate::error::ApiError;

/// Longest color code accepted: the widest triple `(255,255,255),` per
/// character of the longest allowed text, plus slack for brackets and
/// whitespace.
fn max_color_code_len(max_text_length: usize) -> usize {
    max_text_length.saturating_mul(16).saturating_add(64)
}

/// Validate text submitted for encoding
pub fn validate_text(text: &str, max_text_length: usize) -> Result<(), ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::InvalidInput("Text cannot be empty".to_string()));
    }
    let chars = text.chars().count();
    if chars > max_text_length {
        return Err(ApiError::InvalidInput(format!(
            "Text too long ({} characters, max {})",
            chars, max_text_length
        )));
    }
    if text.chars().any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t')) {
        return Err(ApiError::InvalidInput(
            "Text contains control characters".to_string(),
        ));
    }
    Ok(())
}

/// Validate a color code before parsing. Structural problems are left to
/// the parser so the error names the offending triple.
pub fn validate_color_code(color_code: &str, max_text_length: usize) -> Result<(), ApiError> {
    if color_code.trim().is_empty() {
        return Err(ApiError::InvalidInput("Color code cannot be empty".to_string()));
    }
    let limit = max_color_code_len(max_text_length);
    if color_code.len() > limit {
        return Err(ApiError::InvalidInput(format!(
            "Color code too long (max {} bytes)",
            limit
        )));
    }
    if let Some(bad) = color_code
        .chars()
        .find(|c| !(c.is_ascii_digit() || c.is_whitespace() || "(),[]".contains(*c)))
    {
        return Err(ApiError::InvalidInput(format!(
            "Color code contains unexpected character {:?}",
            bad
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_text_valid() {
        assert!(validate_text("Hello", 256).is_ok());
        assert!(validate_text("multi\nline\ttext", 256).is_ok());
    }

    #[test]
    fn test_validate_text_empty() {
        for text in ["", "   \n"] {
            let result = validate_text(text, 256);
            assert!(matches!(result, Err(ApiError::InvalidInput(ref msg)) if msg.contains("empty")));
        }
    }

    #[test]
    fn test_validate_text_too_long() {
        let long_text = "a".repeat(300);
        let result = validate_text(&long_text, 256);
        assert!(matches!(result, Err(ApiError::InvalidInput(ref msg)) if msg.contains("too long")));
        // Counted in characters, not bytes.
        assert!(validate_text(&"é".repeat(256), 256).is_ok());
    }

    #[test]
    fn test_validate_text_control_characters() {
        assert!(validate_text("bell\u{7}", 256).is_err());
    }

    #[test]
    fn test_validate_color_code() {
        assert!(validate_color_code("(0,153,97),(255,124,101)", 256).is_ok());
        assert!(validate_color_code("[ (1, 2, 3) ]", 256).is_ok());
        assert!(validate_color_code("", 256).is_err());
        assert!(validate_color_code("(1,2,x)", 256).is_err());
        assert!(validate_color_code("(-1,2,3)", 256).is_err());

        let long = "(255,255,255),".repeat(10);
        assert!(validate_color_code(&long, 10).is_ok());
        assert!(validate_color_code(&long.repeat(10), 10).is_err());
    }
}
