//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted display name, in characters.
const MAX_DISPLAY_NAME_CHARS: usize = 64;
/// Longest accepted raw symbol, in characters (emoji may span several code points).
const MAX_SYMBOL_CHARS: usize = 16;

/// Validates that a display name is non-blank and at most 64 characters.
///
/// # Examples
///
/// ```ignore
/// validate_display_name("Anna")  // Ok
/// validate_display_name("   ")   // Err - blank
/// ```
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("display_name_blank");
        err.message = Some("Display name must not be blank".into());
        return Err(err);
    }

    let chars = name.chars().count();
    if chars > MAX_DISPLAY_NAME_CHARS {
        let mut err = ValidationError::new("display_name_length");
        err.message = Some(
            format!("Display name must be at most {MAX_DISPLAY_NAME_CHARS} characters (got {chars})")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates that a submitted symbol is present and reasonably short.
pub fn validate_symbol(symbol: &str) -> Result<(), ValidationError> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_SYMBOL_CHARS {
        let mut err = ValidationError::new("symbol_format");
        err.message = Some("Symbol must be a single alphabet entry".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_display_name_valid() {
        assert!(validate_display_name("Anna").is_ok());
        assert!(validate_display_name("Kovács Bence").is_ok());
        assert!(validate_display_name(&"x".repeat(64)).is_ok());
    }

    #[test]
    fn test_validate_display_name_invalid() {
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("  \t").is_err());
        assert!(validate_display_name(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_symbol() {
        assert!(validate_symbol("🔴").is_ok());
        assert!(validate_symbol(" ⚪ ").is_ok());
        assert!(validate_symbol("").is_err());
        assert!(validate_symbol(&"a".repeat(17)).is_err());
    }
}
