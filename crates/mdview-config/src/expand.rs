//! Environment variable expansion for configuration strings.
//!
//! Supports:
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

use crate::ConfigError;

/// Expand `${...}` references in a configuration value.
///
/// Values without `${` are returned unchanged, so bare `$` characters in
/// URLs survive.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, UnsetVar> {
        std::env::var(var)
            .map(Some)
            .map_err(|_| UnsetVar(var.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Name of a variable that was referenced without a default but is unset.
struct UnsetVar(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_set_var() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("MDVIEW_TEST_KROKI_HOST", "kroki.internal");
        }
        let result = expand_env("https://${MDVIEW_TEST_KROKI_HOST}:8000", "diagrams.kroki_url");
        assert_eq!(result.unwrap(), "https://kroki.internal:8000");
        unsafe {
            std::env::remove_var("MDVIEW_TEST_KROKI_HOST");
        }
    }

    #[test]
    fn test_expand_default_when_unset() {
        let result = expand_env("${MDVIEW_TEST_NEVER_SET:-https://kroki.io}", "diagrams.kroki_url");
        assert_eq!(result.unwrap(), "https://kroki.io");
    }

    #[test]
    fn test_expand_missing_var_errors() {
        let err = expand_env("${MDVIEW_TEST_MISSING}", "cache.dir").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        let message = err.to_string();
        assert!(message.contains("MDVIEW_TEST_MISSING"));
        assert!(message.contains("cache.dir"));
    }

    #[test]
    fn test_bare_dollar_untouched() {
        assert_eq!(
            expand_env("https://example.com/$path", "diagrams.kroki_url").unwrap(),
            "https://example.com/$path"
        );
    }
}
