use std::env;
use std::str::FromStr;

use crate::error::ConfigError;

/// Reads and parses an environment variable, falling back to `default` when unset.
/// A variable that is set but cannot be parsed is an error.
pub fn get_env_var_or<T: FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::Unparseable {
                    key: var.to_string(),
                    value: raw,
                })
        }
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_variable_uses_default() {
        let value: usize = get_env_var_or("ARGUS_TEST_DEFINITELY_UNSET", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_unparseable_variable_is_rejected() {
        env::set_var("ARGUS_TEST_BAD_NUMBER", "seven");
        let result: Result<usize, _> = get_env_var_or("ARGUS_TEST_BAD_NUMBER", 7);
        assert!(matches!(result, Err(ConfigError::Unparseable { .. })));
        env::remove_var("ARGUS_TEST_BAD_NUMBER");
    }
}
