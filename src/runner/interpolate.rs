//! Variable interpolation for step arguments and prompt defaults
//!
//! Strings may reference context variables with the `${var}` syntax.
//! Variables not present in the context fall back to environment variables.

use crate::error::{InterpolationError, InterpolationResult};
use regex::Regex;
use std::collections::HashMap;
use std::env;
use std::sync::OnceLock;

fn var_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").unwrap())
}

/// Interpolate `${var}` references in a string
///
/// Lookup order: context variables, then the process environment.
/// Unknown variables are left in place.
pub fn interpolate(s: &str, vars: &HashMap<String, String>) -> String {
    var_pattern()
        .replace_all(s, |caps: &regex::Captures| {
            let name = &caps[1];
            if let Some(value) = vars.get(name) {
                return value.clone();
            }
            if let Ok(value) = env::var(name) {
                return value;
            }
            format!("${{{}}}", name)
        })
        .to_string()
}

/// Interpolate with strict mode - errors on the first undefined variable
pub fn interpolate_strict(
    s: &str,
    vars: &HashMap<String, String>,
) -> InterpolationResult<String> {
    let result = interpolate(s, vars);

    if let Some(caps) = var_pattern().captures(&result) {
        return Err(InterpolationError::UndefinedVariable(caps[1].to_string()));
    }

    Ok(result)
}

/// Interpolate every string in a list
pub fn interpolate_list(list: &[String], vars: &HashMap<String, String>) -> Vec<String> {
    list.iter().map(|s| interpolate(s, vars)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_interpolation() {
        let mut vars = HashMap::new();
        vars.insert("db".to_string(), "db_test".to_string());

        assert_eq!(interpolate("--db=${db}", &vars), "--db=db_test");
    }

    #[test]
    fn test_multiple_variables() {
        let mut vars = HashMap::new();
        vars.insert("host".to_string(), "localhost".to_string());
        vars.insert("port".to_string(), "8042".to_string());

        assert_eq!(interpolate("${host}:${port}", &vars), "localhost:8042");
    }

    #[test]
    fn test_environment_fallback() {
        env::set_var("APPTASK_TEST_VAR", "from_env");

        let vars = HashMap::new();
        assert_eq!(interpolate("v=${APPTASK_TEST_VAR}", &vars), "v=from_env");

        env::remove_var("APPTASK_TEST_VAR");
    }

    #[test]
    fn test_context_wins_over_environment() {
        env::set_var("APPTASK_TEST_SHADOWED", "env");
        let mut vars = HashMap::new();
        vars.insert("APPTASK_TEST_SHADOWED".to_string(), "ctx".to_string());

        assert_eq!(interpolate("${APPTASK_TEST_SHADOWED}", &vars), "ctx");

        env::remove_var("APPTASK_TEST_SHADOWED");
    }

    #[test]
    fn test_undefined_variable_lenient() {
        let vars = HashMap::new();
        assert_eq!(interpolate("admin.${domain}", &vars), "admin.${domain}");
    }

    #[test]
    fn test_undefined_variable_strict() {
        let vars = HashMap::new();
        let result = interpolate_strict("admin.${domain}", &vars);
        assert!(matches!(
            result,
            Err(InterpolationError::UndefinedVariable(_))
        ));
    }

    #[test]
    fn test_no_interpolation() {
        let vars = HashMap::new();
        assert_eq!(interpolate("git describe", &vars), "git describe");
    }

    #[test]
    fn test_interpolate_list() {
        let mut vars = HashMap::new();
        vars.insert("suite".to_string(), "backend".to_string());

        let list = vec![
            "run".to_string(),
            "-c".to_string(),
            "tests/codeception/${suite}".to_string(),
        ];

        let result = interpolate_list(&list, &vars);
        assert_eq!(result[2], "tests/codeception/backend");
    }
}
