//! Build step naming and selection
//!
//! Every schema configuration owns one code generation step whose name is
//! derived from the configuration name. The migration step is shared.

use crate::config::SchemaConfiguration;

/// Name of the shared migration step
pub const MIGRATE_STEP: &str = "migrate";

/// Configuration whose generation step gets the canonical name
pub const MAIN_CONFIGURATION: &str = "main";

const STEP_PREFIX: &str = "generate";
const STEP_SUFFIX: &str = "Code";

/// Generation step name for a configuration
///
/// `main` maps to `generateCode`, anything else to
/// `generate` + Capitalized(name) + `Code`.
pub fn step_name_for(configuration_name: &str) -> String {
    if configuration_name == MAIN_CONFIGURATION {
        return format!("{}{}", STEP_PREFIX, STEP_SUFFIX);
    }
    format!("{}{}{}", STEP_PREFIX, capitalize(configuration_name), STEP_SUFFIX)
}

/// Whether a step name has the shape of a generation step
pub fn is_generation_step(step_name: &str) -> bool {
    step_name.to_lowercase().starts_with(STEP_PREFIX) && step_name.ends_with(STEP_SUFFIX)
}

/// Strip a qualifying path such as `:app:db:` from a requested step
pub fn bare_step_name(requested: &str) -> &str {
    match requested.rfind(':') {
        Some(index) => &requested[index + 1..],
        None => requested,
    }
}

/// The configuration a step belongs to, if any
pub fn find_configuration_for_step<'a>(
    step_name: &str,
    configurations: &[&'a SchemaConfiguration],
) -> Option<&'a SchemaConfiguration> {
    configurations
        .iter()
        .copied()
        .find(|configuration| step_name_for(&configuration.name) == step_name)
}

/// Configurations whose generation step was requested
///
/// An empty request, or one that matches nothing, selects everything.
pub fn select_active_configurations<'a, S: AsRef<str>>(
    requested_steps: &[S],
    configurations: &[&'a SchemaConfiguration],
) -> Vec<&'a SchemaConfiguration> {
    let mut selected: Vec<&'a SchemaConfiguration> = Vec::new();

    for requested in requested_steps {
        let step = bare_step_name(requested.as_ref());
        if let Some(configuration) = find_configuration_for_step(step, configurations) {
            if !selected.iter().any(|existing| existing.name == configuration.name) {
                selected.push(configuration);
            }
        }
    }

    if selected.is_empty() {
        return configurations.to_vec();
    }
    selected
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("main", "generateCode")]
    #[case("reporting", "generateReportingCode")]
    #[case("billingV2", "generateBillingV2Code")]
    #[case("Other", "generateOtherCode")]
    fn test_step_name_for(#[case] configuration: &str, #[case] expected: &str) {
        assert_eq!(step_name_for(configuration), expected);
    }

    #[test]
    fn test_is_generation_step() {
        assert!(is_generation_step("generateCode"));
        assert!(is_generation_step("generateReportingCode"));
        assert!(!is_generation_step("migrate"));
        assert!(!is_generation_step("generateDocs"));
    }

    #[rstest]
    #[case("generateCode", "generateCode")]
    #[case(":generateCode", "generateCode")]
    #[case(":app:db:generateBillingCode", "generateBillingCode")]
    fn test_bare_step_name(#[case] requested: &str, #[case] expected: &str) {
        assert_eq!(bare_step_name(requested), expected);
    }

    #[test]
    fn test_find_configuration_for_step() {
        let main = SchemaConfiguration::new("main");
        let billing = SchemaConfiguration::new("billing");
        let all = [&main, &billing];

        assert_eq!(
            find_configuration_for_step("generateCode", &all).map(|c| c.name.as_str()),
            Some("main")
        );
        assert_eq!(
            find_configuration_for_step("generateBillingCode", &all).map(|c| c.name.as_str()),
            Some("billing")
        );
        assert!(find_configuration_for_step("generateOtherCode", &all).is_none());
    }

    #[test]
    fn test_select_active_configurations() {
        let a = SchemaConfiguration::new("a");
        let b = SchemaConfiguration::new("b");
        let all = [&a, &b];

        let names = |selected: Vec<&SchemaConfiguration>| -> Vec<String> {
            selected.iter().map(|c| c.name.clone()).collect()
        };

        assert_eq!(names(select_active_configurations(&[":generateACode"], &all)), vec!["a"]);
        assert_eq!(
            names(select_active_configurations(&["generateBCode", "build", "generateBCode"], &all)),
            vec!["b"]
        );
        assert_eq!(names(select_active_configurations::<&str>(&[], &all)), vec!["a", "b"]);
        assert_eq!(names(select_active_configurations(&["build", "test"], &all)), vec!["a", "b"]);
    }
}
