//! The configure step and the dry-run plan built from it.

use serde::Serialize;

use crate::builder::definitions::{emit_definitions, Definitions};
use crate::core::option::OptionSet;
use crate::core::recipe::Recipe;
use crate::core::requirement::Requirement;
use crate::core::settings::Settings;
use crate::deps::DependencyResolver;
use crate::ops::errors::{LifecycleError, RecipeError, Stage};
use crate::ops::layout::config_fingerprint;
use crate::ops::publish::system_libs;
use crate::patch::rewrite::Replacement;
use crate::resolver::{configure, plan_requirements, ResolvedConfig};
use crate::sources::metadata::{SourceData, VersionEntry};

/// Output of the configure step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configured<'s> {
    pub config: ResolvedConfig,
    pub definitions: Definitions,
    /// Source metadata of the selected version
    pub entry: VersionEntry<'s>,
}

/// Resolve options, emit the build configuration, and select the source
/// metadata for `version`.
///
/// Touches neither the filesystem nor the network, so it can be repeated to
/// check that the configuration did not change between phases.
pub fn configure_recipe<'s>(
    recipe: &Recipe,
    source_data: &'s SourceData,
    version: &str,
    overrides: &[(String, String)],
    settings: &Settings,
) -> Result<Configured<'s>, RecipeError> {
    let config = configure(recipe, overrides, settings.clone())?;
    let definitions = emit_definitions(&recipe.definitions, &config);

    let entry = source_data
        .entry(version)
        .ok_or_else(|| RecipeError::UnsupportedVersion {
            version: version.to_string(),
            available: source_data.versions().iter().map(|v| v.to_string()).collect(),
        })?;

    Ok(Configured {
        config,
        definitions,
        entry,
    })
}

/// A rewrite that will be applied, with its replacement resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedRewrite {
    pub file: String,
    pub find: String,
    pub replace: String,
}

/// Everything an invocation would do, computed without side effects.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub name: String,
    pub version: String,
    pub fingerprint: String,
    pub options: OptionSet,
    pub settings: Settings,
    pub requires: Vec<Requirement>,
    pub definitions: Definitions,
    pub source_url: String,
    pub patches: Vec<String>,
    pub rewrites: Vec<PlannedRewrite>,
    pub system_libs: Vec<String>,
}

/// Build the plan for one invocation.
pub fn plan(
    recipe: &Recipe,
    source_data: &SourceData,
    version: &str,
    overrides: &[(String, String)],
    settings: &Settings,
    resolver: &dyn DependencyResolver,
) -> Result<Plan, LifecycleError> {
    let Configured {
        config,
        definitions,
        entry,
    } = configure_recipe(recipe, source_data, version, overrides, settings)
        .map_err(|kind| LifecycleError::new(Stage::Configure, kind))?;

    let rewrites = recipe
        .rewrites
        .iter()
        .filter(|rule| rule.when.holds(&config))
        .map(|rule| PlannedRewrite {
            file: rule.file.display().to_string(),
            find: rule.edit.find.clone(),
            replace: match &rule.edit.replace {
                Replacement::Literal(text) => text.clone(),
                Replacement::LibsVariable(package) => resolver.libs_variable(package),
            },
        })
        .collect();

    Ok(Plan {
        name: recipe.name().to_string(),
        version: version.to_string(),
        fingerprint: config_fingerprint(&config),
        requires: plan_requirements(&recipe.requirements, &config),
        system_libs: system_libs(&recipe.system_libs, &config),
        options: config.options,
        settings: config.settings,
        definitions,
        source_url: entry.source.url.clone(),
        patches: entry.patches.iter().map(|p| p.patch_file.clone()).collect(),
        rewrites,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::PrefixResolver;
    use crate::recipes::libzip;

    fn settings(os: &str) -> Settings {
        let mut settings = Settings::default();
        settings.set("os", os).unwrap();
        settings.set("build_type", "Release").unwrap();
        settings
    }

    fn overrides(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_configure_is_repeatable() {
        let recipe = libzip::recipe();
        let data = libzip::source_data().unwrap();
        let ov = overrides(&[("with_bzip2", "False")]);

        let first = configure_recipe(&recipe, &data, "1.5.2", &ov, &settings("Linux")).unwrap();
        let second = configure_recipe(&recipe, &data, "1.5.2", &ov, &settings("Linux")).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.entry.version, "1.5.2");
        assert_eq!(first.entry, data.entry("1.5.2").unwrap());
    }

    #[test]
    fn test_unsupported_version() {
        let recipe = libzip::recipe();
        let data = libzip::source_data().unwrap();

        let err = configure_recipe(&recipe, &data, "0.9", &[], &settings("Linux")).unwrap_err();
        match err {
            RecipeError::UnsupportedVersion { version, available } => {
                assert_eq!(version, "0.9");
                assert_eq!(available, vec!["1.5.2".to_string()]);
            }
            other => panic!("expected UnsupportedVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_linux_defaults() {
        let recipe = libzip::recipe();
        let data = libzip::source_data().unwrap();
        let resolver = PrefixResolver::new("/deps");

        let plan = plan(&recipe, &data, "1.5.2", &[], &settings("Linux"), &resolver).unwrap();

        let requires: Vec<String> = plan.requires.iter().map(|r| r.to_string()).collect();
        assert_eq!(requires, vec!["zlib/1.2.11", "bzip2/1.0.8", "openssl/1.0.2u"]);
        assert!(plan
            .rewrites
            .iter()
            .any(|r| r.find == "OPENSSL_LIBRARIES" && r.replace == "QUAY_LIBS_OPENSSL"));
        assert!(plan.system_libs.is_empty());
        assert_eq!(plan.fingerprint.len(), 16);
        assert_eq!(plan.source_url, data.entry("1.5.2").unwrap().source.url);
        assert!(plan.patches.is_empty());
    }

    #[test]
    fn test_plan_reports_configure_stage() {
        let recipe = libzip::recipe();
        let data = libzip::source_data().unwrap();
        let resolver = PrefixResolver::new("/deps");

        let err = plan(
            &recipe,
            &data,
            "1.5.2",
            &overrides(&[("with_lzma", "True")]),
            &settings("Linux"),
            &resolver,
        )
        .unwrap_err();
        assert_eq!(err.stage, Stage::Configure);
        assert!(matches!(err.kind, RecipeError::InvalidOption(_)));
    }
}
