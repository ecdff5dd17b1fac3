//! Option resolution and dependency planning.
//!
//! Resolution is pure: it never touches the filesystem or the network. The
//! [`ResolvedConfig`] it produces is read-only for every later phase.

pub mod requirements;

pub use requirements::plan_requirements;

use serde::Serialize;

use crate::core::option::{OptionError, OptionSet};
use crate::core::recipe::Recipe;
use crate::core::settings::Settings;

/// Options and settings after platform pruning and defaulting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    pub options: OptionSet,
    pub settings: Settings,
}

/// Prune options that do not apply to the platform and clear the compiler
/// sub-dimensions the packaged artifact does not depend on.
///
/// An option whose applicability cannot be evaluated (the OS is not set) is
/// treated as not applicable. This function never fails, and applying it to
/// its own output changes nothing.
pub fn resolve_options(mut options: OptionSet, mut settings: Settings) -> ResolvedConfig {
    let inapplicable: Vec<String> = options
        .declarations()
        .filter(|decl| decl.applies.evaluate(&settings) != Some(true))
        .map(|decl| decl.name.clone())
        .collect();

    for name in inapplicable {
        tracing::debug!("option `{}` does not apply to this platform", name);
        options.prune(&name);
    }

    // A C library has no C++ standard library or language level in its ABI
    settings.compiler.libcxx = None;
    settings.compiler.cppstd = None;

    ResolvedConfig { options, settings }
}

/// Seed options from the recipe, resolve them for the platform, then apply
/// caller overrides.
///
/// Overrides naming an option the recipe never declared are an error.
/// Overrides naming an option pruned for this platform are ignored with a
/// warning.
pub fn configure(
    recipe: &Recipe,
    overrides: &[(String, String)],
    settings: Settings,
) -> Result<ResolvedConfig, OptionError> {
    let seeded = OptionSet::from_declarations(&recipe.options)?;
    let mut config = resolve_options(seeded, settings);

    for (name, raw) in overrides {
        if config.options.is_pruned(name) {
            tracing::warn!(
                "ignoring option `{}={}`: it does not apply to this platform",
                name,
                raw
            );
            continue;
        }
        config.options.set_raw(name, raw)?;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::option::{OptionDecl, FPIC, SHARED};
    use crate::core::settings::Os;

    fn seeded() -> OptionSet {
        OptionSet::from_declarations(&[
            OptionDecl::boolean(SHARED, false),
            OptionDecl::boolean(FPIC, true).except_on(Os::Windows),
            OptionDecl::boolean("native_crypto", true).only_on(Os::Windows),
        ])
        .unwrap()
    }

    fn settings(os: Option<&str>) -> Settings {
        let mut settings = Settings::default();
        if let Some(os) = os {
            settings.set("os", os).unwrap();
        }
        settings.set("compiler", "gcc").unwrap();
        settings.set("compiler.libcxx", "libstdc++11").unwrap();
        settings.set("compiler.cppstd", "17").unwrap();
        settings
    }

    #[test]
    fn test_prunes_by_os() {
        let linux = resolve_options(seeded(), settings(Some("Linux")));
        assert!(linux.options.contains(FPIC));
        assert!(!linux.options.contains("native_crypto"));

        let windows = resolve_options(seeded(), settings(Some("Windows")));
        assert!(!windows.options.contains(FPIC));
        assert!(windows.options.contains("native_crypto"));
    }

    #[test]
    fn test_unknown_os_is_accepted() {
        let haiku = resolve_options(seeded(), settings(Some("Haiku")));
        assert!(haiku.options.contains(FPIC));
        assert!(!haiku.options.contains("native_crypto"));
    }

    #[test]
    fn test_unset_os_drops_os_dependent_options() {
        let resolved = resolve_options(seeded(), settings(None));
        assert!(resolved.options.contains(SHARED));
        assert!(!resolved.options.contains(FPIC));
        assert!(!resolved.options.contains("native_crypto"));
    }

    #[test]
    fn test_clears_compiler_subsettings() {
        let resolved = resolve_options(seeded(), settings(Some("Linux")));
        assert_eq!(resolved.settings.compiler.name.as_deref(), Some("gcc"));
        assert!(resolved.settings.compiler.libcxx.is_none());
        assert!(resolved.settings.compiler.cppstd.is_none());
    }

    #[test]
    fn test_resolution_is_a_fixed_point() {
        for os in [Some("Linux"), Some("Windows"), Some("Macos"), None] {
            let once = resolve_options(seeded(), settings(os));
            let twice = resolve_options(once.options.clone(), once.settings.clone());
            assert_eq!(once, twice);
        }
    }
}
