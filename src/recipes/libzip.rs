//! Recipe for libzip, a C library for reading, creating, and modifying zip
//! archives.
//!
//! Upstream's CMake project builds its regression suite, examples, and man
//! pages unconditionally and insists on a `ZLIB_VERSION_STRING` that packaged
//! zlib does not provide. The rewrite table below switches those off and
//! points the openssl link line at the packaged library.

use std::path::Path;

use anyhow::Result;

use crate::core::option::{OptionDecl, FPIC, SHARED};
use crate::core::recipe::{Recipe, RecipeMetadata};
use crate::core::requirement::Requirement;
use crate::core::rules::{
    Condition, DefinitionRule, RequirementRule, RewriteRule, SystemLibRule,
};
use crate::core::settings::Os;
use crate::patch::rewrite::TextEdit;
use crate::sources::metadata::SourceData;

pub const WITH_BZIP2: &str = "with_bzip2";
pub const WITH_OPENSSL: &str = "with_openssl";
pub const ENABLE_WINDOWS_CRYPTO: &str = "enable_windows_crypto";

const CMAKE_LISTS: &str = "CMakeLists.txt";

/// Subdirectories of the upstream project that are not part of the library.
const EXCLUDED_TARGETS: [&str; 3] = ["regress", "examples", "man"];

const SOURCE_DATA: &str = include_str!("libzip/sourcedata.toml");

pub fn metadata() -> RecipeMetadata {
    RecipeMetadata {
        name: "libzip".to_string(),
        version: "1.5.2".to_string(),
        description: "A C library for reading, creating, and modifying zip archives".to_string(),
        license: "BSD-3-Clause".to_string(),
        homepage: "https://github.com/nih-at/libzip".to_string(),
        url: "https://github.com/bincrafters/conan-libzip".to_string(),
        topics: ["zip", "libzip", "zip-archives", "zip-editing"]
            .iter()
            .map(|t| t.to_string())
            .collect(),
    }
}

pub fn options() -> Vec<OptionDecl> {
    vec![
        OptionDecl::boolean(SHARED, false).help("Build a shared library"),
        OptionDecl::boolean(FPIC, true)
            .except_on(Os::Windows)
            .help("Compile position-independent code"),
        OptionDecl::boolean(WITH_BZIP2, true).help("Support bzip2-compressed entries"),
        OptionDecl::boolean(WITH_OPENSSL, true).help("Use OpenSSL for AES encryption"),
        OptionDecl::boolean(ENABLE_WINDOWS_CRYPTO, true)
            .only_on(Os::Windows)
            .help("Use Windows CNG for AES encryption"),
    ]
}

fn requirements() -> Vec<RequirementRule> {
    vec![
        RequirementRule::always(Requirement::pinned("zlib", "1.2.11")),
        RequirementRule::when(
            Requirement::pinned("bzip2", "1.0.8"),
            Condition::enabled(WITH_BZIP2),
        ),
        RequirementRule::when(
            Requirement::pinned("openssl", "1.0.2u"),
            Condition::enabled(WITH_OPENSSL),
        ),
    ]
}

fn definitions() -> Vec<DefinitionRule> {
    vec![
        DefinitionRule::from_option("ENABLE_OPENSSL", WITH_OPENSSL),
        // no gnutls package to build against
        DefinitionRule::fixed("ENABLE_GNUTLS", false),
        DefinitionRule::from_option("ENABLE_WINDOWS_CRYPTO", ENABLE_WINDOWS_CRYPTO)
            .only_when(Condition::os(Os::Windows)),
    ]
}

fn rewrites() -> Vec<RewriteRule> {
    let mut rules: Vec<RewriteRule> = EXCLUDED_TARGETS
        .iter()
        .map(|target| {
            RewriteRule::new(
                CMAKE_LISTS,
                TextEdit::remove(format!("ADD_SUBDIRECTORY({})", target)),
            )
        })
        .collect();

    rules.push(
        RewriteRule::new(
            CMAKE_LISTS,
            TextEdit::to_libs_variable("OPENSSL_LIBRARIES", "openssl"),
        )
        .only_when(Condition::enabled(WITH_OPENSSL)),
    );
    rules.push(RewriteRule::new(
        CMAKE_LISTS,
        TextEdit::replace("MESSAGE(FATAL_ERROR", "MESSAGE(STATUS"),
    ));

    rules
}

fn system_libs() -> Vec<SystemLibRule> {
    vec![SystemLibRule {
        name: "bcrypt".to_string(),
        when: Condition::os(Os::Windows).and(Condition::enabled(ENABLE_WINDOWS_CRYPTO)),
    }]
}

/// The libzip recipe.
pub fn recipe() -> Recipe {
    Recipe {
        metadata: metadata(),
        options: options(),
        requirements: requirements(),
        definitions: definitions(),
        rewrites: rewrites(),
        system_libs: system_libs(),
        license_pattern: "LICENSE".to_string(),
    }
}

/// Source metadata embedded in the binary.
pub fn source_data() -> Result<SourceData> {
    SourceData::parse(SOURCE_DATA, Path::new("."))
}
