//! Built-in recipes.

pub mod libzip;

use anyhow::{bail, Result};

use crate::core::recipe::Recipe;
use crate::sources::metadata::SourceData;

/// Names of the recipes quay ships with.
pub const BUILTIN: &[&str] = &["libzip"];

/// Look up a built-in recipe and its embedded source data by name.
pub fn builtin(name: &str) -> Result<(Recipe, SourceData)> {
    match name {
        "libzip" => Ok((libzip::recipe(), libzip::source_data()?)),
        other => bail!(
            "no built-in recipe named `{}` (available: {})",
            other,
            BUILTIN.join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let (recipe, data) = builtin("libzip").unwrap();
        assert_eq!(recipe.name(), "libzip");
        assert!(data.entry(recipe.version()).is_some());

        let err = builtin("zlib").unwrap_err();
        assert!(err.to_string().contains("available: libzip"));
    }
}
