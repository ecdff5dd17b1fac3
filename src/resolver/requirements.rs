//! Dependency planning.

use crate::core::requirement::Requirement;
use crate::core::rules::RequirementRule;
use crate::resolver::ResolvedConfig;

/// Select the requirements whose conditions hold, in declaration order.
///
/// Unconditional rules are the baseline and are always selected. Names in a
/// validated recipe are unique, so the result needs no deduplication.
pub fn plan_requirements(rules: &[RequirementRule], config: &ResolvedConfig) -> Vec<Requirement> {
    rules
        .iter()
        .filter(|rule| rule.when.holds(config))
        .map(|rule| rule.requirement.clone())
        .collect()
}
