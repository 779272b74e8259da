// ─── Rule Evaluator ───
// Generic allow/deny predicate matcher shared by library selection and
// conditional launch arguments.

use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OsConstraint {
    #[serde(default)]
    pub name: Option<String>,
    /// Matched against the context arch token as a regular expression.
    #[serde(default)]
    pub arch: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformRule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsConstraint>,
    /// Feature-flag constraints: every named flag must equal the context
    /// value for the rule to match.
    #[serde(default)]
    pub features: Option<HashMap<String, bool>>,
}

/// Evaluation context: the current platform plus the feature-flag map.
/// Recognized flags all default to false; rules naming unknown flags match
/// against false as well.
#[derive(Debug, Clone)]
pub struct RuleContext {
    pub os_name: String,
    pub arch: String,
    pub features: HashMap<String, bool>,
}

impl RuleContext {
    /// Context for the running platform with every feature flag off.
    pub fn current() -> Self {
        Self {
            os_name: current_os_name().to_string(),
            arch: current_arch_token().to_string(),
            features: HashMap::new(),
        }
    }

    pub fn with_feature(mut self, name: &str, value: bool) -> Self {
        self.features.insert(name.to_string(), value);
        self
    }

    fn feature(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }
}

/// Fold an ordered rule list into an allow/deny decision.
///
/// An empty list is always allowed. Otherwise the decision starts at
/// "denied" and every rule whose constraints all match overwrites it with
/// that rule's action — later matches win, and non-matching rules are
/// skipped rather than treated as an implicit deny.
pub fn evaluate(rules: &[PlatformRule], ctx: &RuleContext) -> bool {
    if rules.is_empty() {
        return true;
    }

    let mut allowed = false;
    for rule in rules {
        if rule_matches(rule, ctx) {
            allowed = rule.action == RuleAction::Allow;
        }
    }
    allowed
}

fn rule_matches(rule: &PlatformRule, ctx: &RuleContext) -> bool {
    if let Some(os) = &rule.os {
        if let Some(name) = &os.name {
            if name != &ctx.os_name {
                return false;
            }
        }
        if let Some(pattern) = &os.arch {
            let matched = regex::Regex::new(pattern)
                .map(|re| re.is_match(&ctx.arch))
                .unwrap_or(false);
            if !matched {
                return false;
            }
        }
    }

    if let Some(features) = &rule.features {
        for (name, required) in features {
            if ctx.feature(name) != *required {
                return false;
            }
        }
    }

    true
}

/// Platform OS name as used in version metadata.
pub fn current_os_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "osx"
    } else {
        "linux"
    }
}

/// CPU architecture token matched by arch rule patterns.
pub fn current_arch_token() -> &'static str {
    if cfg!(target_arch = "x86") {
        "x86"
    } else if cfg!(target_arch = "x86_64") {
        "x86_64"
    } else if cfg!(target_arch = "aarch64") {
        "arm64"
    } else {
        std::env::consts::ARCH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(os: &str) -> RuleContext {
        RuleContext {
            os_name: os.into(),
            arch: "x86_64".into(),
            features: HashMap::new(),
        }
    }

    fn os_rule(action: RuleAction, os: &str) -> PlatformRule {
        PlatformRule {
            action,
            os: Some(OsConstraint {
                name: Some(os.into()),
                arch: None,
            }),
            features: None,
        }
    }

    #[test]
    fn empty_rule_list_is_allowed() {
        assert!(evaluate(&[], &ctx("linux")));
    }

    #[test]
    fn no_matching_rule_is_denied() {
        let rules = vec![os_rule(RuleAction::Allow, "osx")];
        assert!(!evaluate(&rules, &ctx("linux")));
    }

    #[test]
    fn last_matching_rule_wins() {
        let rules = vec![
            os_rule(RuleAction::Disallow, "linux"),
            os_rule(RuleAction::Allow, "linux"),
        ];
        assert!(evaluate(&rules, &ctx("linux")));

        // With neither rule matching, the default denies.
        assert!(!evaluate(&rules, &ctx("windows")));
    }

    #[test]
    fn unconstrained_allow_then_os_disallow() {
        let rules = vec![
            PlatformRule {
                action: RuleAction::Allow,
                os: None,
                features: None,
            },
            os_rule(RuleAction::Disallow, "linux"),
        ];
        assert!(!evaluate(&rules, &ctx("linux")));
        assert!(evaluate(&rules, &ctx("windows")));
    }

    #[test]
    fn arch_constraint_is_a_regex() {
        let rules = vec![PlatformRule {
            action: RuleAction::Allow,
            os: Some(OsConstraint {
                name: None,
                arch: Some("^x86".into()),
            }),
            features: None,
        }];
        assert!(evaluate(&rules, &ctx("linux")));

        let mut arm = ctx("linux");
        arm.arch = "arm64".into();
        assert!(!evaluate(&rules, &arm));
    }

    #[test]
    fn feature_constraints_compare_against_defaults() {
        let mut features = HashMap::new();
        features.insert("is_demo_user".to_string(), true);
        let rules = vec![PlatformRule {
            action: RuleAction::Allow,
            os: None,
            features: Some(features),
        }];

        // All flags default to false, so the rule does not match.
        assert!(!evaluate(&rules, &RuleContext::current()));
        assert!(evaluate(
            &rules,
            &RuleContext::current().with_feature("is_demo_user", true)
        ));
    }
}
