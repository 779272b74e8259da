// ─── Version Descriptor ───
// Parses a runtime version JSON and evaluates platform rules for its
// libraries and argument templates.

use std::collections::HashMap;

use serde::Deserialize;

use crate::rules::{self, PlatformRule, RuleContext};

/// A fully parsed runtime version document. One instance per resolved
/// runtime (base, overlay); immutable once parsed.
///
/// Decoding is tolerant: absent or wrong-typed fields fall back to empty
/// defaults instead of failing the whole document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDescriptor {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub inherits_from: Option<String>,
    #[serde(default)]
    pub main_class: Option<String>,
    /// Declared base-jar id; when absent the base version's own jar is
    /// used on the classpath.
    #[serde(default)]
    pub jar: Option<String>,
    #[serde(default)]
    pub arguments: Arguments,
    /// Legacy flat argument string (whitespace-delimited), used when no
    /// structured game arguments are present.
    #[serde(default)]
    pub minecraft_arguments: Option<String>,
    #[serde(default)]
    pub asset_index: Option<AssetIndexRef>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    #[serde(default)]
    pub downloads: Option<VersionDownloads>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<ArgumentEntry>,
    #[serde(default)]
    pub jvm: Vec<ArgumentEntry>,
}

/// One argument template entry: a literal token, or a conditional group
/// guarded by its own rule list. Anything else decodes to `Other` and
/// yields no tokens.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ArgumentEntry {
    Plain(String),
    Conditional {
        #[serde(default)]
        rules: Vec<PlatformRule>,
        value: ArgumentValue,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    Single(String),
    Many(Vec<String>),
}

impl ArgumentEntry {
    /// Tokens this entry contributes under the given context.
    pub fn resolve(&self, ctx: &RuleContext) -> Vec<String> {
        match self {
            ArgumentEntry::Plain(s) => vec![s.clone()],
            ArgumentEntry::Conditional { rules, value } => {
                if !rules::evaluate(rules, ctx) {
                    return vec![];
                }
                match value {
                    ArgumentValue::Single(s) => vec![s.clone()],
                    ArgumentValue::Many(list) => list.clone(),
                }
            }
            ArgumentEntry::Other(_) => vec![],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VersionDownloads {
    #[serde(default)]
    pub client: Option<RemoteArtifact>,
}

/// Direct download descriptor: explicit URL plus optional relative path
/// and expected size.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteArtifact {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexRef {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub total_size: Option<u64>,
}

// ─── Library Entry with Rules ───

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryEntry {
    /// Artifact coordinate. Entries whose coordinate cannot be parsed
    /// are skipped during planning, never fatal.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rules: Option<Vec<PlatformRule>>,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    /// OS name → native classifier template; `${arch}` expands to the
    /// platform word size.
    #[serde(default)]
    pub natives: Option<HashMap<String, String>>,
    /// Entry-specific repository override for coordinate-only entries.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<RemoteArtifact>,
    #[serde(default)]
    pub classifiers: HashMap<String, RemoteArtifact>,
}

impl LibraryEntry {
    /// Evaluate whether this library applies to the given platform.
    /// No rule list means always allowed.
    pub fn is_allowed(&self, ctx: &RuleContext) -> bool {
        match &self.rules {
            Some(r) => rules::evaluate(r, ctx),
            None => true,
        }
    }

    /// Native classifier declared for the context OS, with the `${arch}`
    /// placeholder substituted.
    pub fn native_classifier(&self, ctx: &RuleContext) -> Option<String> {
        let template = self.natives.as_ref()?.get(&ctx.os_name)?;
        let arch = if cfg!(target_pointer_width = "64") {
            "64"
        } else {
            "32"
        };
        Some(template.replace("${arch}", arch))
    }
}

impl VersionDescriptor {
    /// Whether this descriptor layers on top of another one.
    pub fn inherits(&self) -> bool {
        self.inherits_from
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }

    /// Legacy flat arguments, whitespace-split. Empty when the descriptor
    /// uses the structured grammar.
    pub fn legacy_arguments(&self) -> Vec<ArgumentEntry> {
        match &self.minecraft_arguments {
            Some(s) => s
                .split_whitespace()
                .map(|tok| ArgumentEntry::Plain(tok.to_string()))
                .collect(),
            None => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleContext;

    #[test]
    fn minimal_document_parses_with_defaults() {
        let parsed: VersionDescriptor = serde_json::from_str(r#"{"id": "1.20.1"}"#).unwrap();
        assert_eq!(parsed.id, "1.20.1");
        assert!(parsed.main_class.is_none());
        assert!(parsed.libraries.is_empty());
        assert!(parsed.arguments.game.is_empty());
        assert!(!parsed.inherits());
    }

    #[test]
    fn blank_inherits_from_does_not_count() {
        let parsed: VersionDescriptor =
            serde_json::from_str(r#"{"id": "x", "inheritsFrom": "  "}"#).unwrap();
        assert!(!parsed.inherits());
    }

    #[test]
    fn no_rules_means_allowed() {
        let lib: LibraryEntry = serde_json::from_str(r#"{"name": "test:lib:1.0"}"#).unwrap();
        assert!(lib.is_allowed(&RuleContext::current()));
    }

    #[test]
    fn disallow_for_current_os_wins_last() {
        let json = format!(
            r#"{{
                "name": "test:lib:1.0",
                "rules": [
                    {{"action": "allow"}},
                    {{"action": "disallow", "os": {{"name": "{}"}}}}
                ]
            }}"#,
            crate::rules::current_os_name()
        );
        let lib: LibraryEntry = serde_json::from_str(&json).unwrap();
        assert!(!lib.is_allowed(&RuleContext::current()));
    }

    #[test]
    fn native_classifier_substitutes_arch() {
        let json = format!(
            r#"{{
                "name": "org.lwjgl:lwjgl:3.3.3",
                "natives": {{"{}": "natives-${{arch}}"}}
            }}"#,
            crate::rules::current_os_name()
        );
        let lib: LibraryEntry = serde_json::from_str(&json).unwrap();
        let classifier = lib.native_classifier(&RuleContext::current()).unwrap();
        assert!(classifier == "natives-64" || classifier == "natives-32");
    }

    #[test]
    fn conditional_arguments_respect_rules() {
        let parsed: VersionDescriptor = serde_json::from_value(serde_json::json!({
            "id": "test",
            "mainClass": "app.Main",
            "arguments": {
                "game": [
                    "--username",
                    "Player",
                    {
                        "rules": [{"action": "allow", "os": {"name": crate::rules::current_os_name()}}],
                        "value": ["--demo"]
                    },
                    {
                        "rules": [{"action": "allow", "features": {"has_custom_resolution": true}}],
                        "value": "--fullscreen"
                    },
                    42
                ]
            }
        }))
        .unwrap();

        let ctx = RuleContext::current();
        let tokens: Vec<String> = parsed
            .arguments
            .game
            .iter()
            .flat_map(|e| e.resolve(&ctx))
            .collect();

        assert_eq!(tokens, vec!["--username", "Player", "--demo"]);
    }

    #[test]
    fn legacy_arguments_split_on_whitespace() {
        let parsed: VersionDescriptor = serde_json::from_str(
            r#"{"id": "old", "minecraftArguments": "--username ${auth_player_name} --gameDir ${game_directory}"}"#,
        )
        .unwrap();
        let ctx = RuleContext::current();
        let tokens: Vec<String> = parsed
            .legacy_arguments()
            .iter()
            .flat_map(|e| e.resolve(&ctx))
            .collect();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0], "--username");
    }
}
