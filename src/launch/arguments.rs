// ─── Launch Argument Builder ───
// Merges JVM/game argument templates from both descriptors, substitutes
// placeholders, and assembles the final vectors. Pure transformation.

use std::path::Path;

use crate::auth::Credential;
use crate::error::{LauncherError, LauncherResult};
use crate::rules::RuleContext;
use crate::version::{ArgumentEntry, VersionDescriptor};

/// Inputs for placeholder substitution, borrowed from the orchestrator's
/// launch state.
pub struct ArgumentContext<'a> {
    pub credential: &'a Credential,
    pub version_id: &'a str,
    pub game_dir: &'a Path,
    pub assets_dir: &'a Path,
    pub asset_index_id: &'a str,
    pub natives_dir: &'a Path,
    pub libraries_dir: &'a Path,
    pub classpath: &'a str,
    pub jvm_tuning_flags: &'a str,
    pub launcher_name: &'a str,
    pub launcher_version: &'a str,
    pub version_type: &'a str,
}

/// Resolved argument vectors plus the main class.
#[derive(Debug, Clone)]
pub struct LaunchArguments {
    pub jvm: Vec<String>,
    pub game: Vec<String>,
    pub main_class: String,
}

/// Two-level inheritance merge. When the overlay declares a non-empty
/// inherits-from, both lists are retained (base first); otherwise a
/// non-empty overlay list replaces the base list entirely.
fn merge_templates<'a>(
    base: &'a [ArgumentEntry],
    overlay: &'a [ArgumentEntry],
    overlay_inherits: bool,
) -> Vec<&'a ArgumentEntry> {
    if overlay_inherits {
        base.iter().chain(overlay.iter()).collect()
    } else if !overlay.is_empty() {
        overlay.iter().collect()
    } else {
        base.iter().collect()
    }
}

fn resolve_templates(
    templates: &[&ArgumentEntry],
    rule_ctx: &RuleContext,
    table: &[(&str, String)],
) -> Vec<String> {
    templates
        .iter()
        .flat_map(|entry| entry.resolve(rule_ctx))
        .map(|token| substitute(&token, table))
        .collect()
}

/// Replace every `${name}` occurrence from the fixed table. Unresolved
/// placeholders are left as literal text.
fn substitute(token: &str, table: &[(&str, String)]) -> String {
    let mut out = token.to_string();
    for (key, value) in table {
        out = out.replace(&format!("${{{}}}", key), value);
    }
    out
}

fn placeholder_table(ctx: &ArgumentContext<'_>) -> Vec<(&'static str, String)> {
    let credential = ctx.credential;
    vec![
        ("auth_player_name", credential.username.clone()),
        ("version_name", ctx.version_id.to_string()),
        ("game_directory", path_str(ctx.game_dir)),
        ("assets_root", path_str(ctx.assets_dir)),
        ("game_assets", path_str(ctx.assets_dir)),
        ("assets_index_name", ctx.asset_index_id.to_string()),
        ("auth_uuid", credential.uuid.clone()),
        ("auth_access_token", credential.access_token.clone()),
        ("auth_xuid", credential.xuid.clone().unwrap_or_default()),
        ("auth_session", credential.session_token()),
        ("natives_directory", path_str(ctx.natives_dir)),
        ("classpath", ctx.classpath.to_string()),
        (
            "classpath_separator",
            super::classpath_separator().to_string(),
        ),
        ("library_directory", path_str(ctx.libraries_dir)),
        ("launcher_name", ctx.launcher_name.to_string()),
        ("launcher_version", ctx.launcher_version.to_string()),
        ("version_type", ctx.version_type.to_string()),
        ("clientid", String::new()),
        ("user_properties", "{}".to_string()),
    ]
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Build the final JVM and game argument vectors from both descriptors.
///
/// The game-side list falls back to the legacy flat argument string when
/// the structured merge produces nothing; the classpath flag is appended
/// when no template supplied one; the fixed tuning flags always follow
/// the template-derived JVM arguments.
pub fn build_arguments(
    base: &VersionDescriptor,
    overlay: &VersionDescriptor,
    ctx: &ArgumentContext<'_>,
    rule_ctx: &RuleContext,
) -> LauncherResult<LaunchArguments> {
    let overlay_inherits = overlay.inherits();
    let table = placeholder_table(ctx);

    let jvm_templates = merge_templates(
        &base.arguments.jvm,
        &overlay.arguments.jvm,
        overlay_inherits,
    );
    let mut jvm = resolve_templates(&jvm_templates, rule_ctx, &table);

    let game_templates = merge_templates(
        &base.arguments.game,
        &overlay.arguments.game,
        overlay_inherits,
    );
    let mut game = resolve_templates(&game_templates, rule_ctx, &table);

    if game.is_empty() {
        let base_legacy = base.legacy_arguments();
        let overlay_legacy = overlay.legacy_arguments();
        let legacy_templates = merge_templates(&base_legacy, &overlay_legacy, overlay_inherits);
        game = resolve_templates(&legacy_templates, rule_ctx, &table);
    }

    let has_classpath_flag = jvm
        .iter()
        .any(|arg| arg == "-cp" || arg == "-classpath");
    if !has_classpath_flag {
        jvm.push("-cp".into());
        jvm.push(ctx.classpath.to_string());
    }

    jvm.extend(ctx.jvm_tuning_flags.split_whitespace().map(String::from));

    let main_class = overlay
        .main_class
        .as_deref()
        .filter(|mc| !mc.trim().is_empty())
        .or_else(|| {
            base.main_class
                .as_deref()
                .filter(|mc| !mc.trim().is_empty())
        })
        .ok_or_else(|| LauncherError::Config("no main class declared by either runtime".into()))?
        .to_string();

    Ok(LaunchArguments {
        jvm,
        game,
        main_class,
    })
}
