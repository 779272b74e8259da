// ─── Launch ───
// Classpath and argument assembly plus process supervision.

mod arguments;
mod classpath;
mod natives;
mod process;

pub use arguments::{build_arguments, ArgumentContext, LaunchArguments};
pub use classpath::{build_classpath, classpath_separator, safe_path_str};
pub use natives::extract_natives;
pub use process::GameProcess;

use std::path::PathBuf;

/// Everything needed to start the game process. Constructed fresh per
/// launch; never persisted.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    /// Installed version id the plan was assembled for.
    pub version_id: String,
    pub executable: PathBuf,
    /// Template-derived JVM arguments, classpath flag included, with the
    /// fixed tuning flags appended.
    pub jvm_args: Vec<String>,
    pub main_class: String,
    pub game_args: Vec<String>,
    /// Ordered, deduplicated classpath entries.
    pub classpath: Vec<String>,
    pub working_dir: PathBuf,
}

impl LaunchPlan {
    /// Final argument vector: JVM arguments, main class, game arguments.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = self.jvm_args.clone();
        argv.push(self.main_class.clone());
        argv.extend(self.game_args.iter().cloned());
        argv
    }
}
