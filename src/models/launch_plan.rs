use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default host the server binds to
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default port the server binds to
pub const DEFAULT_PORT: u16 = 8000;

/// The three stages of a launch, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Initializer,
    Worker,
    Server,
}

impl StageKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initializer => "initializer",
            Self::Worker => "worker",
            Self::Server => "server",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when the initializer does not exit cleanly
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log and keep going
    #[default]
    Continue,
    /// Stop the launch and exit with the initializer's code
    Abort,
}

/// Address the server stage is told to listen on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerBind {
    pub host: String,
    pub port: u16,
}

impl Default for ServerBind {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// A single process to launch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub kind: StageKind,
    /// Line printed to stdout right before the stage starts
    pub banner: String,
    /// Shell command line; `{host}` and `{port}` are substituted
    pub command: String,
    /// Stage-specific environment, overrides the shared one
    pub env: BTreeMap<String, String>,
}

impl Stage {
    pub fn new(kind: StageKind, banner: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            kind,
            banner: banner.into(),
            command: command.into(),
            env: BTreeMap::new(),
        }
    }

    /// Command line with bind placeholders filled in
    pub fn render(&self, bind: &ServerBind) -> String {
        self.command
            .replace("{host}", &bind.host)
            .replace("{port}", &bind.port.to_string())
    }
}

/// Everything needed to bring the container up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchPlan {
    pub name: String,
    /// Working directory for every stage; current directory when unset
    pub workdir: Option<PathBuf>,
    /// Directories under `workdir` that must exist before any stage runs
    pub directories: Vec<String>,
    /// Environment shared by all stages
    pub env: BTreeMap<String, String>,
    pub initializer: Option<Stage>,
    pub worker: Option<Stage>,
    pub server: Stage,
    pub bind: ServerBind,
    pub on_init_failure: FailurePolicy,
}

impl Default for LaunchPlan {
    fn default() -> Self {
        Self {
            name: "app".to_string(),
            workdir: None,
            directories: vec!["uploads".to_string(), "temp".to_string()],
            env: BTreeMap::new(),
            initializer: Some(Stage::new(
                StageKind::Initializer,
                "Initializing database...",
                "python init_db.py",
            )),
            worker: Some(Stage::new(
                StageKind::Worker,
                "Starting Celery worker in background...",
                "celery -A app.workers.tasks worker --loglevel=info",
            )),
            server: Stage::new(
                StageKind::Server,
                "Starting FastAPI application...",
                "uvicorn app.main:app --host {host} --port {port}",
            ),
            bind: ServerBind::default(),
            on_init_failure: FailurePolicy::Continue,
        }
    }
}

fn env_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("env name pattern is valid")
    })
}

impl LaunchPlan {
    /// Stages in launch order
    pub fn stages(&self) -> Vec<&Stage> {
        let mut stages = Vec::with_capacity(3);
        if let Some(init) = &self.initializer {
            stages.push(init);
        }
        if let Some(worker) = &self.worker {
            stages.push(worker);
        }
        stages.push(&self.server);
        stages
    }

    /// Working directory, falling back to `current`
    pub fn resolved_workdir(&self, current: &Path) -> PathBuf {
        match &self.workdir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => current.join(dir),
            None => current.to_path_buf(),
        }
    }

    /// Absolute paths of the required directories
    pub fn resolved_directories(&self, workdir: &Path) -> Vec<PathBuf> {
        self.directories.iter().map(|d| workdir.join(d)).collect()
    }

    /// Environment for one stage: shared, then stage-specific, then the launch variables
    pub fn stage_environment(&self, stage: &Stage, workdir: &Path) -> HashMap<String, String> {
        let mut env: HashMap<String, String> = self
            .env
            .iter()
            .chain(stage.env.iter())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        env.insert("LAUNCH_APP_NAME".to_string(), self.name.clone());
        env.insert("LAUNCH_STAGE".to_string(), stage.kind.to_string());
        env.insert(
            "LAUNCH_WORKDIR".to_string(),
            workdir.to_string_lossy().to_string(),
        );
        env.insert("LAUNCH_HOST".to_string(), self.bind.host.clone());
        env.insert("LAUNCH_PORT".to_string(), self.bind.port.to_string());
        env
    }

    /// Validate the plan before anything is launched
    pub fn validate(&self) -> Result<(), String> {
        self.validate_name()?;
        self.validate_stages()?;
        self.validate_bind()?;
        self.validate_directories()?;
        self.validate_env()?;
        Ok(())
    }

    fn validate_name(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Launch name cannot be empty".to_string());
        }

        if !self
            .name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(format!(
                "Invalid launch name '{}' (must be valid identifier)",
                self.name
            ));
        }

        Ok(())
    }

    fn validate_stages(&self) -> Result<(), String> {
        for stage in self.stages() {
            if stage.command.trim().is_empty() {
                return Err(format!("Command for stage '{}' cannot be empty", stage.kind));
            }
        }
        Ok(())
    }

    fn validate_bind(&self) -> Result<(), String> {
        if self.bind.port == 0 {
            return Err("Server port must be between 1 and 65535".to_string());
        }
        if self.bind.host.trim().is_empty() {
            return Err("Server host cannot be empty".to_string());
        }
        Ok(())
    }

    fn validate_directories(&self) -> Result<(), String> {
        for dir in &self.directories {
            if dir.is_empty() {
                return Err("Directory entries cannot be empty".to_string());
            }
            if Path::new(dir).is_absolute() {
                return Err(format!(
                    "Directory '{dir}' must be relative to the working directory"
                ));
            }
            if Path::new(dir)
                .components()
                .any(|c| matches!(c, Component::ParentDir))
            {
                return Err(format!("Directory '{dir}' cannot contain '..' references"));
            }
        }
        Ok(())
    }

    fn validate_env(&self) -> Result<(), String> {
        let stage_envs = self.stages().into_iter().flat_map(|s| s.env.keys());
        for name in self.env.keys().chain(stage_envs) {
            if !env_name_pattern().is_match(name) {
                return Err(format!("Invalid environment variable name '{name}'"));
            }
        }
        Ok(())
    }
}

/// `[launch]` table of the launch file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaunchSection {
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workdir: Option<PathBuf>,
    pub directories: Option<Vec<String>>,
    pub on_init_failure: Option<FailurePolicy>,
}

/// `[initializer]` / `[worker]` tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageSection {
    pub banner: Option<String>,
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// `false` removes the stage from the plan
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

/// `[server]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    pub banner: Option<String>,
    pub command: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

const fn enabled_default() -> bool {
    true
}

/// On-disk format of `launch.toml`; absent keys fall back to the default plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaunchToml {
    #[serde(default)]
    pub launch: LaunchSection,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    pub initializer: Option<StageSection>,
    pub worker: Option<StageSection>,
    pub server: Option<ServerSection>,
}

fn merge_stage(default: Option<Stage>, section: Option<StageSection>) -> Option<Stage> {
    let Some(section) = section else {
        return default;
    };
    if !section.enabled {
        return None;
    }
    let mut stage = default?;
    if let Some(banner) = section.banner {
        stage.banner = banner;
    }
    if let Some(command) = section.command {
        stage.command = command;
    }
    stage.env = section.env;
    Some(stage)
}

impl From<LaunchToml> for LaunchPlan {
    fn from(toml: LaunchToml) -> Self {
        let defaults = Self::default();
        let server_section = toml.server.unwrap_or_default();

        let mut server = defaults.server;
        if let Some(banner) = server_section.banner {
            server.banner = banner;
        }
        if let Some(command) = server_section.command {
            server.command = command;
        }
        server.env = server_section.env;

        Self {
            name: toml.launch.name.unwrap_or(defaults.name),
            workdir: toml.launch.workdir,
            directories: toml.launch.directories.unwrap_or(defaults.directories),
            env: toml.env,
            initializer: merge_stage(defaults.initializer, toml.initializer),
            worker: merge_stage(defaults.worker, toml.worker),
            server,
            bind: ServerBind {
                host: server_section.host.unwrap_or(defaults.bind.host),
                port: server_section.port.unwrap_or(defaults.bind.port),
            },
            on_init_failure: toml.launch.on_init_failure.unwrap_or_default(),
        }
    }
}

fn stage_section(stage: Option<&Stage>) -> StageSection {
    stage.map_or(
        StageSection {
            enabled: false,
            ..StageSection::default()
        },
        |s| StageSection {
            banner: Some(s.banner.clone()),
            command: Some(s.command.clone()),
            env: s.env.clone(),
            enabled: true,
        },
    )
}

impl From<LaunchPlan> for LaunchToml {
    fn from(plan: LaunchPlan) -> Self {
        Self {
            launch: LaunchSection {
                name: Some(plan.name.clone()),
                workdir: plan.workdir.clone(),
                directories: Some(plan.directories.clone()),
                on_init_failure: Some(plan.on_init_failure),
            },
            env: plan.env.clone(),
            initializer: Some(stage_section(plan.initializer.as_ref())),
            worker: Some(stage_section(plan.worker.as_ref())),
            server: Some(ServerSection {
                banner: Some(plan.server.banner.clone()),
                command: Some(plan.server.command.clone()),
                host: Some(plan.bind.host.clone()),
                port: Some(plan.bind.port),
                env: plan.server.env,
            }),
        }
    }
}
