use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobGraphError {
    #[error("cannot read action name")]
    MissingStepAction,

    #[error("multiple action defined for the same step {0:?}")]
    MultipleStepActions(Vec<String>),

    #[error("unknown action {0:?}")]
    UnknownAction(String),

    #[error("unknown deployment {0:?}")]
    UnknownDeployment(String),

    #[error("depends on unknown stage {0:?}")]
    UnknownStage(String),

    #[error("job {job:?} references unknown stage {stage:?}")]
    UnknownJobStage { job: String, stage: String },

    #[error("job {job:?} depends on unknown job {dependency:?}")]
    UnknownJobDependency { job: String, dependency: String },

    #[error("dependency cycle detected between {0:?}")]
    DependencyCycle(Vec<String>),

    #[error("join {join_id} references parent {parent_id} which was not converted")]
    UnresolvedJoinParent { join_id: i64, parent_id: i64 },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, JobGraphError>;
