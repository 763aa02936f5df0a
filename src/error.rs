use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML 解析错误: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON 解析错误: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("无效的策略模式: {0}")]
    InvalidStrategyMode(String),

    #[error("无效的配置模式: {0}")]
    InvalidConfigMode(String),

    #[error("配置模式不支持路由: {0}")]
    UnsupportedConfigMode(String),

    #[error("缺少配置模式: 使用 options 时必须指定 mode")]
    MissingMode,

    #[error("options 与 targets 不能同时指定")]
    ConflictingConfigShape,

    #[error("未配置任何 provider: options 与 targets 均为空")]
    MissingProviders,

    #[error("{path}: 目标引用不存在: {name}")]
    MissingTargetReference { path: String, name: String },

    #[error("{path}: 目标名称重复: {name}")]
    DuplicateTargetName { path: String, name: String },

    #[error("strategy.mode ({strategy}) 与 mode ({mode}) 不一致")]
    StrategyModeMismatch { mode: String, strategy: String },

    #[error("{0}: conditional 策略的 conditions 不能为空")]
    EmptyConditions(String),

    #[error("{0}: 存在子 targets 但缺少 strategy")]
    MissingStrategy(String),

    #[error("{0}: strategy 没有任何子 targets")]
    EmptyStrategyTargets(String),

    #[error("{path}: 无效的权重: {weight}")]
    InvalidWeight { path: String, weight: f64 },

    #[error("{path}: 无效的 HTTP 状态码: {code}")]
    InvalidStatusCode { path: String, code: u16 },

    #[error("{0}: content 与 content_blocks 内容矛盾")]
    ContradictoryMessageContent(String),

    #[error("没有可选的目标: {0}")]
    NoSelectableTarget(String),

    #[error("{0}: 没有匹配的条件且未设置 default")]
    NoConditionMatched(String),

    #[error("无效的条件查询: {0}")]
    InvalidQuery(String),
}

impl ContractError {
    pub fn config(msg: impl Into<String>) -> Self {
        ContractError::ConfigError(msg.into())
    }

    pub fn missing_target(path: impl Into<String>, name: impl Into<String>) -> Self {
        ContractError::MissingTargetReference {
            path: path.into(),
            name: name.into(),
        }
    }

    pub fn invalid_query(msg: impl Into<String>) -> Self {
        ContractError::InvalidQuery(msg.into())
    }
}
