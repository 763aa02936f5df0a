use anyhow::Context;
use clap::{Parser, Subcommand};
use feathergate_contract::config::{self, Config, ProviderNode};
use feathergate_contract::request::RequestBody;
use feathergate_contract::routing::{conditional, RoutePlanner};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "feathergate-contract")]
#[command(about = "网关请求配置校验与路由计划工具", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 校验配置文件或请求体
    Validate {
        /// 配置文件路径（YAML 或 JSON）
        file: PathBuf,
    },
    /// 输出解析后的目标树
    Tree { file: PathBuf },
    /// 输出路由尝试顺序
    Plan {
        file: PathBuf,

        /// conditional 策略求值上下文（JSON 对象），合并进 `{metadata, params}`
        #[arg(short, long)]
        context: Option<String>,

        /// 随机种子，固定后负载均衡结果可复现
        #[arg(short, long)]
        seed: Option<u64>,
    },
}

/// 文件可以是完整请求体 `{config, params}`，也可以只有 config
enum Document {
    Request(RequestBody),
    Config(Config),
}

impl Document {
    fn load(path: &Path) -> anyhow::Result<Self> {
        let value = config::load_document(path)
            .with_context(|| format!("无法读取 {}", path.display()))?;
        let is_request = value
            .as_object()
            .is_some_and(|map| map.contains_key("config") && map.contains_key("params"));
        if is_request {
            Ok(Document::Request(RequestBody::from_value(value)?))
        } else {
            Ok(Document::Config(Config::from_value(value)?))
        }
    }

    fn provider_tree(&self) -> anyhow::Result<ProviderNode> {
        let tree = match self {
            Document::Request(body) => body.provider_tree()?,
            Document::Config(config) => config.provider_tree()?,
        };
        Ok(tree)
    }

    /// 请求体自带的 params 加上命令行传入的上下文
    fn route_context(&self, overlay: Option<Value>) -> anyhow::Result<Value> {
        let mut context = match self {
            Document::Request(body) => body.route_context(&BTreeMap::new())?,
            Document::Config(_) => json!({ "metadata": {} }),
        };
        if let Some(overlay) = overlay {
            conditional::merge_context(&mut context, overlay);
        }
        Ok(context)
    }
}

fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 解析命令行参数
    let args = Args::parse();

    match args.command {
        Command::Validate { file } => {
            let document = Document::load(&file)?;
            document.provider_tree()?;
            info!("{} 校验通过", file.display());
        }
        Command::Tree { file } => {
            let tree = Document::load(&file)?.provider_tree()?;
            println!("{}", serde_json::to_string_pretty(&tree)?);
        }
        Command::Plan {
            file,
            context,
            seed,
        } => {
            let document = Document::load(&file)?;
            let tree = document.provider_tree()?;
            let overlay = context
                .map(|raw| -> anyhow::Result<Value> {
                    let value: Value = serde_json::from_str(&raw).context("context 必须是 JSON")?;
                    anyhow::ensure!(value.is_object(), "context 必须是 JSON 对象");
                    Ok(value)
                })
                .transpose()?;
            let context = document.route_context(overlay)?;

            let mut planner = match seed {
                Some(seed) => RoutePlanner::seeded(seed),
                None => RoutePlanner::from_entropy(),
            };
            let plan = planner.plan(&tree, &context)?;
            let output: Vec<Value> = plan
                .iter()
                .map(|leaf| {
                    json!({
                        "path": leaf.path,
                        "name": leaf.name,
                        "target": leaf.options.describe(),
                        "retryAttempts": leaf.options.retry.as_ref().map(|r| r.effective_attempts()),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
