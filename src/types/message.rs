use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Function,
    Tool,
    Developer,
}

/// 下游视为系统级指令的角色
pub const SYSTEM_MESSAGE_ROLES: [Role; 2] = [Role::System, Role::Developer];

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Function => "function",
            Role::Tool => "tool",
            Role::Developer => "developer",
        }
    }

    /// 是否为系统级角色（system / developer）
    pub fn is_system_level(&self) -> bool {
        SYSTEM_MESSAGE_ROLES.contains(self)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prompt 缓存标记类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheControlKind {
    Ephemeral,
}

/// Prompt 缓存标记，提示 provider 可缓存该内容块
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheControl {
    #[serde(rename = "type")]
    pub kind: CacheControlKind,
}

impl CacheControl {
    pub fn ephemeral() -> Self {
        Self {
            kind: CacheControlKind::Ephemeral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputAudio {
    pub data: String,
    /// 为空时由 provider 自动识别
    pub format: String,
}

/// 内容块的公共字段（文本、图片、文件、音频、thinking）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<ImageUrl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio: Option<InputAudio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,
}

/// 多模态消息内容块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub body: ContentBody,
}

impl ContentPart {
    /// 创建文本内容块
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            body: ContentBody {
                text: Some(text.into()),
                ..Default::default()
            },
        }
    }

    /// 创建 thinking 内容块
    pub fn thinking(thinking: impl Into<String>, signature: Option<String>) -> Self {
        Self {
            kind: "thinking".to_string(),
            body: ContentBody {
                thinking: Some(thinking.into()),
                signature,
                ..Default::default()
            },
        }
    }

    /// 创建图片内容块
    pub fn image_url(url: impl Into<String>) -> Self {
        Self {
            kind: "image_url".to_string(),
            body: ContentBody {
                image_url: Some(ImageUrl {
                    url: url.into(),
                    detail: None,
                    mime_type: None,
                }),
                ..Default::default()
            },
        }
    }

    pub fn with_cache_control(mut self) -> Self {
        self.body.cache_control = Some(CacheControl::ephemeral());
        self
    }
}

/// 流式响应中的内容块增量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlockChunk {
    pub index: u32,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub body: ContentBody,
}

/// 消息内容：纯文本或有序内容块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// 拼接所有文本，非文本块忽略
    pub fn flatten_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => flatten_parts(parts),
        }
    }
}

pub(crate) fn flatten_parts(parts: &[ContentPart]) -> String {
    parts
        .iter()
        .filter_map(|p| p.body.text.as_deref())
        .collect::<Vec<_>>()
        .join("")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// assistant 发起的工具调用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

/// 消息上的 `function_call`：结构不符时原样保留
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FunctionCallField {
    Typed(FunctionCall),
    Raw(Value),
}

impl FunctionCallField {
    pub fn typed(&self) -> Option<&FunctionCall> {
        match self {
            FunctionCallField::Typed(call) => Some(call),
            FunctionCallField::Raw(_) => None,
        }
    }
}

/// 消息上的 `tool_calls`：结构不符时原样保留
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolCallList {
    Typed(Vec<ToolCall>),
    Raw(Value),
}

impl ToolCallList {
    pub fn typed(&self) -> Option<&[ToolCall]> {
        match self {
            ToolCallList::Typed(calls) => Some(calls),
            ToolCallList::Raw(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citation_sources: Vec<CitationSource>,
}

/// 对话消息
///
/// `content` 是扁平形式，`content_blocks` 是结构化形式。两者同时出现时
/// 不定义优先级，由 [`crate::validate`] 检查是否矛盾。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_blocks: Option<Vec<ContentPart>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCallField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<ToolCallList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(
        rename = "citationMetadata",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub citation_metadata: Option<CitationMetadata>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(MessageContent::Text(content.into())),
            content_blocks: None,
            name: None,
            function_call: None,
            tool_calls: None,
            tool_call_id: None,
            citation_metadata: None,
        }
    }

    /// 创建用户消息
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// 创建助手消息
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// 创建系统消息
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn developer(content: impl Into<String>) -> Self {
        Self::new(Role::Developer, content)
    }

    /// 只带结构化内容块的消息
    pub fn with_blocks(role: Role, blocks: Vec<ContentPart>) -> Self {
        Self {
            content: None,
            content_blocks: Some(blocks),
            ..Self::new(role, "")
        }
    }

    /// `content` 与 `content_blocks` 同时存在且文本不一致
    pub fn has_contradictory_content(&self) -> bool {
        match (&self.content, &self.content_blocks) {
            (Some(MessageContent::Parts(parts)), Some(blocks)) => parts != blocks,
            (Some(content), Some(blocks)) => content.flatten_text() != flatten_parts(blocks),
            _ => false,
        }
    }
}
