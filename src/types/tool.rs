use super::message::CacheControl;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON Schema，开放的键值集合
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonSchema(pub Map<String, Value>);

impl JsonSchema {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// 可调用的函数定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<JsonSchema>,
    /// 为 true 时模型严格按照 parameters 生成参数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parameters: None,
            strict: None,
        }
    }
}

/// 工具定义
///
/// 除 function 工具外，computer-use、web_search 等工具的附加字段保存在 `extra` 中。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<Function>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tool {
    pub fn function(function: Function) -> Self {
        Self {
            kind: "function".to_string(),
            function: Some(function),
            cache_control: None,
            extra: Map::new(),
        }
    }

    pub fn is_function(&self) -> bool {
        self.kind == "function"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoiceMode {
    None,
    Auto,
    Required,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedFunction {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolChoiceObject {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: NamedFunction,
}

/// 工具选择："none" / "auto" / "required" 或指定函数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolChoice {
    Mode(ToolChoiceMode),
    Named(ToolChoiceObject),
}

/// 旧版 function_call 选择："none" / "auto" 或 {name}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FunctionCallChoice {
    Mode(ToolChoiceMode),
    Named(NamedFunction),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_function_tool_deserialization() {
        let tool: Tool = serde_json::from_value(json!({
            "type": "function",
            "function": {
                "name": "get_weather",
                "description": "Weather lookup",
                "parameters": {"type": "object", "properties": {"city": {"type": "string"}}},
                "strict": true
            },
            "cache_control": {"type": "ephemeral"}
        }))
        .unwrap();

        assert!(tool.is_function());
        let function = tool.function.as_ref().unwrap();
        assert_eq!(function.strict, Some(true));
        assert_eq!(
            function.parameters.as_ref().unwrap().get("type"),
            Some(&json!("object"))
        );
        assert!(tool.cache_control.is_some());
        assert!(tool.extra.is_empty());
    }

    #[test]
    fn test_computer_use_tool_keeps_extra_keys() {
        let value = json!({
            "type": "computer_20241022",
            "display_width_px": 1024,
            "display_height_px": 768
        });
        let tool: Tool = serde_json::from_value(value.clone()).unwrap();
        assert!(tool.function.is_none());
        assert_eq!(tool.extra.get("display_width_px"), Some(&json!(1024)));
        assert_eq!(serde_json::to_value(&tool).unwrap(), value);
    }

    #[test]
    fn test_tool_choice_variants() {
        let auto: ToolChoice = serde_json::from_value(json!("auto")).unwrap();
        assert_eq!(auto, ToolChoice::Mode(ToolChoiceMode::Auto));

        let named: ToolChoice = serde_json::from_value(json!({
            "type": "function",
            "function": {"name": "lookup"}
        }))
        .unwrap();
        let ToolChoice::Named(object) = named else {
            panic!("应为指定函数");
        };
        assert_eq!(object.function.name, "lookup");

        assert!(serde_json::from_value::<ToolChoice>(json!("sometimes")).is_err());
    }

    #[test]
    fn test_function_call_choice() {
        let choice: FunctionCallChoice = serde_json::from_value(json!({"name": "f"})).unwrap();
        assert_eq!(
            choice,
            FunctionCallChoice::Named(NamedFunction {
                name: "f".to_string()
            })
        );
    }
}
