use super::cache::CacheSettings;
use super::retry::RetrySettings;
use crate::types::Params;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// before/after-request 与 guardrail 钩子，结构由钩子系统定义，此处只保留原始字段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Azure OpenAI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_auth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_auth_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_managed_client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_entra_client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_entra_client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_entra_tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_ad_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_model_name: Option<String>,
}

/// Azure AI Inference / Foundry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureInferenceOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_deployment_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_extra_params: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_foundry_url: Option<String>,
}

/// AWS 凭证与 S3 设置（Bedrock 与 Sagemaker 共用）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_secret_access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_session_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_auth_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_s3_bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_s3_object_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_bedrock_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_server_side_encryption: Option<String>,
    #[serde(
        rename = "awsServerSideEncryptionKMSKeyId",
        alias = "awsServerSideEncryptionKmsKeyId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub aws_server_side_encryption_kms_key_id: Option<String>,
}

/// Amazon Sagemaker 请求头
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SagemakerOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amzn_sagemaker_custom_attributes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amzn_sagemaker_target_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amzn_sagemaker_target_variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amzn_sagemaker_target_container_hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amzn_sagemaker_inference_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amzn_sagemaker_enable_explanations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amzn_sagemaker_inference_component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amzn_sagemaker_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amzn_sagemaker_model_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StabilityOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability_client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability_client_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability_client_version: Option<String>,
}

/// Google Vertex AI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_service_account_json: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_storage_bucket_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_model_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_beta: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnthropicOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_beta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_version: Option<String>,
}

/// 单个上游 provider 的绑定
///
/// 线上是扁平的 camelCase 对象，provider 专有字段按前缀（`azure*`、`aws*`、
/// `vertex*` ...）分组到子结构，并通过 flatten 保持扁平格式。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// 负载均衡相对权重，未设置时按 1 计
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetrySettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_params: Option<Box<Params>>,
    /// 实际请求的上游 URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_to_fetch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_host: Option<String>,
    /// 原样转发给 provider 的请求头
    #[serde(
        default,
        deserialize_with = "super::null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub forward_headers: Vec<String>,
    /// 负载均衡时选中的下标
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    /// 请求超时（毫秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// 以 form-data 发送（例如 Stability V2）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_to_form_data: Option<bool>,
    /// Google 文件上传使用
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(
        default,
        deserialize_with = "super::null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub before_request_hooks: Vec<HookObject>,
    #[serde(
        default,
        deserialize_with = "super::null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub after_request_hooks: Vec<HookObject>,
    #[serde(
        default,
        deserialize_with = "super::null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub default_input_guardrails: Vec<HookObject>,
    #[serde(
        default,
        deserialize_with = "super::null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub default_output_guardrails: Vec<HookObject>,

    /// 是否只返回 OpenAI 兼容字段
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_open_ai_compliance: Option<bool>,
    /// 使用 Mistral fim/completions 端点
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mistral_fim_completion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers_ai_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fireworks_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snowflake_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub huggingface_base_url: Option<String>,

    #[serde(flatten)]
    pub azure: AzureOptions,
    #[serde(flatten)]
    pub azure_inference: AzureInferenceOptions,
    #[serde(flatten)]
    pub aws: AwsOptions,
    #[serde(flatten)]
    pub sagemaker: SagemakerOptions,
    #[serde(flatten)]
    pub stability: StabilityOptions,
    #[serde(flatten)]
    pub vertex: VertexOptions,
    #[serde(flatten)]
    pub openai: OpenAiOptions,
    #[serde(flatten)]
    pub anthropic: AnthropicOptions,
}

impl ProviderOptions {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            ..Default::default()
        }
    }

    /// 负载均衡使用的权重，未设置时为 1
    pub fn effective_weight(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }

    /// 用于日志的摘要，不包含任何凭证内容
    pub fn describe(&self) -> String {
        let provider = self.provider.as_deref().unwrap_or("<unset>");
        let credential = if self.virtual_key.is_some() {
            "virtual_key"
        } else if self.api_key.is_some() {
            "api_key"
        } else {
            "none"
        };
        match self.weight {
            Some(weight) => format!("{provider} (credential={credential}, weight={weight})"),
            None => format!("{provider} (credential={credential})"),
        }
    }
}
