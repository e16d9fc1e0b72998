//! OCR 服务客户端
//!
//! 只负责把图片交给 OCR 服务并取回原始文本，文本规整由调用方完成，失败不重试。

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::OcrError;

/// OCR 结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrOutcome {
    pub parsed_text: String,
    pub success: bool,
    pub error_message: Option<String>,
}

impl OcrOutcome {
    pub fn parsed(text: impl Into<String>) -> Self {
        Self {
            parsed_text: text.into(),
            success: true,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            parsed_text: String::new(),
            success: false,
            error_message: Some(message.into()),
        }
    }
}

/// OCR 服务接口
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// 识别图片文字
    ///
    /// 服务端返回处理失败时给出 `success = false` 的结果；传输或解析失败返回错误
    async fn extract(&self, image: &[u8], is_question_paper: bool) -> Result<OcrOutcome, OcrError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceResponse {
    #[serde(default)]
    parsed_results: Vec<OcrSpaceResult>,
    #[serde(default)]
    is_errored_on_processing: bool,
    /// 字符串或字符串数组
    #[serde(default)]
    error_message: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceResult {
    #[serde(default)]
    parsed_text: String,
}

fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let joined = items.iter().filter_map(Value::as_str).collect::<Vec<_>>().join("; ");
            (!joined.is_empty()).then_some(joined)
        }
        _ => None,
    }
}

/// OCR.space 客户端
pub struct OcrSpaceClient {
    http: reqwest::Client,
    api_key: String,
    api_url: String,
}

impl OcrSpaceClient {
    pub fn new(http: reqwest::Client, api_key: &str, api_url: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            api_url: api_url.to_string(),
        }
    }

    fn build_form(&self, image: &[u8], is_question_paper: bool) -> Result<Form, OcrError> {
        let file = Part::bytes(image.to_vec()).file_name("scan.png").mime_str("image/png")?;
        let form = Form::new()
            .text("apikey", self.api_key.clone())
            .text("language", "eng")
            .text("OCREngine", "2")
            .text("detectOrientation", "true")
            .text("scale", "true")
            .text("isTable", if is_question_paper { "true" } else { "false" })
            .part("file", file);
        Ok(form)
    }
}

#[async_trait]
impl OcrProvider for OcrSpaceClient {
    async fn extract(&self, image: &[u8], is_question_paper: bool) -> Result<OcrOutcome, OcrError> {
        debug!("OCR 识别: {} 字节, 试卷={}", image.len(), is_question_paper);

        let form = self.build_form(image, is_question_paper)?;
        let response = self.http.post(&self.api_url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("OCR 服务返回错误: status={}", status);
            return Err(OcrError::Rejected(format!("status {}: {}", status, body.trim())));
        }

        let body = response.text().await?;
        let parsed: OcrSpaceResponse =
            serde_json::from_str(&body).map_err(|e| OcrError::Parse(e.to_string()))?;

        if parsed.is_errored_on_processing {
            let message = error_text(&parsed.error_message).unwrap_or_else(|| "Unknown OCR error".to_string());
            warn!("OCR 识别失败: {}", message);
            return Ok(OcrOutcome::failed(message));
        }

        match parsed.parsed_results.into_iter().next() {
            Some(result) => Ok(OcrOutcome::parsed(result.parsed_text)),
            None => Ok(OcrOutcome::failed("No text was recognised in the image")),
        }
    }
}
