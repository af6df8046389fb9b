//! 多模态向量化
//!
//! 每次请求只携带一种输入：文本或 base64 编码的图片，
//! 返回长度固定为 `outputEmbeddingLength` 的向量。

mod bedrock;

pub use bedrock::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 向量，长度由 `outputEmbeddingLength` 决定
pub type Embedding = Vec<f32>;

/// 默认输出向量长度
pub const DEFAULT_EMBEDDING_LENGTH: usize = 1024;

#[derive(Error, Debug)]
pub enum EmbedError {
    /// 调用向量化服务失败
    #[error("向量化服务调用失败: {0}")]
    Service(String),
    #[error("无法解析向量化响应: {0}")]
    Json(#[from] serde_json::Error),
    #[error("向量化响应中缺少 embedding 字段")]
    MissingEmbedding,
    #[error("向量长度不一致: 期望 {expected}, 实际 {actual}")]
    Dimension { expected: usize, actual: usize },
}

/// 向量化输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingInput {
    /// 查询文本
    Text(String),
    /// base64 编码的图片
    Image(String),
}

impl EmbeddingInput {
    pub fn modality(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct EmbeddingConfig {
    output_embedding_length: usize,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct EmbeddingRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    input_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_image: Option<&'a str>,
    embedding_config: EmbeddingConfig,
}

#[derive(Deserialize, Debug)]
struct EmbeddingResponse {
    embedding: Option<Embedding>,
}

/// 构造请求体
pub fn request_body(input: &EmbeddingInput, length: usize) -> Result<Vec<u8>, EmbedError> {
    let (input_text, input_image) = match input {
        EmbeddingInput::Text(text) => (Some(text.as_str()), None),
        EmbeddingInput::Image(image) => (None, Some(image.as_str())),
    };
    let request = EmbeddingRequest {
        input_text,
        input_image,
        embedding_config: EmbeddingConfig { output_embedding_length: length },
    };
    Ok(serde_json::to_vec(&request)?)
}

/// 解析响应体，并检查向量长度
pub fn parse_response(body: &[u8], length: usize) -> Result<Embedding, EmbedError> {
    let response: EmbeddingResponse = serde_json::from_slice(body)?;
    let embedding = response.embedding.ok_or(EmbedError::MissingEmbedding)?;
    if embedding.len() != length {
        return Err(EmbedError::Dimension { expected: length, actual: embedding.len() });
    }
    Ok(embedding)
}

/// 向量化模型
pub trait Embedder {
    fn embed(
        &self,
        input: &EmbeddingInput,
    ) -> impl Future<Output = Result<Embedding, EmbedError>> + Send;
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn body_json(input: &EmbeddingInput) -> Value {
        serde_json::from_slice(&request_body(input, 1024).unwrap()).unwrap()
    }

    #[test]
    fn text_request_body() {
        let body = body_json(&EmbeddingInput::Text("shopping cart icon".into()));
        assert_eq!(
            body,
            json!({
                "inputText": "shopping cart icon",
                "embeddingConfig": { "outputEmbeddingLength": 1024 },
            })
        );
    }

    #[test]
    fn image_request_body_has_no_text() {
        let body = body_json(&EmbeddingInput::Image("aGVsbG8=".into()));
        assert_eq!(body["inputImage"], "aGVsbG8=");
        assert!(body.get("inputText").is_none());
        assert_eq!(body["embeddingConfig"]["outputEmbeddingLength"], 1024);
    }

    #[test]
    fn parse_embedding() {
        let body = json!({ "embedding": [0.5, -0.25, 1.0], "inputTextTokenCount": 3 });
        let embedding = parse_response(body.to_string().as_bytes(), 3).unwrap();
        assert_eq!(embedding, vec![0.5, -0.25, 1.0]);
    }

    #[test]
    fn parse_missing_embedding() {
        let body = json!({ "message": "throttled" });
        let err = parse_response(body.to_string().as_bytes(), 3).unwrap_err();
        assert!(matches!(err, EmbedError::MissingEmbedding));
    }

    #[test]
    fn parse_wrong_length() {
        let body = json!({ "embedding": [0.1, 0.2] });
        let err = parse_response(body.to_string().as_bytes(), 1024).unwrap_err();
        assert!(matches!(err, EmbedError::Dimension { expected: 1024, actual: 2 }));
    }

    #[test]
    fn parse_invalid_json() {
        let err = parse_response(b"not json", 1024).unwrap_err();
        assert!(matches!(err, EmbedError::Json(_)));
    }
}
