use std::time::Instant;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::config::Credentials;
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::primitives::Blob;
use log::{debug, info};

use super::*;
use crate::config::BedrockOptions;
use crate::metrics;

/// 基于 Bedrock 的多模态向量化客户端
pub struct BedrockEmbedder {
    client: Client,
    model_id: String,
    length: usize,
}

impl BedrockEmbedder {
    /// 创建客户端，整个进程只需要创建一次
    pub async fn connect(opts: &BedrockOptions) -> Self {
        info!("初始化 Bedrock 客户端: {} @ {}", opts.model_id, opts.region);

        let region = Region::new(opts.region.clone());
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);
        // 未设置密钥时使用 SDK 默认的凭证链
        if let (Some(key), Some(secret)) = (&opts.aws_access_key, &opts.aws_secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                key.clone(),
                secret.clone(),
                None,
                None,
                "semanticon",
            ));
        }
        let config = loader.load().await;

        Self {
            client: Client::new(&config),
            model_id: opts.model_id.clone(),
            length: opts.embedding_length,
        }
    }
}

impl Embedder for BedrockEmbedder {
    async fn embed(&self, input: &EmbeddingInput) -> Result<Embedding, EmbedError> {
        let body = request_body(input, self.length)?;
        debug!("请求向量化: {}, {} 字节", input.modality(), body.len());

        let start = Instant::now();
        let output = self
            .client
            .invoke_model()
            .model_id(&self.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|e| EmbedError::Service(DisplayErrorContext(e).to_string()))?;
        metrics::observe_embed(input.modality(), start.elapsed().as_secs_f64());

        parse_response(output.body().as_ref(), self.length)
    }
}
