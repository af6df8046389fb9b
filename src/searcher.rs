use anyhow::Result;
use log::debug;

use crate::embed::{Embedder, EmbeddingInput};
use crate::store::{ImageDocument, SearchRequest, TypeFilter, VectorStore};

/// 一次用户查询
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// 查询文本
    pub text: String,
    /// 返回结果数量
    pub limit: usize,
    /// 类别过滤
    pub filter: TypeFilter,
}

impl QueryRequest {
    pub fn new(text: impl Into<String>, limit: usize, filter: TypeFilter) -> Self {
        Self { text: text.into(), limit, filter }
    }

    /// 查询文本为空，或者没有选择任何类别时，不进行查询
    pub fn is_noop(&self) -> bool {
        self.text.is_empty() || self.filter == TypeFilter::None
    }
}

/// 查询结果，`rank` 从 1 开始，越小越相似
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub rank: usize,
    pub document: ImageDocument,
}

/// 文本搜图：先向量化查询文本，再做向量搜索
pub struct Searcher<E, S> {
    embedder: E,
    store: S,
}

impl<E: Embedder, S: VectorStore> Searcher<E, S> {
    pub fn new(embedder: E, store: S) -> Self {
        Self { embedder, store }
    }

    pub async fn query(&self, request: &QueryRequest) -> Result<Vec<QueryResult>> {
        if request.is_noop() {
            debug!("跳过空查询: {:?}", request);
            return Ok(vec![]);
        }

        let vector = self.embedder.embed(&EmbeddingInput::Text(request.text.clone())).await?;
        let search = SearchRequest { vector, limit: request.limit, filter: request.filter };
        let documents = self.store.search(&search).await?;

        Ok(documents
            .into_iter()
            .enumerate()
            .map(|(i, document)| QueryResult { rank: i + 1, document })
            .collect())
    }
}
