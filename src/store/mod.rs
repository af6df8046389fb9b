//! 向量存储
//!
//! 图片文档写入 Atlas 集合，
//! 查询时通过 `$vectorSearch` 聚合阶段做近似最近邻搜索。

mod mongo;

pub use mongo::*;

use std::fmt;

use clap::ValueEnum;
use mongodb::bson::{Document, doc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embed::Embedding;

/// 向量字段名
pub const VECTOR_PATH: &str = "embeddings";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("缺少 MongoDB 连接字符串，请设置 MONGODB_ATLAS_URI 或 --mongodb-uri")]
    MissingUri,
    #[error("数据库错误: {0}")]
    Database(#[from] mongodb::error::Error),
}

/// 图片类别
#[derive(Serialize, Deserialize, ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Icon,
    Illustration,
}

impl ImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Icon => "icon",
            Self::Illustration => "illustration",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 图片文档，入库后不再修改
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImageDocument {
    /// base64 编码的 PNG 图片
    pub image: String,
    /// 图片类别
    #[serde(rename = "type")]
    pub kind: ImageType,
    /// 文件名，用作展示标题，不保证唯一
    pub file_name: String,
    /// 图片向量
    pub embeddings: Embedding,
}

/// 类别过滤条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilter {
    Both,
    IconOnly,
    IllustrationOnly,
    None,
}

impl TypeFilter {
    pub fn from_selection(icon: bool, illustration: bool) -> Self {
        match (icon, illustration) {
            (true, true) => Self::Both,
            (true, false) => Self::IconOnly,
            (false, true) => Self::IllustrationOnly,
            (false, false) => Self::None,
        }
    }

    pub fn from_types(types: &[ImageType]) -> Self {
        Self::from_selection(
            types.contains(&ImageType::Icon),
            types.contains(&ImageType::Illustration),
        )
    }

    pub fn icon(&self) -> bool {
        matches!(self, Self::Both | Self::IconOnly)
    }

    pub fn illustration(&self) -> bool {
        matches!(self, Self::Both | Self::IllustrationOnly)
    }

    /// 构造过滤谓词，`None` 表示不限制类别
    pub fn predicate(&self) -> Option<Document> {
        match self {
            Self::Both => Some(doc! {
                "$or": [
                    { "type": ImageType::Icon.as_str() },
                    { "type": ImageType::Illustration.as_str() },
                ]
            }),
            Self::IconOnly => Some(doc! { "type": ImageType::Icon.as_str() }),
            Self::IllustrationOnly => Some(doc! { "type": ImageType::Illustration.as_str() }),
            Self::None => None,
        }
    }
}

/// 一次向量搜索
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub vector: Embedding,
    pub limit: usize,
    pub filter: TypeFilter,
}

impl SearchRequest {
    /// 构造 `$vectorSearch` 聚合管道
    ///
    /// NOTE: 候选数量与 limit 相同，不额外扩大候选池
    pub fn pipeline(&self, index: &str) -> Vec<Document> {
        let limit = self.limit as i64;
        let mut stage = doc! {
            "index": index,
            "path": VECTOR_PATH,
            "queryVector": self.vector.clone(),
            "numCandidates": limit,
            "limit": limit,
        };
        if let Some(filter) = self.filter.predicate() {
            stage.insert("filter", filter);
        }
        vec![doc! { "$vectorSearch": stage }]
    }
}

/// 向量存储后端
pub trait VectorStore {
    /// 按相似度降序返回至多 `limit` 个文档
    fn search(
        &self,
        request: &SearchRequest,
    ) -> impl Future<Output = Result<Vec<ImageDocument>, StoreError>> + Send;

    /// 批量写入文档
    fn insert_many(
        &self,
        documents: &[ImageDocument],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

#[cfg(test)]
mod tests {
    use mongodb::bson::Bson;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::both(true, true, TypeFilter::Both)]
    #[case::icon(true, false, TypeFilter::IconOnly)]
    #[case::illustration(false, true, TypeFilter::IllustrationOnly)]
    #[case::none(false, false, TypeFilter::None)]
    fn filter_from_selection(
        #[case] icon: bool,
        #[case] illustration: bool,
        #[case] expected: TypeFilter,
    ) {
        let filter = TypeFilter::from_selection(icon, illustration);
        assert_eq!(filter, expected);
        assert_eq!(filter.icon(), icon);
        assert_eq!(filter.illustration(), illustration);
    }

    #[test]
    fn filter_from_types() {
        assert_eq!(TypeFilter::from_types(&[]), TypeFilter::None);
        assert_eq!(TypeFilter::from_types(&[ImageType::Icon]), TypeFilter::IconOnly);
        assert_eq!(
            TypeFilter::from_types(&[ImageType::Illustration, ImageType::Icon]),
            TypeFilter::Both
        );
    }

    #[test]
    fn filter_predicates() {
        assert_eq!(
            TypeFilter::Both.predicate(),
            Some(doc! { "$or": [{ "type": "icon" }, { "type": "illustration" }] })
        );
        assert_eq!(TypeFilter::IconOnly.predicate(), Some(doc! { "type": "icon" }));
        assert_eq!(TypeFilter::IllustrationOnly.predicate(), Some(doc! { "type": "illustration" }));
        assert_eq!(TypeFilter::None.predicate(), None);
    }

    #[rstest]
    #[case(5)]
    #[case(10)]
    #[case(100)]
    fn pipeline_limits(#[case] limit: usize) {
        let request = SearchRequest { vector: vec![0.1; 4], limit, filter: TypeFilter::Both };
        let pipeline = request.pipeline("vector_index");
        assert_eq!(pipeline.len(), 1);

        let stage = pipeline[0].get_document("$vectorSearch").unwrap();
        assert_eq!(stage.get_i64("numCandidates").unwrap(), limit as i64);
        assert_eq!(stage.get_i64("limit").unwrap(), limit as i64);
        assert_eq!(stage.get_str("index").unwrap(), "vector_index");
        assert_eq!(stage.get_str("path").unwrap(), "embeddings");
        assert_eq!(stage.get_array("queryVector").unwrap().len(), 4);
    }

    #[test]
    fn pipeline_without_filter() {
        let request = SearchRequest { vector: vec![1.0], limit: 10, filter: TypeFilter::None };
        let pipeline = request.pipeline("vector_index");
        let stage = pipeline[0].get_document("$vectorSearch").unwrap();
        assert!(!stage.contains_key("filter"));
    }

    #[test]
    fn pipeline_with_icon_filter() {
        let request = SearchRequest { vector: vec![1.0], limit: 10, filter: TypeFilter::IconOnly };
        let pipeline = request.pipeline("vector_index");
        let stage = pipeline[0].get_document("$vectorSearch").unwrap();
        assert_eq!(stage.get("filter"), Some(&Bson::Document(doc! { "type": "icon" })));
    }

    #[test]
    fn document_field_names() {
        let document = ImageDocument {
            image: "aGVsbG8=".into(),
            kind: ImageType::Illustration,
            file_name: "cart.png".into(),
            embeddings: vec![0.5, 0.25],
        };
        let bson = mongodb::bson::to_document(&document).unwrap();
        assert_eq!(bson.get_str("type").unwrap(), "illustration");
        assert_eq!(bson.get_str("file_name").unwrap(), "cart.png");
        assert_eq!(bson.get_array("embeddings").unwrap().len(), 2);
        assert!(!bson.contains_key("kind"));
    }
}
