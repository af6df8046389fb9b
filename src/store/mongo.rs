use std::time::Instant;

use futures::TryStreamExt;
use log::{debug, info};
use mongodb::{Client, Collection};

use super::*;
use crate::config::MongoOptions;
use crate::metrics;

/// MongoDB Atlas 向量存储
pub struct MongoStore {
    collection: Collection<ImageDocument>,
    index: String,
}

impl MongoStore {
    /// 建立连接，整个进程只需要创建一次
    pub async fn connect(opts: &MongoOptions) -> Result<Self, StoreError> {
        let uri = opts.mongodb_uri.as_deref().ok_or(StoreError::MissingUri)?;
        info!("初始化数据库连接: {}.{}", opts.database, opts.collection);

        let client = Client::with_uri_str(uri).await?;
        let collection = client.database(&opts.database).collection(&opts.collection);

        Ok(Self { collection, index: opts.index.clone() })
    }
}

impl VectorStore for MongoStore {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<ImageDocument>, StoreError> {
        let pipeline = request.pipeline(&self.index);
        debug!("向量搜索: limit={}, filter={:?}", request.limit, request.filter);

        let start = Instant::now();
        let cursor = self.collection.aggregate(pipeline).with_type::<ImageDocument>().await?;
        let documents: Vec<ImageDocument> = cursor.try_collect().await?;
        metrics::observe_search(start.elapsed().as_secs_f64(), documents.len());

        Ok(documents)
    }

    async fn insert_many(&self, documents: &[ImageDocument]) -> Result<(), StoreError> {
        self.collection.insert_many(documents).await?;
        metrics::inc_inserted(documents.len());
        Ok(())
    }
}
