//! 图片入库
//!
//! 扫描根目录下每个子目录中的图片，重新编码为 PNG 后向量化，
//! 攒够一批后批量写入向量存储。

use std::io::Cursor;
use std::mem;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use image::ImageFormat;
use indicatif::ProgressBar;
use log::info;
use regex::Regex;
use tokio::task::spawn_blocking;
use walkdir::WalkDir;

use crate::embed::{Embedder, EmbeddingInput};
use crate::store::{ImageDocument, ImageType, VectorStore};
use crate::utils;

/// 默认每批写入的文档数量
pub const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(1000).unwrap();

/// 每向量化多少张图片输出一次进度
const PROGRESS_INTERVAL: usize = 100;

// FIXME: 依赖文件命名约定来排除转换过的图片，比较脆弱
const EXCLUDED_MARKERS: [&str; 2] = ["verse", "verted"];

/// 文件名中包含排除标记的图片不入库，不论后缀名
pub fn is_excluded(file_name: &str) -> bool {
    EXCLUDED_MARKERS.iter().any(|marker| file_name.contains(marker))
}

/// 将逗号分隔的后缀名列表转换为正则表达式，匹配文件名结尾的 `.<后缀>`
pub fn suffix_regex(suffix: &str) -> Result<Regex> {
    let re = format!(r"\.({})$", suffix.replace(',', "|"));
    Ok(Regex::new(&re)?)
}

pub fn is_candidate(file_name: &str, re_suf: &Regex) -> bool {
    !is_excluded(file_name) && re_suf.is_match(file_name)
}

/// 扫描根目录下一级子目录中的图片文件
///
/// 根目录本身的文件和更深层级的文件都会被忽略
pub fn scan_directory(root: &Path, re_suf: &Regex) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("不是目录: {}", root.display());
    }
    info!("开始扫描目录: {}", root.display());

    let mut entries = vec![];
    let walker = WalkDir::new(root).follow_links(true).min_depth(2).max_depth(2);
    for entry in walker.sort_by_file_name() {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        if is_candidate(&entry.file_name().to_string_lossy(), re_suf) {
            entries.push(entry.into_path());
        }
    }

    info!("扫描完成，共 {} 张图片", entries.len());
    Ok(entries)
}

/// 读取图片并重新编码为 PNG，支持 PNG、JPEG 和 WebP 输入
pub fn encode_png(path: &Path) -> Result<Vec<u8>> {
    let img = image::open(path).with_context(|| format!("无法读取图片: {}", path.display()))?;
    let mut buffer = Cursor::new(vec![]);
    img.write_to(&mut buffer, ImageFormat::Png)
        .with_context(|| format!("无法编码图片: {}", path.display()))?;
    Ok(buffer.into_inner())
}

/// 待写入的文档缓冲区
pub struct DocumentBatch {
    documents: Vec<ImageDocument>,
    capacity: usize,
}

impl DocumentBatch {
    pub fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        Self { documents: Vec::with_capacity(capacity), capacity }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// 添加文档，数量恰好达到容量时返回整批文档
    pub fn push(&mut self, document: ImageDocument) -> Option<Vec<ImageDocument>> {
        self.documents.push(document);
        if self.documents.len() == self.capacity {
            Some(mem::replace(&mut self.documents, Vec::with_capacity(self.capacity)))
        } else {
            None
        }
    }

    /// 取出剩余的文档
    pub fn finish(self) -> Option<Vec<ImageDocument>> {
        if self.documents.is_empty() { None } else { Some(self.documents) }
    }
}

/// 入库统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    /// 扫描到的图片数量
    pub scanned: usize,
    /// 已向量化的图片数量
    pub embedded: usize,
    /// 写入批次数
    pub batches: usize,
}

pub struct Ingestor<E, S> {
    embedder: E,
    store: S,
    kind: ImageType,
    batch_size: NonZeroUsize,
    pb: ProgressBar,
}

impl<E: Embedder, S: VectorStore> Ingestor<E, S> {
    pub fn new(embedder: E, store: S, kind: ImageType) -> Self {
        Self { embedder, store, kind, batch_size: DEFAULT_BATCH_SIZE, pb: ProgressBar::hidden() }
    }

    pub fn batch_size(mut self, batch_size: NonZeroUsize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn progress(mut self, pb: ProgressBar) -> Self {
        self.pb = pb;
        self
    }

    /// 依次向量化所有图片并分批写入，任何错误都会中止整个流程
    pub async fn ingest(&self, files: &[PathBuf]) -> Result<IngestStats> {
        let mut stats = IngestStats { scanned: files.len(), ..Default::default() };
        let mut batch = DocumentBatch::new(self.batch_size);

        self.pb.set_length(files.len() as u64);

        for file in files {
            let document = self.load(file).await?;
            stats.embedded += 1;
            self.pb.inc(1);
            if stats.embedded % PROGRESS_INTERVAL == 0 {
                info!("已向量化 {}/{} 张图片", stats.embedded, stats.scanned);
            }

            if let Some(documents) = batch.push(document) {
                self.flush(&documents, &mut stats).await?;
            }
        }

        if let Some(documents) = batch.finish() {
            self.flush(&documents, &mut stats).await?;
        }

        Ok(stats)
    }

    async fn load(&self, file: &Path) -> Result<ImageDocument> {
        let path = file.to_path_buf();
        let bytes = spawn_blocking(move || encode_png(&path)).await??;
        let image = utils::encode_image(&bytes);

        let file_name =
            file.file_name().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        self.pb.set_message(file_name.clone());

        let embeddings = self
            .embedder
            .embed(&EmbeddingInput::Image(image.clone()))
            .await
            .with_context(|| format!("向量化失败: {}", file.display()))?;

        Ok(ImageDocument { image, kind: self.kind, file_name, embeddings })
    }

    async fn flush(&self, documents: &[ImageDocument], stats: &mut IngestStats) -> Result<()> {
        self.store.insert_many(documents).await?;
        stats.batches += 1;
        info!("已写入 {} 条记录", documents.len());
        Ok(())
    }
}
