use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::ProgressBar;
use log::info;

use super::connect;
use crate::cli::SubCommandExtend;
use crate::config::Opts;
use crate::ingest::{DEFAULT_BATCH_SIZE, Ingestor, scan_directory, suffix_regex};
use crate::metrics;
use crate::store::ImageType;
use crate::utils::pb_style;

#[derive(Parser, Debug, Clone)]
pub struct IngestCommand {
    /// 图片根目录，只扫描其下一级子目录中的文件
    pub path: PathBuf,
    /// 扫描的文件后缀名，多个后缀用逗号分隔，支持 png、jpg/jpeg 和 webp
    #[arg(short, long, default_value = "png")]
    pub suffix: String,
    /// 本次入库图片的类别
    #[arg(short = 't', long = "type", value_enum, default_value_t = ImageType::Illustration)]
    pub kind: ImageType,
    /// 多少条记录为一个写入批次
    #[arg(short, long, value_name = "SIZE", default_value_t = DEFAULT_BATCH_SIZE.get() as u32,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub batch_size: u32,
    /// 入库完成后推送指标的 pushgateway 地址
    #[arg(long, value_name = "URL")]
    pub prometheus_push: Option<String>,
    /// 自定义 instance 标签值
    #[arg(long, value_name = "NAME", default_value = "ingest")]
    pub prometheus_instance: String,
}

impl SubCommandExtend for IngestCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let batch_size =
            NonZeroUsize::new(self.batch_size as usize).context("批次大小必须大于 0")?;
        let re_suf = suffix_regex(&self.suffix)?;
        let files = scan_directory(&self.path, &re_suf)?;
        if files.is_empty() {
            info!("没有需要入库的图片");
            return Ok(());
        }

        let (embedder, store) = connect(opts).await?;

        let pb = ProgressBar::new(files.len() as u64).with_style(pb_style());
        let ingestor = Ingestor::new(embedder, store, self.kind)
            .batch_size(batch_size)
            .progress(pb.clone());
        let stats = ingestor.ingest(&files).await?;

        pb.finish_with_message("图片入库完成");
        info!("共入库 {} 张图片，{} 个批次", stats.embedded, stats.batches);

        if let Some(url) = self.prometheus_push.clone() {
            metrics::push(url, self.prometheus_instance.clone()).await;
        }

        Ok(())
    }
}
