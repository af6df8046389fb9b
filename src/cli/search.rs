use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use super::{open_searcher, print_result, save_images};
use crate::cli::SubCommandExtend;
use crate::config::Opts;
use crate::searcher::QueryRequest;
use crate::store::{ImageType, TypeFilter};

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    /// 查询文本
    pub text: String,
    /// 返回的结果数量
    #[arg(short, long, value_name = "COUNT", default_value_t = 10,
          value_parser = clap::value_parser!(u32).range(5..=100))]
    pub limit: u32,
    /// 只搜索指定类别，可以重复指定，默认搜索全部类别
    #[arg(short = 't', long = "type", value_enum, value_delimiter = ',',
          default_values_t = [ImageType::Icon, ImageType::Illustration])]
    pub types: Vec<ImageType>,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
    /// 将结果图片保存到该目录
    #[arg(long, value_name = "DIR")]
    pub save_dir: Option<PathBuf>,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let filter = TypeFilter::from_types(&self.types);
        let request = QueryRequest::new(self.text.clone(), self.limit as usize, filter);
        if request.is_noop() {
            println!("请输入查询内容");
            return Ok(());
        }

        let searcher = open_searcher(opts).await?;
        let results = searcher.query(&request).await?;

        print_result(&mut std::io::stdout().lock(), &results, &self.output_format)?;
        if let Some(dir) = &self.save_dir {
            save_images(&results, dir)?;
        }
        Ok(())
    }
}

#[derive(ValueEnum, Debug, Clone)]
pub enum OutputFormat {
    Json,
    Table,
}
