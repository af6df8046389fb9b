mod ingest;
mod query;
mod search;

pub use ingest::*;
pub use query::*;
pub use search::*;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use crate::config::Opts;
use crate::embed::BedrockEmbedder;
use crate::searcher::{QueryResult, Searcher};
use crate::store::MongoStore;
use crate::utils;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;
}

/// 连接向量化服务和数据库
async fn connect(opts: &Opts) -> Result<(BedrockEmbedder, MongoStore)> {
    let store = MongoStore::connect(&opts.mongo).await?;
    let embedder = BedrockEmbedder::connect(&opts.bedrock).await;
    Ok((embedder, store))
}

async fn open_searcher(opts: &Opts) -> Result<Searcher<BedrockEmbedder, MongoStore>> {
    let (embedder, store) = connect(opts).await?;
    Ok(Searcher::new(embedder, store))
}

/// 输出查询结果，表格格式会先给出结果数量
fn print_result(
    out: &mut impl Write,
    results: &[QueryResult],
    format: &OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let rows = results
                .iter()
                .map(|r| {
                    json!({
                        "rank": r.rank,
                        "type": r.document.kind,
                        "file_name": r.document.file_name,
                    })
                })
                .collect::<Vec<_>>();
            writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?;
        }
        OutputFormat::Table => {
            if results.is_empty() {
                writeln!(out, "没有找到结果")?;
                return Ok(());
            }
            writeln!(out, "共找到 {} 个结果", results.len())?;
            for r in results {
                writeln!(out, "{}\t{}\t{}", r.rank, r.document.kind, r.document.file_name)?;
            }
        }
    }
    Ok(())
}

/// 将结果中的图片解码后保存到目录，文件名为 `<rank>_<file_name>`
fn save_images(results: &[QueryResult], dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    for r in results {
        let bytes = utils::decode_image(&r.document.image)
            .with_context(|| format!("无法解码图片: {}", r.document.file_name))?;
        let path = dir.join(format!("{}_{}", r.rank, r.document.file_name));
        std::fs::write(&path, bytes)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::store::{ImageDocument, ImageType};

    fn result(rank: usize, kind: ImageType, file_name: &str, image: &[u8]) -> QueryResult {
        QueryResult {
            rank,
            document: ImageDocument {
                image: utils::encode_image(image),
                kind,
                file_name: file_name.into(),
                embeddings: vec![],
            },
        }
    }

    fn render(results: &[QueryResult], format: &OutputFormat) -> String {
        let mut out = vec![];
        print_result(&mut out, results, format).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn print_empty_table() {
        assert_eq!(render(&[], &OutputFormat::Table), "没有找到结果\n");
    }

    #[test]
    fn print_table_with_count() {
        let results = [
            result(1, ImageType::Icon, "cart.png", b"a"),
            result(2, ImageType::Illustration, "basket.png", b"b"),
        ];
        assert_eq!(
            render(&results, &OutputFormat::Table),
            "共找到 2 个结果\n1\ticon\tcart.png\n2\tillustration\tbasket.png\n"
        );
    }

    #[test]
    fn print_json_rows() {
        let results = [result(1, ImageType::Icon, "cart.png", b"a")];
        let rows: serde_json::Value =
            serde_json::from_str(&render(&results, &OutputFormat::Json)).unwrap();
        assert_eq!(rows, json!([{ "rank": 1, "type": "icon", "file_name": "cart.png" }]));
        assert_eq!(render(&[], &OutputFormat::Json).trim(), "[]");
    }

    #[test]
    fn save_images_by_rank() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out");
        let results = [
            result(1, ImageType::Icon, "cart.png", b"\x89PNG first"),
            result(2, ImageType::Icon, "cart.png", b"\x89PNG second"),
        ];

        save_images(&results, &target).unwrap();
        assert_eq!(fs::read(target.join("1_cart.png")).unwrap(), b"\x89PNG first");
        assert_eq!(fs::read(target.join("2_cart.png")).unwrap(), b"\x89PNG second");
    }

    #[test]
    fn save_images_rejects_bad_payload() {
        let dir = TempDir::new().unwrap();
        let mut bad = result(1, ImageType::Icon, "cart.png", b"");
        bad.document.image = "not base64!".into();
        assert!(save_images(&[bad], dir.path()).is_err());
    }
}
