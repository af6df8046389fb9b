use clap::{Args, Parser, Subcommand};

use crate::cli::*;
use crate::embed::DEFAULT_EMBEDDING_LENGTH;

#[derive(Args, Debug, Clone)]
pub struct BedrockOptions {
    /// Bedrock 服务所在区域
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,
    /// 多模态向量化模型
    #[arg(long, env = "BEDROCK_MODEL_ID", default_value = "amazon.titan-embed-image-v1")]
    pub model_id: String,
    /// 输出向量长度
    #[arg(long, value_name = "N", default_value_t = DEFAULT_EMBEDDING_LENGTH)]
    pub embedding_length: usize,
    /// AWS access key，不填则使用默认凭证链
    #[arg(long, env = "AWS_ACCESS_KEY", hide_env_values = true)]
    pub aws_access_key: Option<String>,
    /// AWS secret key
    #[arg(long, env = "AWS_SECRET_KEY", hide_env_values = true)]
    pub aws_secret_key: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct MongoOptions {
    /// MongoDB Atlas 连接字符串
    #[arg(long, value_name = "URI", env = "MONGODB_ATLAS_URI", hide_env_values = true)]
    pub mongodb_uri: Option<String>,
    /// 数据库名
    #[arg(long, default_value = "mdb_icons")]
    pub database: String,
    /// 集合名
    #[arg(long, default_value = "icons")]
    pub collection: String,
    /// 向量索引名
    #[arg(long, default_value = "vector_index")]
    pub index: String,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "semanticon", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    #[command(flatten)]
    pub bedrock: BedrockOptions,
    #[command(flatten)]
    pub mongo: MongoOptions,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 向量化目录中的图片并写入数据库
    Ingest(IngestCommand),
    /// 使用文本搜索图片
    Search(SearchCommand),
    /// 交互式搜索
    Query(QueryCommand),
}
