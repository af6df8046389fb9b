use clap::Parser;

use semanticon::Opts;
use semanticon::cli::SubCommandExtend;
use semanticon::config::SubCommand;

#[tokio::main]
async fn main() {
    env_logger::init();

    let opts = Opts::parse();

    let result = match &opts.subcmd {
        SubCommand::Ingest(config) => config.run(&opts).await,
        SubCommand::Search(config) => config.run(&opts).await,
        SubCommand::Query(config) => config.run(&opts).await,
    };

    if let Err(e) = result {
        eprintln!("错误: {e:#}");
        std::process::exit(1);
    }
}
