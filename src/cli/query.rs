use std::io;

use anyhow::Result;
use clap::Parser;
use log::error;
use tokio::task::block_in_place;

use super::{open_searcher, print_result};
use crate::cli::{OutputFormat, SubCommandExtend};
use crate::config::Opts;
use crate::searcher::QueryRequest;
use crate::store::TypeFilter;
use crate::utils::read_line;

#[derive(Parser, Debug, Clone)]
pub struct QueryCommand {
    /// 返回的结果数量
    #[arg(short, long, value_name = "COUNT", default_value_t = 10,
          value_parser = clap::value_parser!(u32).range(5..=100))]
    pub limit: u32,
}

/// 交互输入的一行
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    ToggleIcon,
    ToggleIllustration,
    Limit(Option<usize>),
    Query(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    match line {
        ":quit" | ":q" => Input::Quit,
        ":icon" => Input::ToggleIcon,
        ":illustration" => Input::ToggleIllustration,
        _ => match line.strip_prefix(":limit") {
            Some(n) => Input::Limit(n.trim().parse().ok().filter(|n| (5..=100).contains(n))),
            None => Input::Query(line),
        },
    }
}

impl SubCommandExtend for QueryCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let searcher = open_searcher(opts).await?;

        let (mut icon, mut illustration) = (true, true);
        let mut limit = self.limit as usize;

        println!(":icon / :illustration 切换类别过滤");
        println!(":limit N 修改结果数量，:quit 退出");
        while let Some(line) = block_in_place(|| read_line("> "))? {
            match parse_input(&line) {
                Input::Quit => break,
                Input::ToggleIcon => icon = !icon,
                Input::ToggleIllustration => illustration = !illustration,
                Input::Limit(Some(n)) => limit = n,
                Input::Limit(None) => println!("结果数量需要在 5 到 100 之间"),
                Input::Query(text) => {
                    let filter = TypeFilter::from_selection(icon, illustration);
                    let request = QueryRequest::new(text, limit, filter);
                    if request.is_noop() {
                        println!("请输入查询内容并至少选择一个类别");
                        continue;
                    }
                    // 单次查询失败不影响后续查询
                    match searcher.query(&request).await {
                        Ok(results) => {
                            let mut out = io::stdout().lock();
                            print_result(&mut out, &results, &OutputFormat::Table)?
                        }
                        Err(e) => error!("查询失败: {e:#}"),
                    }
                    continue;
                }
            }
            println!("icon: {}, illustration: {}, limit: {}", icon, illustration, limit);
        }

        Ok(())
    }
}
