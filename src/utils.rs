use std::io::{BufRead, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use indicatif::ProgressStyle;

/// 将图片字节编码为 base64 字符串
pub fn encode_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// 将 base64 字符串解码为图片字节
pub fn decode_image(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(data)
}

pub fn pb_style() -> ProgressStyle {
    ProgressStyle::with_template("[{elapsed_precise}] {wide_bar} {pos}/{len} {msg}")
        .expect("invalid progress style")
}

/// 读取一行输入，遇到 EOF 时返回 `None`
pub fn read_line(prompt: &str) -> anyhow::Result<Option<String>> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_owned()))
}
