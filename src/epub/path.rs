//! 压缩包内路径处理
//!
//! EPUB内部的路径总是使用 `/` 分隔，与操作系统无关，因此这里不使用 `std::path`。

use percent_encoding::percent_decode_str;

/// 折叠路径中的 `.` 与 `..`，并去掉多余的分隔符
///
/// 结果为空时返回空字符串（而不是 `.`），便于直接作为压缩包条目名使用。
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if rooted { format!("/{}", joined) } else { joined }
}

/// 返回路径所在的目录，位于根目录时返回空字符串
pub fn dir(path: &str) -> String {
    let cleaned = clean(path);
    match cleaned.rfind('/') {
        Some(0) => "/".to_string(),
        Some(index) => cleaned[..index].to_string(),
        None => String::new(),
    }
}

/// 将相对引用解析为压缩包内的规范路径
///
/// `href` 先做百分号解码，再拼接到 `base_dir` 上。以 `/` 开头的引用视为
/// 相对于压缩包根目录。
pub fn resolve(base_dir: &str, href: &str) -> String {
    let decoded = percent_decode_str(href.trim()).decode_utf8_lossy();
    if let Some(absolute) = decoded.strip_prefix('/') {
        return clean(absolute);
    }
    if base_dir.is_empty() {
        clean(&decoded)
    } else {
        clean(&format!("{}/{}", base_dir, decoded))
    }
}

/// 判断引用是否带有URI协议（如 `https:`、`data:`），这类引用不指向包内文件
pub fn has_scheme(href: &str) -> bool {
    let Some((scheme, _)) = href.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
