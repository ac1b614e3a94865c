//! XML解码器
//!
//! 基于 `quick-xml` 的命名空间感知解析，生成 [`Node`] 树。解析对真实世界中
//! 常见的结构瑕疵（结束标签不匹配、多余的结束标签、未知实体）保持宽容，
//! 但只接受UTF-8与US-ASCII编码。

use crate::epub::error::{EpubError, Result};
use crate::epub::tree::{Attributes, Node};
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// 将XML字节流解析为文档树
///
/// # 参数
/// * `content` - XML文件内容
/// * `max_depth` - 允许的最大元素嵌套深度
///
/// # 返回值
/// * `Result<Node>` - 文档的根元素
pub fn parse_xml(content: &[u8], max_depth: usize) -> Result<Node> {
    let content = strip_bom(content)?;

    let mut reader = NsReader::from_reader(content);
    let config = reader.config_mut();
    config.trim_text(true);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut buf = Vec::new();
    let mut stack: Vec<Node> = Vec::new();

    loop {
        buf.clear();
        let position = reader.buffer_position();
        let (resolved, event) = match reader.read_resolved_event_into(&mut buf) {
            Ok(pair) => pair,
            Err(err) => {
                return Err(EpubError::StructuralParse(format!(
                    "第{}字节之后: {}",
                    position, err
                )));
            }
        };

        match event {
            Event::Decl(ref decl) => {
                if let Some(encoding) = decl.encoding() {
                    let encoding = encoding?;
                    check_charset(&String::from_utf8_lossy(&encoding))?;
                }
            }
            Event::Start(ref e) => {
                if stack.len() >= max_depth {
                    return Err(EpubError::TooDeeplyNested { limit: max_depth });
                }
                let namespace = namespace_of(&resolved)?;
                stack.push(element_from(e, namespace)?);
            }
            Event::Empty(ref e) => {
                if stack.len() >= max_depth {
                    return Err(EpubError::TooDeeplyNested { limit: max_depth });
                }
                let namespace = namespace_of(&resolved)?;
                let node = element_from(e, namespace)?;
                match stack.last_mut() {
                    Some(parent) => parent.push_child(node),
                    None => return Ok(node),
                }
            }
            Event::End(ref e) => {
                let name = decode_utf8(e.local_name().as_ref())?;
                // 找不到对应开始标签的结束标签直接忽略，中间未闭合的元素被隐式闭合
                if let Some(index) = stack
                    .iter()
                    .rposition(|node| node.name().eq_ignore_ascii_case(&name))
                {
                    while stack.len() > index + 1 {
                        close_top(&mut stack);
                    }
                    if let Some(root) = close_top(&mut stack) {
                        return Ok(root);
                    }
                }
            }
            Event::Text(ref e) => {
                let text = unescape_lenient(&decode_utf8(e)?);
                push_text(&mut stack, &text);
            }
            Event::CData(e) => {
                let text = decode_utf8(&e.into_inner())?;
                push_text(&mut stack, &text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    // 文件结束时仍有未闭合的元素，按嵌套关系依次闭合
    while stack.len() > 1 {
        close_top(&mut stack);
    }
    stack
        .pop()
        .ok_or_else(|| EpubError::StructuralParse("文档中没有根元素".to_string()))
}

/// 闭合栈顶元素；栈顶是根元素时返回它
fn close_top(stack: &mut Vec<Node>) -> Option<Node> {
    let node = stack.pop()?;
    match stack.last_mut() {
        Some(parent) => {
            parent.push_child(node);
            None
        }
        None => Some(node),
    }
}

fn strip_bom(content: &[u8]) -> Result<&[u8]> {
    if let Some(rest) = content.strip_prefix(UTF8_BOM) {
        return Ok(rest);
    }
    if content.starts_with(&[0xFE, 0xFF]) || content.starts_with(&[0xFF, 0xFE]) {
        return Err(EpubError::UnsupportedCharset("UTF-16".to_string()));
    }
    Ok(content)
}

/// 只接受UTF-8与US-ASCII
fn check_charset(encoding: &str) -> Result<()> {
    let normalized = encoding.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "" | "utf-8" | "us-ascii" => Ok(()),
        _ => Err(EpubError::UnsupportedCharset(encoding.trim().to_string())),
    }
}

fn namespace_of(resolved: &ResolveResult) -> Result<String> {
    match resolved {
        ResolveResult::Bound(ns) => decode_utf8(ns.as_ref()),
        ResolveResult::Unbound => Ok(String::new()),
        // 未声明的前缀按字面保留
        ResolveResult::Unknown(prefix) => decode_utf8(prefix),
    }
}

fn element_from(e: &BytesStart, namespace: String) -> Result<Node> {
    let name = decode_utf8(e.local_name().as_ref())?;

    let mut attrs = Attributes::new();
    for attr_result in e.attributes().with_checks(false) {
        let attr = attr_result?;
        let is_xmlns = attr.key.as_ref() == b"xmlns"
            || attr.key.prefix().is_some_and(|p| p.as_ref() == b"xmlns");
        if is_xmlns {
            continue;
        }
        let key = decode_utf8(attr.key.local_name().as_ref())?;
        let value = unescape_lenient(&decode_utf8(&attr.value)?);
        attrs.insert(key, value);
    }

    Ok(Node::element(name, namespace, attrs))
}

/// 逐个解码实体引用
///
/// 预定义实体与字符引用被替换；未知实体（如XHTML中的`&nbsp;`）按原文保留，
/// 不影响同一段文本中其他实体的解码。
fn unescape_lenient(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let reference = tail[1..]
            .find(|c: char| c == ';' || c == '&' || c.is_whitespace())
            .filter(|&end| tail[1 + end..].starts_with(';'))
            .map(|end| &tail[1..1 + end]);
        match reference {
            Some(name) => {
                match resolve_entity(name) {
                    Some(resolved) => out.push_str(&resolved),
                    None => out.push_str(&tail[..name.len() + 2]),
                }
                rest = &tail[name.len() + 2..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve_entity(name: &str) -> Option<String> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        return char::from_u32(code).filter(|&c| c != '\0').map(String::from);
    }
    resolve_predefined_entity(name).map(str::to_string)
}

fn push_text(stack: &mut [Node], text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if let Some(parent) = stack.last_mut() {
        parent.push_child(Node::text_node(text));
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| EpubError::StructuralParse(format!("无效的UTF-8字节序列: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::config::DEFAULT_MAX_DEPTH;

    fn parse(xml: &str) -> Result<Node> {
        parse_xml(xml.as_bytes(), DEFAULT_MAX_DEPTH)
    }

    #[test]
    fn test_parse_namespaces() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
        <dc:title id="t">Test Book</dc:title>
        <meta property="dcterms:modified">2024-01-01</meta>
    </metadata>
</package>"#;
        let root = parse(xml).unwrap();
        assert_eq!(root.name(), "package");
        assert_eq!(root.namespace(), "http://www.idpf.org/2007/opf");
        assert_eq!(root.attr("version"), Some("3.0"));
        assert!(root.attr("xmlns").is_none());

        let title = root.find("title").unwrap();
        assert_eq!(title.namespace(), "http://purl.org/dc/elements/1.1/");
        assert_eq!(title.text(), "Test Book");

        let meta = root.find("meta").unwrap();
        assert_eq!(meta.namespace(), "http://www.idpf.org/2007/opf");
    }

    #[test]
    fn test_prefixed_attribute_uses_local_name() {
        let xml = r#"<html xmlns:epub="http://www.idpf.org/2007/ops"><nav epub:type="toc"/></html>"#;
        let root = parse(xml).unwrap();
        assert_eq!(root.find("nav").unwrap().attr("type"), Some("toc"));
    }

    #[test]
    fn test_unsupported_charset() {
        let xml = r#"<?xml version="1.0" encoding="ISO-8859-1"?><a/>"#;
        assert!(matches!(parse(xml), Err(EpubError::UnsupportedCharset(ref c)) if c == "ISO-8859-1"));

        let ascii = r#"<?xml version="1.0" encoding="US-ASCII"?><a>x</a>"#;
        assert_eq!(parse(ascii).unwrap().text(), "x");
    }

    #[test]
    fn test_invalid_utf8_is_structural_error() {
        let bytes = b"<a>\xff\xfe\xfd</a>";
        assert!(matches!(
            parse_xml(bytes, DEFAULT_MAX_DEPTH),
            Err(EpubError::StructuralParse(_))
        ));
    }

    #[test]
    fn test_empty_document_is_structural_error() {
        assert!(matches!(parse("   "), Err(EpubError::StructuralParse(_))));
    }

    #[test]
    fn test_tolerates_stray_end_tags() {
        let root = parse("<a><b>one</c><d>two</d></a>").unwrap();
        assert_eq!(root.name(), "a");
        assert_eq!(root.text(), "one two");
        let b = root.find("b").unwrap();
        assert!(b.child("d").is_some());
    }

    #[test]
    fn test_end_tag_closes_open_descendants() {
        let root = parse("<a><b><c>one</b><d>two</d></a>").unwrap();
        assert_eq!(root.child_elements().count(), 2);
        assert!(root.find("b").unwrap().child("c").is_some());
    }

    #[test]
    fn test_unclosed_tags_are_closed_at_eof() {
        let root = parse("<a><b>one</b><d>two").unwrap();
        assert_eq!(root.name(), "a");
        assert_eq!(root.text(), "one two");
    }

    #[test]
    fn test_unknown_entity_is_kept_verbatim() {
        let root = parse("<p>Q&amp;A&nbsp;Section</p>").unwrap();
        assert_eq!(root.text(), "Q&A&nbsp;Section");

        let known = parse("<p>b &amp; c &#65;&#x42; &lt;x&gt;</p>").unwrap();
        assert_eq!(known.text(), "b & c AB <x>");
    }

    #[test]
    fn test_attribute_entities_decode_around_unknown_ones() {
        let root = parse(r#"<a href="a.xhtml?x=1&amp;y=&nbsp;" title="&quot;t&quot;"/>"#).unwrap();
        assert_eq!(root.attr("href"), Some("a.xhtml?x=1&y=&nbsp;"));
        assert_eq!(root.attr("title"), Some("\"t\""));
    }

    #[test]
    fn test_bare_ampersand_is_kept() {
        assert_eq!(unescape_lenient("fish & chips &amp"), "fish & chips &amp");
        assert_eq!(unescape_lenient("&#xZZ; &#1114112;"), "&#xZZ; &#1114112;");
    }

    #[test]
    fn test_whitespace_text_is_dropped() {
        let root = parse("<a>\n   <b/>\n  </a>").unwrap();
        assert_eq!(root.children().len(), 1);
        assert!(root.children()[0].is_named("b"));
    }

    #[test]
    fn test_cdata_becomes_text() {
        let root = parse("<a><![CDATA[ raw <text> ]]></a>").unwrap();
        assert_eq!(root.text(), "raw <text>");
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}{}", "<a>".repeat(10), "</a>".repeat(10));
        assert!(parse_xml(deep.as_bytes(), 10).is_ok());
        assert!(matches!(
            parse_xml(deep.as_bytes(), 9),
            Err(EpubError::TooDeeplyNested { limit: 9 })
        ));
    }
}
