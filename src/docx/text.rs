//! 段落内文字的读取和替换
//!
//! 段落文字分散在多个 w:r/w:t 中。这里按路径（子节点下标列表）
//! 定位段落自身的 w:t，不进入嵌套段落（文本框内的段落单独处理）。

use super::xml::{XmlElement, XmlNode};
use crate::config::FontStyle;

/// 不向下查找 w:t 的元素
const NESTED_BOUNDARIES: [&str; 3] = ["w:p", "w:txbxContent", "w:tbl"];

/// rPr 子元素的顺序（CT_RPr）
const RPR_ORDER: [&str; 40] = [
    "w:rStyle", "w:rFonts", "w:b", "w:bCs", "w:i", "w:iCs", "w:caps", "w:smallCaps", "w:strike",
    "w:dstrike", "w:outline", "w:shadow", "w:emboss", "w:imprint", "w:noProof", "w:snapToGrid",
    "w:vanish", "w:webHidden", "w:color", "w:spacing", "w:w", "w:kern", "w:position", "w:sz",
    "w:szCs", "w:highlight", "w:u", "w:effect", "w:bdr", "w:shd", "w:fitText", "w:vertAlign",
    "w:rtl", "w:cs", "w:em", "w:lang", "w:eastAsianLayout", "w:specVanish", "w:oMath",
    "w:rPrChange",
];

type NodePath = Vec<usize>;

/// 段落自身的 w:t 路径（文档顺序）
pub fn text_paths(paragraph: &XmlElement) -> Vec<NodePath> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    collect_text_paths(paragraph, &mut path, &mut out);
    out
}

fn collect_text_paths(element: &XmlElement, path: &mut NodePath, out: &mut Vec<NodePath>) {
    for (i, child) in element.children.iter().enumerate() {
        let XmlNode::Element(e) = child else { continue };
        path.push(i);
        if e.name == "w:t" {
            out.push(path.clone());
        } else if !NESTED_BOUNDARIES.contains(&e.name.as_str()) {
            collect_text_paths(e, path, out);
        }
        path.pop();
    }
}

pub fn element_at_path<'a>(root: &'a XmlElement, path: &[usize]) -> Option<&'a XmlElement> {
    path.iter().try_fold(root, |e, &i| e.element_at(i))
}

pub fn element_at_path_mut<'a>(root: &'a mut XmlElement, path: &[usize]) -> Option<&'a mut XmlElement> {
    let mut current = root;
    for &i in path {
        current = current.element_at_mut(i)?;
    }
    Some(current)
}

/// 段落文字
pub fn paragraph_text(paragraph: &XmlElement) -> String {
    text_paths(paragraph)
        .iter()
        .filter_map(|p| element_at_path(paragraph, p))
        .map(XmlElement::text)
        .collect()
}

/// w:t 写入文字，首尾有空白时加 xml:space
pub fn set_t_text(t: &mut XmlElement, text: &str) {
    t.set_text(text);
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        t.set_attr("xml:space", "preserve");
    }
}

/// 替换段落中的占位符，返回替换次数
///
/// 先在每个 w:t 内替换；跨 run 的占位符把整段文字合并到第一个 w:t 后再替换。
/// 发生替换的 run 应用 `font`。
pub fn replace_in_paragraph(
    paragraph: &mut XmlElement,
    replacements: &[(String, String)],
    font: Option<&FontStyle>,
) -> usize {
    let paths = text_paths(paragraph);
    if paths.is_empty() {
        return 0;
    }

    let mut count = 0;
    let mut touched_runs: Vec<NodePath> = Vec::new();

    for path in &paths {
        let Some(t) = element_at_path_mut(paragraph, path) else { continue };
        let original = t.text();
        let (replaced, n) = replace_all(&original, replacements);
        if n > 0 {
            set_t_text(t, &replaced);
            count += n;
            touched_runs.push(path[..path.len() - 1].to_vec());
        }
    }

    let texts: Vec<String> = paths
        .iter()
        .filter_map(|p| element_at_path(paragraph, p))
        .map(XmlElement::text)
        .collect();
    let combined: String = texts.concat();
    // 只处理跨 run 的占位符
    let spanning: Vec<(String, String)> = replacements
        .iter()
        .filter(|(token, _)| {
            !token.is_empty()
                && combined.matches(token.as_str()).count()
                    > texts.iter().map(|t| t.matches(token.as_str()).count()).sum::<usize>()
        })
        .cloned()
        .collect();
    let (replaced, n) = replace_all(&combined, &spanning);
    if n > 0 {
        for (i, path) in paths.iter().enumerate() {
            if let Some(t) = element_at_path_mut(paragraph, path) {
                set_t_text(t, if i == 0 { &replaced } else { "" });
            }
        }
        count += n;
        touched_runs.push(paths[0][..paths[0].len() - 1].to_vec());
    }

    if let Some(font) = font {
        for run_path in touched_runs {
            if let Some(run) = element_at_path_mut(paragraph, &run_path) {
                if run.name == "w:r" {
                    apply_font(run, font);
                }
            }
        }
    }

    count
}

fn replace_all(text: &str, replacements: &[(String, String)]) -> (String, usize) {
    let mut out = text.to_string();
    let mut count = 0;
    for (token, value) in replacements {
        if token.is_empty() {
            continue;
        }
        let hits = out.matches(token.as_str()).count();
        if hits > 0 {
            out = out.replace(token.as_str(), value);
            count += hits;
        }
    }
    (out, count)
}

/// 段落文字整体替换为 `text`（保留第一个 run 的格式）
pub fn set_paragraph_text(paragraph: &mut XmlElement, text: &str, font: Option<&FontStyle>) {
    let paths = text_paths(paragraph);
    if paths.is_empty() {
        let mut run = XmlElement::new("w:r");
        let mut t = XmlElement::new("w:t");
        set_t_text(&mut t, text);
        run.children.push(XmlNode::Element(t));
        if let Some(font) = font {
            apply_font(&mut run, font);
        }
        paragraph.children.push(XmlNode::Element(run));
        return;
    }

    for (i, path) in paths.iter().enumerate() {
        if let Some(t) = element_at_path_mut(paragraph, path) {
            set_t_text(t, if i == 0 { text } else { "" });
        }
    }
    if let Some(font) = font {
        let run_path = &paths[0][..paths[0].len() - 1];
        if let Some(run) = element_at_path_mut(paragraph, run_path) {
            if run.name == "w:r" {
                apply_font(run, font);
            }
        }
    }
}

/// 段落中第 `byte_offset` 字节处的字符替换为 `glyph`
///
/// 偏移基于 `paragraph_text` 的结果。
pub fn replace_char_at(paragraph: &mut XmlElement, byte_offset: usize, glyph: char) -> bool {
    let mut start = 0;
    for path in text_paths(paragraph) {
        let Some(t) = element_at_path_mut(paragraph, &path) else { continue };
        let text = t.text();
        let end = start + text.len();
        if byte_offset >= start && byte_offset < end {
            let local = byte_offset - start;
            let Some(old) = text.get(local..).and_then(|s| s.chars().next()) else {
                return false;
            };
            let mut updated = String::with_capacity(text.len());
            updated.push_str(&text[..local]);
            updated.push(glyph);
            updated.push_str(&text[local + old.len_utf8()..]);
            set_t_text(t, &updated);
            return true;
        }
        start = end;
    }
    false
}

/// run 的字体设置（中西文字体、字号、加粗）
pub fn apply_font(run: &mut XmlElement, font: &FontStyle) {
    let rpr = run.ensure_child("w:rPr", 0);

    let fonts = ensure_ordered(rpr, "w:rFonts");
    fonts.set_attr("w:ascii", &font.name);
    fonts.set_attr("w:hAnsi", &font.name);
    fonts.set_attr("w:eastAsia", &font.name);

    if font.bold {
        ensure_ordered(rpr, "w:b");
    }

    let half_points = font.half_points().to_string();
    ensure_ordered(rpr, "w:sz").set_attr("w:val", &half_points);
    ensure_ordered(rpr, "w:szCs").set_attr("w:val", &half_points);
}

/// rPr 中按元素顺序插入（已存在则返回现有的）
fn ensure_ordered<'a>(rpr: &'a mut XmlElement, name: &str) -> &'a mut XmlElement {
    let rank = |n: &str| RPR_ORDER.iter().position(|o| *o == n);
    let target = rank(name).unwrap_or(RPR_ORDER.len());

    // 排在后面的第一个元素之前；未知元素视为排在最后
    let position = rpr
        .children
        .iter()
        .position(|c| match c {
            XmlNode::Element(e) => rank(e.name.as_str()).map_or(true, |r| r > target),
            _ => false,
        })
        .unwrap_or(rpr.children.len());

    rpr.ensure_child(name, position)
}
