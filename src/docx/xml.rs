//! WordprocessingML 的简易元素树
//!
//! quick-xml 逐事件读取后组装为元素树，修改后按原样序列化。
//! 元素名保留前缀（如 "w:p"）。

use crate::error::{ReportError, Result};
use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    /// 注释、处理指令等，原样输出
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((key.to_string(), value.to_string())),
        }
    }

    /// 名称一致的直接子元素
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter_map(move |c| match c {
            XmlNode::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find_map(|c| match c {
            XmlNode::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find_map(|c| match c {
            XmlNode::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    /// 名称一致的直接子元素在 children 中的位置
    pub fn child_positions(&self, name: &str) -> Vec<usize> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, c)| match c {
                XmlNode::Element(e) if e.name == name => Some(i),
                _ => None,
            })
            .collect()
    }

    pub fn element_at(&self, position: usize) -> Option<&XmlElement> {
        match self.children.get(position) {
            Some(XmlNode::Element(e)) => Some(e),
            _ => None,
        }
    }

    pub fn element_at_mut(&mut self, position: usize) -> Option<&mut XmlElement> {
        match self.children.get_mut(position) {
            Some(XmlNode::Element(e)) => Some(e),
            _ => None,
        }
    }

    /// 没有时插入到指定位置
    pub fn ensure_child(&mut self, name: &str, position: usize) -> &mut XmlElement {
        let index = match self.child_positions(name).first() {
            Some(&i) => i,
            None => {
                let at = position.min(self.children.len());
                self.children.insert(at, XmlNode::Element(XmlElement::new(name)));
                at
            }
        };
        match &mut self.children[index] {
            XmlNode::Element(e) => e,
            _ => unreachable!("ensure_child index points at an element"),
        }
    }

    pub fn remove_children_named(&mut self, name: &str) {
        self.children
            .retain(|c| !matches!(c, XmlNode::Element(e) if e.name == name));
    }

    /// 前序遍历中名称一致的后代（含自身）
    pub fn descendants<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlElement>) {
        if self.name == name {
            out.push(self);
        }
        for child in &self.children {
            if let XmlNode::Element(e) = child {
                e.descendants(name, out);
            }
        }
    }

    pub fn find_all(&self, name: &str) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        self.descendants(name, &mut out);
        out
    }

    /// 前序遍历中第 n 个名称一致的后代
    pub fn nth_descendant_mut(&mut self, name: &str, n: usize) -> Option<&mut XmlElement> {
        let mut remaining = n;
        self.nth_inner(name, &mut remaining)
    }

    fn nth_inner(&mut self, name: &str, remaining: &mut usize) -> Option<&mut XmlElement> {
        if self.name == name {
            if *remaining == 0 {
                return Some(self);
            }
            *remaining -= 1;
        }
        for child in self.children.iter_mut() {
            if let XmlNode::Element(e) = child {
                if let Some(found) = e.nth_inner(name, remaining) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// 后序遍历（先子后父）对名称一致的元素执行 f
    pub fn for_each_mut<F>(&mut self, name: &str, f: &mut F)
    where
        F: FnMut(&mut XmlElement),
    {
        for child in self.children.iter_mut() {
            if let XmlNode::Element(e) = child {
                e.for_each_mut(name, f);
            }
        }
        if self.name == name {
            f(self);
        }
    }

    /// 直接文本子节点的内容
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                XmlNode::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn set_text(&mut self, text: &str) {
        self.children.retain(|c| !matches!(c, XmlNode::Text(_)));
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text.to_string()));
        }
    }
}

/// 解析后的 XML 文档部件
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// 根元素之前的注释等
    pub prolog: Vec<String>,
    pub root: XmlElement,
}

impl XmlDocument {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = XmlReader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut prolog = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    stack.push(element_from_start(&e)?);
                }
                Event::Empty(e) => {
                    let element = element_from_start(&e)?;
                    attach(&mut stack, &mut root, XmlNode::Element(element));
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| ReportError::Xml("结束标签多余".into()))?;
                    attach(&mut stack, &mut root, XmlNode::Element(element));
                }
                Event::Text(e) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = e.unescape().map_err(|err| ReportError::Xml(err.to_string()))?;
                        parent.children.push(XmlNode::Text(text.into_owned()));
                    }
                }
                Event::CData(e) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                        parent.children.push(XmlNode::Text(text));
                    }
                }
                Event::Comment(e) => {
                    let raw = format!("<!--{}-->", String::from_utf8_lossy(&e));
                    push_raw(&mut stack, &mut prolog, raw);
                }
                Event::PI(e) => {
                    let raw = format!("<?{}?>", String::from_utf8_lossy(&e));
                    push_raw(&mut stack, &mut prolog, raw);
                }
                Event::DocType(e) => {
                    prolog.push(format!("<!DOCTYPE {}>", String::from_utf8_lossy(&e)));
                }
                Event::Decl(_) => {}
                Event::Eof => break,
            }
        }

        if !stack.is_empty() {
            return Err(ReportError::Xml(format!(
                "标签未闭合: {}",
                stack.last().map(|e| e.name.as_str()).unwrap_or("")
            )));
        }

        let root = root.ok_or_else(|| ReportError::Xml("没有根元素".into()))?;
        Ok(Self { prolog, root })
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(4096);
        out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        out.push_str("\r\n");
        for raw in &self.prolog {
            out.push_str(raw);
        }
        write_element(&self.root, &mut out);
        out
    }
}

fn element_from_start(e: &quick_xml::events::BytesStart<'_>) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut element = XmlElement::new(&name);
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| ReportError::Xml(err.to_string()))?
            .into_owned();
        element.attrs.push((key, value));
    }
    Ok(element)
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if let XmlNode::Element(e) = node {
                *root = Some(e);
            }
        }
    }
}

fn push_raw(stack: &mut [XmlElement], prolog: &mut Vec<String>, raw: String) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Raw(raw)),
        None => prolog.push(raw),
    }
}

pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn write_element(element: &XmlElement, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }

    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    for child in &element.children {
        match child {
            XmlNode::Element(e) => write_element(e, out),
            XmlNode::Text(t) => out.push_str(&escape_text(t)),
            XmlNode::Raw(r) => out.push_str(r),
        }
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t xml:space="preserve">A &amp; B </w:t></w:r></w:p><w:p/></w:body></w:document>"#;

    #[test]
    fn test_parse_and_serialize() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.root.name, "w:document");
        let texts = doc.root.find_all("w:t");
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].text(), "A & B ");
        assert_eq!(texts[0].attr("xml:space"), Some("preserve"));

        let xml = doc.to_xml();
        assert!(xml.contains("<w:t xml:space=\"preserve\">A &amp; B </w:t>"));
        assert!(xml.contains("<w:p/>"));

        let reparsed = XmlDocument::parse(&xml).unwrap();
        assert_eq!(reparsed.root, doc.root);
    }

    #[test]
    fn test_nth_descendant_mut() {
        let mut doc = XmlDocument::parse(SAMPLE).unwrap();
        let second = doc.root.nth_descendant_mut("w:p", 1).unwrap();
        second.set_attr("w:rsidR", "00AB");
        assert_eq!(doc.root.find_all("w:p")[1].attr("w:rsidR"), Some("00AB"));
        assert!(doc.root.nth_descendant_mut("w:p", 2).is_none());
    }

    #[test]
    fn test_unclosed_tag_is_error() {
        assert!(XmlDocument::parse("<a><b></a>").is_err());
    }

    #[test]
    fn test_ensure_child_inserts_once() {
        let mut run = XmlElement::new("w:r").with_child(XmlElement::new("w:t"));
        run.ensure_child("w:rPr", 0);
        run.ensure_child("w:rPr", 0);
        assert_eq!(run.child_positions("w:rPr"), vec![0]);
        assert_eq!(run.child_positions("w:t"), vec![1]);
    }

    #[test]
    fn test_child_lookup_with_temporary_name() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        let body = {
            let name = String::from("w:body");
            doc.root.child(&name)
        };
        let body = body.unwrap();
        assert_eq!(body.children_named("w:p").count(), 2);
        assert!(body.child("w:tbl").is_none());
    }
}
