//! 列解析
//!
//! 表头文本按关键字（不区分大小写的子串）匹配逻辑字段，
//! 找不到时退回到固定的列字母位置。

use crate::types::Field;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 一个字段的列查找规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub field: Field,
    /// 表头关键字（子串匹配）
    pub keywords: Vec<String>,
    /// 关键字匹配失败时使用的列字母，如 "C"
    #[serde(default)]
    pub fallback: Option<String>,
}

impl ColumnSpec {
    pub fn new(field: Field, keywords: &[&str], fallback: Option<&str>) -> Self {
        Self {
            field,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            fallback: fallback.map(str::to_string),
        }
    }
}

/// 列的解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnResolution {
    /// 表头关键字命中
    Keyword { index: usize, header: String },
    /// 按列字母推测
    Fallback { index: usize, letter: String },
}

impl ColumnResolution {
    pub fn index(&self) -> usize {
        match self {
            ColumnResolution::Keyword { index, .. } | ColumnResolution::Fallback { index, .. } => *index,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ColumnResolution::Fallback { .. })
    }
}

impl std::fmt::Display for ColumnResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnResolution::Keyword { index, header } => {
                write!(f, "{}列「{}」", column_letter_from_index(*index), header)
            }
            ColumnResolution::Fallback { letter, .. } => write!(f, "{}列（位置推测）", letter),
        }
    }
}

/// 字段 → 列 的映射
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    resolved: BTreeMap<Field, ColumnResolution>,
    missing: Vec<Field>,
}

impl ColumnMapping {
    pub fn get(&self, field: Field) -> Option<&ColumnResolution> {
        self.resolved.get(&field)
    }

    pub fn index_of(&self, field: Field) -> Option<usize> {
        self.resolved.get(&field).map(ColumnResolution::index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Field, &ColumnResolution)> {
        self.resolved.iter()
    }

    /// 关键字和位置推测都失败的字段
    pub fn missing(&self) -> &[Field] {
        &self.missing
    }

    pub fn fallbacks(&self) -> Vec<Field> {
        self.resolved
            .iter()
            .filter(|(_, r)| r.is_fallback())
            .map(|(f, _)| *f)
            .collect()
    }
}

/// 按关键字查找列，失败时使用列字母
pub fn resolve_column(
    headers: &[String],
    keywords: &[String],
    fallback: Option<&str>,
) -> Option<ColumnResolution> {
    let lowered: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();

    for (index, header) in headers.iter().enumerate() {
        let header_lower = header.to_lowercase();
        if lowered.iter().any(|k| !k.is_empty() && header_lower.contains(k.as_str())) {
            return Some(ColumnResolution::Keyword {
                index,
                header: header.clone(),
            });
        }
    }

    let letter = fallback?;
    let index = column_index_from_letter(letter)?;
    Some(ColumnResolution::Fallback {
        index,
        letter: letter.trim().to_uppercase(),
    })
}

/// 所有字段的列映射
pub fn resolve_columns(headers: &[String], specs: &[ColumnSpec]) -> ColumnMapping {
    let mut mapping = ColumnMapping::default();

    for spec in specs {
        if spec.field.is_derived() {
            continue;
        }
        match resolve_column(headers, &spec.keywords, spec.fallback.as_deref()) {
            Some(resolution) => {
                mapping.resolved.insert(spec.field, resolution);
            }
            None => mapping.missing.push(spec.field),
        }
    }

    mapping
}

/// 列字母 → 0 起始的列号（"A" → 0, "Z" → 25, "AA" → 26）
pub fn column_index_from_letter(letter: &str) -> Option<usize> {
    let letter = letter.trim();
    if letter.is_empty() {
        return None;
    }

    let mut index: usize = 0;
    for ch in letter.chars() {
        let upper = ch.to_ascii_uppercase();
        if !upper.is_ascii_uppercase() {
            return None;
        }
        index = index * 26 + (upper as usize - 'A' as usize + 1);
    }
    Some(index - 1)
}

/// 0 起始的列号 → 列字母
pub fn column_letter_from_index(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn keywords(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_column_index_from_letter() {
        assert_eq!(column_index_from_letter("A"), Some(0));
        assert_eq!(column_index_from_letter("c"), Some(2));
        assert_eq!(column_index_from_letter("Z"), Some(25));
        assert_eq!(column_index_from_letter("AA"), Some(26));
        assert_eq!(column_index_from_letter("AZ"), Some(51));
        assert_eq!(column_index_from_letter(""), None);
        assert_eq!(column_index_from_letter("A1"), None);
    }

    #[test]
    fn test_column_letter_from_index() {
        assert_eq!(column_letter_from_index(0), "A");
        assert_eq!(column_letter_from_index(25), "Z");
        assert_eq!(column_letter_from_index(26), "AA");
        assert_eq!(column_letter_from_index(51), "AZ");
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let h = headers(&["序号", "Weld No.", "规格"]);
        let r = resolve_column(&h, &keywords(&["weld no"]), None).unwrap();
        assert_eq!(r.index(), 1);
        assert!(!r.is_fallback());
    }

    #[test]
    fn test_keyword_match_prefers_first_column() {
        let h = headers(&["委托单编号(旧)", "委托单编号"]);
        let r = resolve_column(&h, &keywords(&["委托单编号"]), Some("F")).unwrap();
        assert_eq!(
            r,
            ColumnResolution::Keyword {
                index: 0,
                header: "委托单编号(旧)".into()
            }
        );
    }

    #[test]
    fn test_fallback_uses_exact_letter_mapping() {
        let h = headers(&["a", "b"]);
        let r = resolve_column(&h, &keywords(&["焊口"]), Some("ab")).unwrap();
        assert_eq!(
            r,
            ColumnResolution::Fallback {
                index: 27,
                letter: "AB".into()
            }
        );
    }

    #[test]
    fn test_no_match_no_fallback() {
        let h = headers(&["a"]);
        assert!(resolve_column(&h, &keywords(&["焊口"]), None).is_none());
    }

    #[test]
    fn test_resolve_columns_reports_missing_and_fallbacks() {
        let h = headers(&["委托单编号", "检件编号"]);
        let specs = vec![
            ColumnSpec::new(Field::OrderNo, &["委托单"], Some("A")),
            ColumnSpec::new(Field::InspectionNo, &["检件"], Some("B")),
            ColumnSpec::new(Field::WeldNo, &["焊口"], Some("D")),
            ColumnSpec::new(Field::Material, &["材质"], None),
            ColumnSpec::new(Field::SerialNo, &["序号"], None),
        ];
        let mapping = resolve_columns(&h, &specs);
        assert_eq!(mapping.index_of(Field::OrderNo), Some(0));
        assert_eq!(mapping.index_of(Field::WeldNo), Some(3));
        assert_eq!(mapping.fallbacks(), vec![Field::WeldNo]);
        assert_eq!(mapping.missing(), &[Field::Material]);
        assert!(mapping.get(Field::SerialNo).is_none());
    }
}
