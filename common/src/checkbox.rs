//! 复选框选项匹配
//!
//! 模板中形如 "☐焊后 ☐热处理后" 的选项组，按目标值选出最接近的
//! 选项并把它的 ☐ 改为 ☑。
//!
//! 匹配顺序:
//! 1. 规范化后完全一致 → 立即采用
//! 2. 值属于同义词词典且选项包含该组词 → 1.0
//! 3. 相互包含 → 短/长
//! 4. 关键词交集 → |A∩B| / max(|A|,|B|)（> 0.3 才有效）

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// 采用的最低分（不含）
pub const MATCH_THRESHOLD: f64 = 0.3;

pub const UNCHECKED: [char; 2] = ['☐', '□'];
pub const CHECKED: [char; 3] = ['☑', '■', '☒'];

pub fn is_checkbox_glyph(ch: char) -> bool {
    UNCHECKED.contains(&ch) || CHECKED.contains(&ch)
}

/// 选中后的字形
pub fn checked_glyph(unchecked: char) -> char {
    match unchecked {
        '□' => '■',
        _ => '☑',
    }
}

/// 模板中的一个选项
#[derive(Debug, Clone, PartialEq)]
pub struct CheckboxOption {
    /// 显示文本（不含字形）
    pub text: String,
    pub checked: bool,
    pub table: usize,
    pub row: usize,
    pub cell: usize,
}

/// 匹配结果
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// 规范化文本完全一致
    Exact { index: usize },
    /// 打分采用
    Scored { index: usize, score: f64 },
    NoMatch,
}

impl MatchOutcome {
    pub fn index(&self) -> Option<usize> {
        match self {
            MatchOutcome::Exact { index } | MatchOutcome::Scored { index, .. } => Some(*index),
            MatchOutcome::NoMatch => None,
        }
    }
}

/// 同义词词典: 代表词 → 同义写法
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternDictionary(pub BTreeMap<String, Vec<String>>);

impl PatternDictionary {
    pub fn new(entries: &[(&str, &[&str])]) -> Self {
        Self(
            entries
                .iter()
                .map(|(key, syns)| (key.to_string(), syns.iter().map(|s| s.to_string()).collect()))
                .collect(),
        )
    }

    /// 值所属的词组（代表词 + 同义词，均已规范化）
    fn group_of(&self, normalized_value: &str) -> Option<Vec<String>> {
        self.0.iter().find_map(|(key, synonyms)| {
            let mut words = vec![normalize(key)];
            words.extend(synonyms.iter().map(|s| normalize(s)));
            let member = words.iter().any(|w| w == normalized_value);
            member.then_some(words)
        })
    }

    /// 词典中所有的词（规范化后）
    fn vocabulary(&self) -> Vec<String> {
        self.0
            .iter()
            .flat_map(|(key, synonyms)| std::iter::once(key).chain(synonyms.iter()))
            .map(|w| normalize(w))
            .filter(|w| !w.is_empty())
            .collect()
    }
}

/// 比较用的规范化
///
/// 去掉空白和复选框字形，全角字母数字和括号冒号转半角，转小写。
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && !is_checkbox_glyph(*c))
        .map(|c| match c {
            '（' => '(',
            '）' => ')',
            '：' => ':',
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .flat_map(char::to_lowercase)
        .collect()
}

/// 单元格文本中的选项（按字形切分）
///
/// 返回 (显示文本, 是否已选中)。
pub fn parse_options(text: &str) -> Vec<(String, bool)> {
    let mut options = Vec::new();

    for line in text.lines() {
        let mut current: Option<(String, bool)> = None;
        for ch in line.chars() {
            if is_checkbox_glyph(ch) {
                if let Some((label, checked)) = current.take() {
                    push_option(&mut options, label, checked);
                }
                current = Some((String::new(), CHECKED.contains(&ch)));
            } else if let Some((label, _)) = current.as_mut() {
                label.push(ch);
            }
        }
        if let Some((label, checked)) = current.take() {
            push_option(&mut options, label, checked);
        }
    }

    options
}

fn push_option(options: &mut Vec<(String, bool)>, label: String, checked: bool) {
    let label = label.trim().to_string();
    if !label.is_empty() {
        options.push((label, checked));
    }
}

const TOKEN_SEPARATORS: &[char] = &['/', '、', ',', '，', ';', '；', '(', ')', ':', '-', '+'];

/// 关键词集合: 分隔符切出的片段 + 文本中出现的词典词
fn keyword_tokens(normalized: &str, vocabulary: &[String]) -> HashSet<String> {
    let mut tokens: HashSet<String> = normalized
        .split(|c: char| TOKEN_SEPARATORS.contains(&c))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    for word in vocabulary {
        if normalized.contains(word.as_str()) {
            tokens.insert(word.clone());
        }
    }
    tokens
}

/// 单个选项的得分（完全一致的情况由调用方先行处理）
fn score_option(
    value: &str,
    option: &str,
    value_group: Option<&[String]>,
    vocabulary: &[String],
) -> f64 {
    if let Some(words) = value_group {
        if words.iter().any(|w| !w.is_empty() && option.contains(w.as_str())) {
            return 1.0;
        }
    }

    if option.contains(value) || value.contains(option) {
        let a = value.chars().count();
        let b = option.chars().count();
        return a.min(b) as f64 / a.max(b) as f64;
    }

    let value_tokens = keyword_tokens(value, vocabulary);
    let option_tokens = keyword_tokens(option, vocabulary);
    let denominator = value_tokens.len().max(option_tokens.len());
    if denominator == 0 {
        return 0.0;
    }
    let overlap = value_tokens.intersection(&option_tokens).count() as f64 / denominator as f64;
    if overlap > MATCH_THRESHOLD {
        overlap
    } else {
        0.0
    }
}

/// 在选项中找出与目标值最匹配的一个
///
/// 只有严格更高的分数才会替换当前最佳，同分时先出现的选项优先。
pub fn find_best_match<S: AsRef<str>>(
    value: &str,
    options: &[S],
    patterns: &PatternDictionary,
) -> MatchOutcome {
    let value = normalize(value);
    if value.is_empty() {
        return MatchOutcome::NoMatch;
    }

    let group = patterns.group_of(&value);
    let vocabulary = patterns.vocabulary();
    let mut best: Option<(usize, f64)> = None;

    for (index, option) in options.iter().enumerate() {
        let option = normalize(option.as_ref());
        if option.is_empty() {
            continue;
        }

        if option == value {
            return MatchOutcome::Exact { index };
        }

        let score = score_option(&value, &option, group.as_deref(), &vocabulary);
        let current = best.map(|(_, s)| s).unwrap_or(MATCH_THRESHOLD);
        if score > current {
            best = Some((index, score));
        }
    }

    match best {
        Some((index, score)) => MatchOutcome::Scored { index, score },
        None => MatchOutcome::NoMatch,
    }
}

/// 文本中应勾选的字形位置
///
/// 在 "☐" + 选项文本 + (空白 | 另一个复选框 | 行尾) 处，
/// 返回该 "☐" 的字节位置和替换后的字形。
pub fn locate_glyph_to_check(text: &str, option_text: &str) -> Option<(usize, char)> {
    let pattern = format!(
        r"(?m)([☐□])\s*{}(?:\s|[☐☑□■☒]|$)",
        regex::escape(option_text.trim())
    );
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(text)?;
    let glyph = caps.get(1)?;
    let ch = glyph.as_str().chars().next()?;
    Some((glyph.start(), checked_glyph(ch)))
}

lazy_static::lazy_static! {
    /// 检测时机的同义词
    pub static ref TIMING_PATTERNS: PatternDictionary = PatternDictionary::new(&[
        ("焊后", &["焊接后", "焊完", "焊后检测"]),
        ("热处理后", &["热后", "热处理", "pwht", "焊后热处理"]),
        ("打磨后", &["打磨", "修磨后"]),
        ("返修后", &["返修", "返修复检", "返修后复检"]),
    ]);

    /// 射线源的同义词
    pub static ref RAY_SOURCE_PATTERNS: PatternDictionary = PatternDictionary::new(&[
        ("X射线", &["x", "x光", "x射线机", "xray"]),
        ("γ射线", &["γ", "gamma", "伽马", "ir192", "ir-192", "se75", "se-75", "co60"]),
    ]);
}
