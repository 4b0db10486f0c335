//! 复选框勾选
//!
//! 找到含关键字的单元格所在行，收集该行所有单元格中的选项，
//! 与组内字段值匹配后把选中项的 ☐ 改为 ☑。

use crate::docx::table::{row_cells, row_mut};
use crate::docx::text::{paragraph_text, replace_char_at};
use crate::docx::XmlElement;
use ndt_report_common::checkbox::{find_best_match, locate_glyph_to_check, parse_options};
use ndt_report_common::{CheckboxGroupSpec, CheckboxOption, MatchOutcome, ReportGroup};
use tracing::{debug, warn};

/// 一个复选框组的处理结果
#[derive(Debug, Clone, PartialEq)]
pub struct CheckboxResult {
    pub keyword: String,
    pub value: Option<String>,
    pub outcome: MatchOutcome,
    pub checked: Option<String>,
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// 含关键字的行中的所有选项
pub fn collect_options(root: &XmlElement, keyword: &str) -> Vec<CheckboxOption> {
    let keyword = compact(keyword);
    if keyword.is_empty() {
        return Vec::new();
    }

    let mut options = Vec::new();
    for (table, tbl) in root.find_all("w:tbl").into_iter().enumerate() {
        for (row, tr) in tbl.children_named("w:tr").enumerate() {
            let cells = row_cells(tr);
            if !cells.iter().any(|c| compact(&c.text).contains(keyword.as_str())) {
                continue;
            }
            for (cell, info) in cells.iter().enumerate() {
                for (text, checked) in parse_options(&info.text) {
                    options.push(CheckboxOption {
                        text,
                        checked,
                        table,
                        row,
                        cell,
                    });
                }
            }
        }
    }
    options
}

/// 在选项所在单元格中勾选
fn check_option(root: &mut XmlElement, option: &CheckboxOption) -> bool {
    let Some(tbl) = root.nth_descendant_mut("w:tbl", option.table) else {
        return false;
    };
    let Some(tr) = row_mut(tbl, option.row) else {
        return false;
    };
    let Some(&position) = tr.child_positions("w:tc").get(option.cell) else {
        return false;
    };
    let Some(tc) = tr.element_at_mut(position) else {
        return false;
    };

    let mut done = false;
    tc.for_each_mut("w:p", &mut |p: &mut XmlElement| {
        if done {
            return;
        }
        let text = paragraph_text(p);
        if let Some((offset, glyph)) = locate_glyph_to_check(&text, &option.text) {
            done = replace_char_at(p, offset, glyph);
        }
    });
    done
}

/// 一组复选框的匹配和勾选
pub fn apply_checkbox_group(
    root: &mut XmlElement,
    spec: &CheckboxGroupSpec,
    group: &ReportGroup,
) -> CheckboxResult {
    let value = group.first_value(spec.field).map(str::to_string);
    let mut result = CheckboxResult {
        keyword: spec.keyword.clone(),
        value: value.clone(),
        outcome: MatchOutcome::NoMatch,
        checked: None,
    };

    let Some(value) = value else {
        debug!(keyword = %spec.keyword, "组内没有该字段的值，跳过复选框");
        return result;
    };

    let options = collect_options(root, &spec.keyword);
    if options.is_empty() {
        debug!(keyword = %spec.keyword, "模板中没有该复选框组");
        return result;
    }

    let texts: Vec<&str> = options.iter().map(|o| o.text.as_str()).collect();
    result.outcome = find_best_match(&value, &texts, &spec.patterns);

    match result.outcome.index().and_then(|i| options.get(i)) {
        Some(option) => {
            if check_option(root, option) {
                result.checked = Some(option.text.clone());
            } else {
                warn!(keyword = %spec.keyword, option = %option.text, "选项已匹配但找不到可勾选的 ☐");
            }
        }
        None => warn!(keyword = %spec.keyword, value = %value, "没有匹配的选项"),
    }
    result
}

/// 所有复选框组
pub fn apply_checkboxes(
    root: &mut XmlElement,
    specs: &[CheckboxGroupSpec],
    group: &ReportGroup,
) -> Vec<CheckboxResult> {
    specs
        .iter()
        .map(|spec| apply_checkbox_group(root, spec, group))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::table::table_cells;
    use crate::docx::XmlDocument;
    use ndt_report_common::checkbox::TIMING_PATTERNS;
    use ndt_report_common::{Field, Record};

    fn document() -> XmlElement {
        XmlDocument::parse(
            "<w:body><w:tbl><w:tr>\
             <w:tc><w:p><w:r><w:t>检测时机</w:t></w:r></w:p></w:tc>\
             <w:tc><w:p><w:r><w:t xml:space=\"preserve\">☐焊后 </w:t></w:r><w:r><w:t>☐热处理后 ☐返修后</w:t></w:r></w:p></w:tc>\
             </w:tr></w:tbl></w:body>",
        )
        .unwrap()
        .root
    }

    fn spec() -> CheckboxGroupSpec {
        CheckboxGroupSpec {
            keyword: "检测时机".into(),
            field: Field::DetectionTiming,
            patterns: TIMING_PATTERNS.clone(),
        }
    }

    fn group(timing: &str) -> ReportGroup {
        ReportGroup {
            order_no: "A-1".into(),
            ray_type: None,
            records: vec![Record::new(2), Record::new(3).with(Field::DetectionTiming, timing)],
        }
    }

    #[test]
    fn test_collect_options() {
        let options = collect_options(&document(), "检测 时机");
        let texts: Vec<&str> = options.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(texts, vec!["焊后", "热处理后", "返修后"]);
        assert!(options.iter().all(|o| o.cell == 1 && !o.checked));
    }

    #[test]
    fn test_synonym_checks_option() {
        let mut root = document();
        let result = apply_checkbox_group(&mut root, &spec(), &group("PWHT"));
        assert_eq!(result.checked.as_deref(), Some("热处理后"));

        let tbl = root.find_all("w:tbl")[0];
        assert_eq!(table_cells(tbl)[0][1].text, "☐焊后 ☑热处理后 ☐返修后");
    }

    #[test]
    fn test_no_value_leaves_template() {
        let mut root = document();
        let result = apply_checkbox_group(&mut root, &spec(), &group(""));
        assert_eq!(result.outcome, MatchOutcome::NoMatch);
        assert_eq!(root, document());
    }

    #[test]
    fn test_unmatched_value() {
        let mut root = document();
        let result = apply_checkbox_group(&mut root, &spec(), &group("超声"));
        assert_eq!(result.outcome, MatchOutcome::NoMatch);
        assert!(result.checked.is_none());
    }
}
