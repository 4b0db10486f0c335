//! 表格行数计算
//!
//! 根据每个检件的张数计算所需的表格行数和片号，
//! 与模板表格的现有容量比较后给出需要插入的行。

/// 一个检件所需的行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRequirement {
    pub inspection_no: String,
    pub sheet_count: Option<u32>,
    /// 该检件占用的行数
    pub rows: usize,
    /// 每行的片号，不分片时为空
    pub film_numbers: Vec<String>,
}

impl RowRequirement {
    /// 第 `offset` 行的片号
    pub fn film_number(&self, offset: usize) -> Option<&str> {
        self.film_numbers.get(offset).map(String::as_str)
    }
}

/// 按张数计算行数
///
/// - 2 或 3 张: 对应行数，片号 "1".."n"
/// - 6 张以上: 每张一行，片号 "1-2", "2-3", .., "n-1"
/// - 其他: 1 行，无片号
pub fn requirement_for(inspection_no: &str, sheet_count: Option<u32>) -> RowRequirement {
    let film_numbers: Vec<String> = match sheet_count {
        Some(n @ 2..=3) => (1..=n).map(|i| i.to_string()).collect(),
        Some(n) if n >= 6 => (1..=n)
            .map(|i| {
                let next = if i == n { 1 } else { i + 1 };
                format!("{}-{}", i, next)
            })
            .collect(),
        _ => Vec::new(),
    };

    RowRequirement {
        inspection_no: inspection_no.to_string(),
        sheet_count,
        rows: film_numbers.len().max(1),
        film_numbers,
    }
}

/// 不按张数展开时，每个检件 1 行
pub fn single_row(inspection_no: &str) -> RowRequirement {
    RowRequirement {
        inspection_no: inspection_no.to_string(),
        sheet_count: None,
        rows: 1,
        film_numbers: Vec::new(),
    }
}

/// 所需行数合计
pub fn total_rows(requirements: &[RowRequirement]) -> usize {
    requirements.iter().map(|r| r.rows).sum()
}

/// 模板表格的容量
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCapacity {
    /// 表头所在行
    pub header_row: usize,
    /// 第一数据行
    pub first_data_row: usize,
    /// 可写入的数据行数（不含表尾）
    pub available_rows: usize,
    /// 表尾（备注、签字等）开始的行
    pub footer_row: Option<usize>,
}

impl TableCapacity {
    /// 最后一个可用数据行
    pub fn last_data_row(&self) -> Option<usize> {
        (self.available_rows > 0).then(|| self.first_data_row + self.available_rows - 1)
    }
}

/// 表格行插入请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionRequest {
    /// 插入位置（新行的第一行的行号）
    pub insert_at: usize,
    /// 插入行数
    pub rows_to_add: usize,
    /// 复制格式的参考行
    pub reference_row: usize,
}

/// 容量不足时给出插入请求
pub fn plan_expansion(capacity: &TableCapacity, required_rows: usize) -> Option<ExpansionRequest> {
    if required_rows <= capacity.available_rows {
        return None;
    }

    Some(ExpansionRequest {
        insert_at: capacity.first_data_row + capacity.available_rows,
        rows_to_add: required_rows - capacity.available_rows,
        reference_row: capacity.last_data_row().unwrap_or(capacity.header_row),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_sheet_one_row() {
        let r = requirement_for("W1", Some(1));
        assert_eq!(r.rows, 1);
        assert!(r.film_numbers.is_empty());
    }

    #[test]
    fn test_two_and_three_sheets() {
        assert_eq!(requirement_for("W1", Some(2)).film_numbers, vec!["1", "2"]);
        let r = requirement_for("W1", Some(3));
        assert_eq!(r.rows, 3);
        assert_eq!(r.film_numbers, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_four_and_five_sheets_collapse_to_one_row() {
        for n in [4, 5] {
            let r = requirement_for("W1", Some(n));
            assert_eq!(r.rows, 1);
            assert!(r.film_numbers.is_empty());
            assert_eq!(r.film_number(0), None);
        }
    }

    #[test]
    fn test_seven_sheets_wraps_film_numbers() {
        let r = requirement_for("W1", Some(7));
        assert_eq!(r.rows, 7);
        assert_eq!(
            r.film_numbers,
            vec!["1-2", "2-3", "3-4", "4-5", "5-6", "6-7", "7-1"]
        );
    }

    #[test]
    fn test_missing_or_zero_count() {
        assert_eq!(requirement_for("W1", None).rows, 1);
        assert_eq!(requirement_for("W1", Some(0)).rows, 1);
    }

    #[test]
    fn test_total_rows() {
        let reqs = vec![
            requirement_for("a", Some(3)),
            requirement_for("b", Some(1)),
            requirement_for("c", Some(6)),
        ];
        assert_eq!(total_rows(&reqs), 10);
    }

    #[test]
    fn test_plan_expansion_enough_capacity() {
        let cap = TableCapacity {
            header_row: 0,
            first_data_row: 1,
            available_rows: 5,
            footer_row: Some(6),
        };
        assert_eq!(plan_expansion(&cap, 5), None);
    }

    #[test]
    fn test_plan_expansion_inserts_before_footer() {
        let cap = TableCapacity {
            header_row: 1,
            first_data_row: 2,
            available_rows: 1,
            footer_row: Some(3),
        };
        assert_eq!(
            plan_expansion(&cap, 4),
            Some(ExpansionRequest {
                insert_at: 3,
                rows_to_add: 3,
                reference_row: 2,
            })
        );
    }

    #[test]
    fn test_plan_expansion_without_data_rows_copies_header() {
        let cap = TableCapacity {
            header_row: 0,
            first_data_row: 1,
            available_rows: 0,
            footer_row: None,
        };
        let request = plan_expansion(&cap, 2).unwrap();
        assert_eq!(request.reference_row, 0);
        assert_eq!(request.insert_at, 1);
    }
}
