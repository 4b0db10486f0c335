//! NDT Report Common Library
//!
//! 检测数据分组、列解析、表格行数计算、复选框匹配等不依赖文件 I/O 的逻辑

pub mod types;
pub mod error;
pub mod columns;
pub mod grouping;
pub mod row_plan;
pub mod checkbox;
pub mod naming;
pub mod profile;

pub use types::{Field, Record, ReportGroup};
pub use error::{Error, Result};
pub use columns::{ColumnMapping, ColumnResolution, ColumnSpec, resolve_columns};
pub use grouping::{group_records, max_date_or_today, parse_date};
pub use row_plan::{ExpansionRequest, RowRequirement, TableCapacity, plan_expansion};
pub use checkbox::{CheckboxOption, MatchOutcome, PatternDictionary, find_best_match};
pub use naming::{default_output_dir, output_file_name, output_path};
pub use profile::{CheckboxGroupSpec, PlaceholderSource, PlaceholderSpec, ReportKind, ReportProfile, TableColumnSpec};
