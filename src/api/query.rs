// ==========================================
// 钻井作业计划系统 - 列表查询辅助
// ==========================================
// 参数: search (多词, 每个词都要命中某个搜索字段, 不区分大小写)
//       ordering ("-" 前缀降序, 逗号分隔多字段)
//       filters (精确匹配, "null" 匹配空引用)
//       offset / limit
// 排序稳定: 相同排序键保持插入顺序
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ListSettings;
use crate::domain::{EntityKind, FieldErrors};
use crate::repository::{RepositoryResult, StoreTx};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

// ==========================================
// ListQuery - 列表查询参数
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub ordering: Option<String>,
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn order_by(mut self, ordering: impl Into<String>) -> Self {
        self.ordering = Some(ordering.into());
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

// ==========================================
// Page - 分页结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: usize, // 过滤后的总数
    pub offset: usize,
    pub limit: usize,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.offset + self.results.len() < self.count
    }
}

// ==========================================
// NameIndex - 关联实体名称 (用于 xxx__name 搜索/排序)
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct NameIndex(HashMap<Uuid, String>);

impl NameIndex {
    pub fn build(tx: &mut dyn StoreTx, kinds: &[EntityKind]) -> RepositoryResult<Self> {
        let mut names = HashMap::new();
        for kind in kinds {
            for record in tx.list(*kind)? {
                if let Some(name) = record.name() {
                    names.insert(record.id(), name.to_string());
                }
            }
        }
        Ok(Self(names))
    }

    pub fn name(&self, id: Option<Uuid>) -> Option<&str> {
        id.and_then(|id| self.0.get(&id)).map(String::as_str)
    }
}

// ==========================================
// SortKey - 排序键
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Missing, // 空值, 升降序均排在最后
    Text(String),
    Number(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl SortKey {
    pub fn text(value: impl Into<String>) -> Self {
        SortKey::Text(value.into())
    }

    pub fn opt_text(value: Option<&str>) -> Self {
        value.map(SortKey::text).unwrap_or(SortKey::Missing)
    }

    pub fn opt_date(value: Option<NaiveDate>) -> Self {
        value.map(SortKey::Date).unwrap_or(SortKey::Missing)
    }

    pub fn opt_datetime(value: Option<NaiveDateTime>) -> Self {
        value.map(SortKey::DateTime).unwrap_or(SortKey::Missing)
    }

    fn compare(&self, other: &SortKey, descending: bool) -> Ordering {
        let ordering = match (self, other) {
            (SortKey::Missing, SortKey::Missing) => return Ordering::Equal,
            (SortKey::Missing, _) => return Ordering::Greater,
            (_, SortKey::Missing) => return Ordering::Less,
            (SortKey::Text(a), SortKey::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            (SortKey::Number(a), SortKey::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
            (SortKey::DateTime(a), SortKey::DateTime(b)) => a.cmp(b),
            _ => Ordering::Equal,
        };
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

// ==========================================
// Listable - 可列表查询的实体
// ==========================================
pub trait Listable: Sized {
    /// search 覆盖的字段 (可含 xxx__name)
    const SEARCH_FIELDS: &'static [&'static str];
    /// ordering 允许的字段
    const ORDERING_FIELDS: &'static [&'static str];
    /// 未指定 ordering 时的排序; 空表示插入顺序
    const DEFAULT_ORDERING: &'static [&'static str];
    /// 允许的精确过滤键
    const FILTER_FIELDS: &'static [&'static str];
    /// 需要加载名称的关联实体
    const RELATED: &'static [EntityKind] = &[];

    fn search_value(&self, field: &str, names: &NameIndex) -> Option<String>;

    fn sort_key(&self, field: &str, names: &NameIndex) -> SortKey;

    /// 过滤比较值; None 表示空引用
    fn filter_value(&self, field: &str) -> Option<String>;
}

fn search_terms(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn parse_ordering(raw: &str) -> Vec<(String, bool)> {
    raw.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(|f| match f.strip_prefix('-') {
            Some(name) => (name.to_string(), true),
            None => (f.to_string(), false),
        })
        .collect()
}

/// 校验参数后执行 过滤 → 搜索 → 排序 → 分页
///
/// 未知的排序字段或过滤键返回 Validation 错误
pub fn apply_query<T: Listable>(
    items: Vec<T>,
    query: &ListQuery,
    names: &NameIndex,
    settings: &ListSettings,
) -> ApiResult<Page<T>> {
    // 1. 参数校验
    let mut errors = FieldErrors::new();
    let ordering = match query.ordering.as_deref() {
        Some(raw) => {
            let parsed = parse_ordering(raw);
            for (field, _) in &parsed {
                if !T::ORDERING_FIELDS.contains(&field.as_str()) {
                    errors.add("ordering", format!("unknown ordering field \"{}\"", field));
                }
            }
            parsed
        }
        None => T::DEFAULT_ORDERING
            .iter()
            .flat_map(|f| parse_ordering(f))
            .collect(),
    };
    for key in query.filters.keys() {
        if !T::FILTER_FIELDS.contains(&key.as_str()) {
            errors.add(key.clone(), "unknown filter");
        }
    }
    if query.limit == Some(0) {
        errors.add("limit", "limit must be a positive integer");
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    // 2. 过滤
    let mut matched: Vec<T> = items
        .into_iter()
        .filter(|item| {
            query.filters.iter().all(|(key, expected)| {
                let expected = expected.trim();
                match item.filter_value(key) {
                    Some(actual) => actual.eq_ignore_ascii_case(expected),
                    None => expected.eq_ignore_ascii_case("null"),
                }
            })
        })
        .collect();

    // 3. 搜索
    if let Some(text) = query.search.as_deref() {
        let terms = search_terms(text);
        if !terms.is_empty() {
            matched.retain(|item| {
                let values: Vec<String> = T::SEARCH_FIELDS
                    .iter()
                    .filter_map(|f| item.search_value(f, names))
                    .map(|v| v.to_lowercase())
                    .collect();
                terms
                    .iter()
                    .all(|term| values.iter().any(|v| v.contains(term.as_str())))
            });
        }
    }

    // 4. 排序 (稳定)
    if !ordering.is_empty() {
        let mut keyed: Vec<(Vec<SortKey>, T)> = matched
            .into_iter()
            .map(|item| {
                let keys = ordering
                    .iter()
                    .map(|(field, _)| item.sort_key(field, names))
                    .collect();
                (keys, item)
            })
            .collect();
        keyed.sort_by(|(a, _), (b, _)| {
            ordering
                .iter()
                .zip(a.iter().zip(b.iter()))
                .map(|((_, desc), (ka, kb))| ka.compare(kb, *desc))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        matched = keyed.into_iter().map(|(_, item)| item).collect();
    }

    // 5. 分页
    let count = matched.len();
    let limit = query
        .limit
        .unwrap_or(settings.default_page_size)
        .clamp(1, settings.max_page_size.max(1));
    let offset = query.offset.unwrap_or(0);
    let results = matched.into_iter().skip(offset).take(limit).collect();

    Ok(Page {
        count,
        offset,
        limit,
        results,
    })
}
