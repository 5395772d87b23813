// ==========================================
// 钻井作业计划系统 - 导入外键解析
// ==========================================
// 列约定: `<ref>_id` (UUID) 与 `<ref>_name` (名称)
// 优先按 id 查找, 未命中再按名称在父范围内查找
// 同一范围内重名 → 行级错误 (无法确定引用目标)
// ==========================================

use crate::domain::EntityKind;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawRow;
use crate::repository::StoreTx;
use uuid::Uuid;

/// 外键解析结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// 命中
    Found(Uuid),
    /// 行中给了 id 或名称, 但找不到
    Missing,
    /// 行中既无 id 也无名称
    Absent,
}

impl Resolution {
    pub fn id(&self) -> Option<Uuid> {
        match self {
            Resolution::Found(id) => Some(*id),
            Resolution::Missing | Resolution::Absent => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Resolution::Missing)
    }
}

/// 名称查找范围: 父实体外键列 + 父 id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope<'a> {
    pub column: &'a str,
    pub parent_id: Uuid,
}

impl<'a> Scope<'a> {
    pub fn new(column: &'a str, parent_id: Uuid) -> Self {
        Self { column, parent_id }
    }
}

/// 解析行中的引用 `<prefix>_id` / `<prefix>_name`
///
/// # 参数
/// - kind: 被引用实体
/// - prefix: 列名前缀, 如 "field" / "platform"
/// - scope: 名称查找范围 (None 表示全局)
pub fn resolve(
    tx: &mut dyn StoreTx,
    row: &RawRow,
    kind: EntityKind,
    prefix: &str,
    scope: Option<Scope<'_>>,
) -> ImportResult<Resolution> {
    let id_key = format!("{}_id", prefix);
    let name_key = format!("{}_name", prefix);
    let id = row.uuid(&id_key)?;
    let name = row.text(&name_key);

    if let Some(id) = id {
        if tx.get(kind, id)?.is_some() {
            return Ok(Resolution::Found(id));
        }
    }

    let Some(name) = name else {
        return Ok(if id.is_some() {
            Resolution::Missing
        } else {
            Resolution::Absent
        });
    };

    let candidates = match scope {
        Some(scope) => tx.list_by_ref(kind, scope.column, scope.parent_id)?,
        None => tx.list(kind)?,
    };
    let matches: Vec<Uuid> = candidates
        .iter()
        .filter(|r| r.name() == Some(name.as_str()))
        .map(|r| r.id())
        .collect();

    match matches.as_slice() {
        [] => Ok(Resolution::Missing),
        [only] => Ok(Resolution::Found(*only)),
        _ => Err(ImportError::FieldValueError {
            file: row.file.clone(),
            row: row.row_number,
            field: name_key,
            message: format!(
                "{} {} named \"{}\"; use {} instead",
                matches.len(),
                kind,
                name,
                id_key
            ),
        }),
    }
}
