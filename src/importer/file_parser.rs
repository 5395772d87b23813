// ==========================================
// 钻井作业计划系统 - 导出文件解析
// ==========================================
// 支持: CSV (.csv, 首行表头) / JSON (.json)
// JSON: 顶层数组, 或包含 items / data / results 数组的对象
// 空单元格与 null 视为缺省值
// ==========================================

use crate::domain::UnknownVariant;
use crate::importer::error::{ImportError, ImportResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

const JSON_LIST_KEYS: [&str; 3] = ["items", "data", "results"];

// ==========================================
// DumpFormat / DumpFile
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpFormat {
    Csv,
    Json,
}

impl DumpFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DumpFormat::Csv => "csv",
            DumpFormat::Json => "json",
        }
    }

    /// 按扩展名识别格式 (不区分大小写)
    pub fn from_path(path: &Path) -> ImportResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Ok(DumpFormat::Csv),
            "json" => Ok(DumpFormat::Json),
            _ => Err(ImportError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpFile {
    pub path: PathBuf,
    pub format: DumpFormat,
}

impl DumpFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// 在目录中查找 `<stem>.csv` / `<stem>.json`
///
/// # 返回
/// - None: 两者都不存在 (该实体跳过)
/// - 两者都存在时取 CSV 并记录警告
pub async fn locate(dir: &Path, stem: &str) -> ImportResult<Option<DumpFile>> {
    let mut found = Vec::new();
    for format in [DumpFormat::Csv, DumpFormat::Json] {
        let path = dir.join(format!("{}.{}", stem, format.extension()));
        if tokio::fs::try_exists(&path).await? {
            found.push(DumpFile { path, format });
        }
    }
    if found.len() > 1 {
        tracing::warn!(stem = stem, "同时存在 .csv 与 .json, 使用 .csv");
    }
    Ok(found.into_iter().next())
}

// ==========================================
// RawRow - 一行原始数据
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub file: String,
    pub row_number: usize, // CSV 为文件行号 (表头为第 1 行), JSON 为数组下标 + 1
    values: BTreeMap<String, Value>,
}

impl RawRow {
    pub fn new(file: impl Into<String>, row_number: usize, values: BTreeMap<String, Value>) -> Self {
        Self {
            file: file.into(),
            row_number,
            values,
        }
    }

    fn field_error(&self, field: &str, message: impl Into<String>) -> ImportError {
        ImportError::FieldValueError {
            file: self.file.clone(),
            row: self.row_number,
            field: field.to_string(),
            message: message.into(),
        }
    }

    fn present(&self, key: &str) -> Option<&Value> {
        match self.values.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(v) => Some(v),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.present(key).is_some()
    }

    /// 文本值 (去首尾空白); 数字与布尔转为字符串
    pub fn text(&self, key: &str) -> Option<String> {
        self.present(key).map(|v| match v {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        })
    }

    pub fn uuid(&self, key: &str) -> ImportResult<Option<Uuid>> {
        self.text(key)
            .map(|s| {
                Uuid::parse_str(&s).map_err(|_| self.field_error(key, format!("\"{}\" is not a valid UUID", s)))
            })
            .transpose()
    }

    /// 日期 YYYY-MM-DD
    pub fn date(&self, key: &str) -> ImportResult<Option<NaiveDate>> {
        self.text(key)
            .map(|s| {
                NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .map_err(|_| self.field_error(key, format!("\"{}\" is not a valid date (YYYY-MM-DD)", s)))
            })
            .transpose()
    }

    pub fn required_date(&self, key: &str) -> ImportResult<NaiveDate> {
        self.date(key)?
            .ok_or_else(|| self.field_error(key, "this field is required"))
    }

    /// 时间: RFC 3339 (转 UTC) 或 `YYYY-MM-DD[T| ]HH:MM:SS[.f]`
    pub fn datetime(&self, key: &str) -> ImportResult<Option<NaiveDateTime>> {
        let Some(s) = self.text(key) else {
            return Ok(None);
        };
        if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
            return Ok(Some(dt.naive_utc()));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(&s, fmt).ok())
            .map(Some)
            .ok_or_else(|| self.field_error(key, format!("\"{}\" is not a valid datetime", s)))
    }

    pub fn decimal(&self, key: &str) -> ImportResult<Option<f64>> {
        match self.present(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.field_error(key, "number out of range")),
            Some(_) => {
                let s = self.text(key).unwrap_or_default();
                s.parse::<f64>()
                    .map(Some)
                    .map_err(|_| self.field_error(key, format!("\"{}\" is not a valid number", s)))
            }
        }
    }

    /// 枚举值 (不区分大小写)
    pub fn choice<T>(&self, key: &str) -> ImportResult<Option<T>>
    where
        T: FromStr<Err = UnknownVariant>,
    {
        self.text(key)
            .map(|s| s.parse::<T>().map_err(|e| self.field_error(key, e.to_string())))
            .transpose()
    }

    /// JSON 字段: JSON 文本或 JSON 值; 无法解析的文本视为缺省
    pub fn json(&self, key: &str) -> Option<Value> {
        match self.present(key)? {
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(
                        file = %self.file,
                        row = self.row_number,
                        field = key,
                        error = %e,
                        "JSON 文本无法解析, 按缺省处理"
                    );
                    None
                }
            },
            other => Some(other.clone()),
        }
    }
}

// ==========================================
// 解析
// ==========================================

/// 按格式解析文件内容
pub fn parse_content(format: DumpFormat, file_name: &str, content: &str) -> ImportResult<Vec<RawRow>> {
    match format {
        DumpFormat::Csv => parse_csv(file_name, content),
        DumpFormat::Json => parse_json(file_name, content),
    }
}

/// 解析 CSV: 首行表头, 完全空白的行跳过
pub fn parse_csv(file_name: &str, content: &str) -> ImportResult<Vec<RawRow>> {
    // 去掉 UTF-8 BOM
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // 允许行长度不一致
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let row_number = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);

        let mut values = BTreeMap::new();
        for (col_idx, value) in record.iter().enumerate() {
            let Some(header) = headers.get(col_idx) else {
                continue;
            };
            let value = value.trim();
            if !value.is_empty() {
                values.insert(header.clone(), Value::String(value.to_string()));
            }
        }

        if values.is_empty() {
            continue;
        }
        rows.push(RawRow::new(file_name, row_number, values));
    }

    Ok(rows)
}

/// 解析 JSON: 数组元素必须是对象
pub fn parse_json(file_name: &str, content: &str) -> ImportResult<Vec<RawRow>> {
    let data: Value = serde_json::from_str(content)?;
    let items = match data {
        Value::Array(items) => items,
        Value::Object(mut map) => JSON_LIST_KEYS
            .iter()
            .find_map(|k| match map.remove(*k) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| {
                ImportError::JsonParseError(format!("{}: JSON must be an array", file_name))
            })?,
        _ => {
            return Err(ImportError::JsonParseError(format!(
                "{}: JSON must be an array",
                file_name
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(map) => Ok(RawRow::new(file_name, idx + 1, map.into_iter().collect())),
            _ => Err(ImportError::JsonParseError(format!(
                "{}: element {} is not an object",
                file_name,
                idx + 1
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RigKind;

    #[test]
    fn test_csv_row_numbers_and_blank_cells() {
        let content = "id,name,rig_kind,day_rate\n,Rig A,MMWU,125000\n,,,\n,Rig B,,\n";
        let rows = parse_csv("rigs.csv", content).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].text("name").as_deref(), Some("Rig A"));
        assert_eq!(rows[0].choice::<RigKind>("rig_kind").unwrap(), Some(RigKind::Mmwu));
        assert_eq!(rows[0].decimal("day_rate").unwrap(), Some(125000.0));
        assert!(!rows[0].has("id"));

        assert_eq!(rows[1].row_number, 4);
        assert_eq!(rows[1].decimal("day_rate").unwrap(), None);
    }

    #[test]
    fn test_json_wrapped_list_and_json_fields() {
        let content = r#"{"results": [
            {"name": "P-1", "extras": "{\"cost\": 5}", "dependencies": ["a"], "params": "not json"}
        ]}"#;
        let rows = parse_json("projects.json", content).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row_number, 1);
        assert_eq!(rows[0].json("extras"), Some(serde_json::json!({"cost": 5})));
        assert_eq!(rows[0].json("dependencies"), Some(serde_json::json!(["a"])));
        assert_eq!(rows[0].json("params"), None);
    }

    #[test]
    fn test_json_must_be_array() {
        let err = parse_json("fields.json", r#"{"name": "x"}"#).unwrap_err();
        assert!(matches!(err, ImportError::JsonParseError(_)));
    }

    #[test]
    fn test_bad_values_report_file_row_and_field() {
        let rows = parse_csv("windows.csv", "start_date,id\n2025-13-01,nope\n").unwrap();
        let err = rows[0].date("start_date").unwrap_err();
        assert!(matches!(
            err,
            ImportError::FieldValueError { ref file, row: 2, ref field, .. }
                if file == "windows.csv" && field == "start_date"
        ));
        assert!(rows[0].uuid("id").is_err());
    }

    #[test]
    fn test_datetime_formats() {
        let rows = parse_json(
            "calc_runs.json",
            r#"[{"a": "2025-01-02T03:04:05Z", "b": "2025-01-02 03:04:05"}]"#,
        )
        .unwrap();
        let expected = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(rows[0].datetime("a").unwrap(), Some(expected));
        assert_eq!(rows[0].datetime("b").unwrap(), Some(expected));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(DumpFormat::from_path(Path::new("a/fields.CSV")).unwrap(), DumpFormat::Csv);
        assert!(matches!(
            DumpFormat::from_path(Path::new("fields.xlsx")),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }
}
