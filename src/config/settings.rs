// ==========================================
// 钻井作业计划系统 - 运行时设置
// ==========================================
// 来源: config_kv 表 (global scope), 缺省取 Default
// 数据库路径: 环境变量 > 用户数据目录 > 当前目录
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "DRILLING_CAMPAIGN_DB_PATH";

const DB_FILE_NAME: &str = "drilling_campaign.db";

// ==========================================
// ListSettings - 列表分页
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSettings {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 500,
        }
    }
}

// ==========================================
// LoaderSettings - 批量导入
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderSettings {
    pub actor: String,                 // 审计日志中的操作人
    pub default_scenario_name: String, // 批次缺少方案时自动创建的方案名
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            actor: "loader".to_string(),
            default_scenario_name: "Default Scenario".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub list: ListSettings,
    pub loader: LoaderSettings,
}

/// 获取默认数据库路径
///
/// 优先级:
/// 1. 环境变量 DRILLING_CAMPAIGN_DB_PATH
/// 2. 用户数据目录/drilling-campaign/drilling_campaign.db
/// 3. ./drilling_campaign.db
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from(".").join(DB_FILE_NAME);
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("drilling-campaign");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join(DB_FILE_NAME);
        }
    }

    path.to_string_lossy().to_string()
}
