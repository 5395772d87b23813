// ==========================================
// 钻井作业计划系统 - 命令行入口
// ==========================================
// 用法:
//   drilling-campaign load <dump_dir> [--db <path>] [--dry-run]
//   drilling-campaign init-db [--db <path>]
// 数据库路径缺省: DRILLING_CAMPAIGN_DB_PATH > 用户数据目录 > 当前目录
// ==========================================

use anyhow::{bail, Context};
use drilling_campaign::config::{default_db_path, ConfigManager};
use drilling_campaign::importer::{BulkLoader, DumpLoader, LoadMode};
use drilling_campaign::{logging, SqliteStore, APP_NAME, VERSION};
use std::path::PathBuf;
use std::sync::Arc;

const USAGE: &str = "用法:
  drilling-campaign load <dump_dir> [--db <path>] [--dry-run]
  drilling-campaign init-db [--db <path>]";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Load {
        dump_dir: PathBuf,
        db_path: Option<String>,
        dry_run: bool,
    },
    InitDb {
        db_path: Option<String>,
    },
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Command> {
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        bail!("缺少子命令\n{}", USAGE);
    };

    let mut positional = Vec::new();
    let mut db_path = None;
    let mut dry_run = false;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                let value = args.next().context("--db 需要一个路径参数")?;
                db_path = Some(value);
            }
            "--dry-run" => dry_run = true,
            other if other.starts_with("--") => bail!("未知参数: {}\n{}", other, USAGE),
            _ => positional.push(arg),
        }
    }

    match command.as_str() {
        "load" => {
            let Some(dump_dir) = positional.into_iter().next() else {
                bail!("load 需要导出目录\n{}", USAGE);
            };
            Ok(Command::Load {
                dump_dir: PathBuf::from(dump_dir),
                db_path,
                dry_run,
            })
        }
        "init-db" => Ok(Command::InitDb { db_path }),
        other => bail!("未知子命令: {}\n{}", other, USAGE),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    tracing::info!("{} v{}", APP_NAME, VERSION);

    match parse_args(std::env::args().skip(1))? {
        Command::InitDb { db_path } => {
            let db_path = db_path.unwrap_or_else(default_db_path);
            SqliteStore::open(&db_path)
                .with_context(|| format!("无法初始化数据库: {}", db_path))?;
            tracing::info!(db_path = %db_path, "数据库已初始化");
            println!("Initialized {}", db_path);
        }
        Command::Load {
            dump_dir,
            db_path,
            dry_run,
        } => {
            let db_path = db_path.unwrap_or_else(default_db_path);
            tracing::info!(db_path = %db_path, "使用数据库");

            let store = SqliteStore::open(&db_path)
                .with_context(|| format!("无法打开数据库: {}", db_path))?;
            let settings = ConfigManager::from_connection(store.connection())
                .and_then(|cm| cm.loader_settings())
                .context("读取导入配置失败")?;

            let loader = BulkLoader::with_settings(Arc::new(store), settings);
            let mode = if dry_run {
                LoadMode::DryRun
            } else {
                LoadMode::Commit
            };
            let report = loader
                .load_dir(&dump_dir, mode)
                .await
                .with_context(|| format!("导入失败: {}", dump_dir.display()))?;

            for file in &report.files {
                println!(
                    "Loaded {} from {} (skipped {})",
                    file.loaded, file.file_name, file.skipped
                );
            }
            println!("Done. Loaded {} rows.", report.total);
            if report.dry_run {
                println!("Dry-run: rolled back");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_load() {
        let cmd = parse_args(args(&["load", "dump", "--db", "x.db", "--dry-run"])).unwrap();
        assert_eq!(
            cmd,
            Command::Load {
                dump_dir: PathBuf::from("dump"),
                db_path: Some("x.db".to_string()),
                dry_run: true,
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["load"])).is_err());
        assert!(parse_args(args(&["init-db", "--force"])).is_err());
        assert_eq!(
            parse_args(args(&["init-db"])).unwrap(),
            Command::InitDb { db_path: None }
        );
    }
}
