// ==========================================
// 钻井作业计划系统 - 作业计划 API
// ==========================================
// 职责: 实体增删改查的统一入口
// 每个调用一个事务: 校验与写入在同一事务内完成, 失败不留部分状态
// 存储通过 Store 注入 (MemoryStore / SqliteStore)
// ==========================================

use crate::api::crud;
use crate::api::error::{ApiError, ApiResult};
use crate::api::query::{apply_query, ListQuery, NameIndex, Page};
use crate::api::resource::{Draft, Patch, Resource};
use crate::config::Settings;
use crate::domain::AuditLog;
use crate::repository::Store;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

// ==========================================
// CampaignApi
// ==========================================

/// 作业计划 API
///
/// 职责:
/// 1. create / get / update / delete / list (全部实体)
/// 2. 试运行创建 (校验后丢弃)
/// 3. 审计日志查询
pub struct CampaignApi<S: Store> {
    store: Arc<S>,
    settings: Settings,
}

impl<S: Store> CampaignApi<S> {
    /// 使用默认设置创建
    pub fn new(store: Arc<S>) -> Self {
        Self::with_settings(store, Settings::default())
    }

    pub fn with_settings(store: Arc<S>, settings: Settings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// 创建记录
    ///
    /// # 参数
    /// - draft: 创建入参 (决定目标实体)
    /// - actor: 操作人, 写入审计日志
    ///
    /// # 返回
    /// - Ok(实体): id 与 created_at 由服务端分配
    /// - Err(ApiError::Validation | Conflict): 校验失败, 未写入
    pub fn create<D: Draft>(&self, draft: D, actor: Option<&str>) -> ApiResult<D::Target> {
        self.store
            .transaction(|tx| crud::create_in::<D::Target>(tx, draft, actor))
    }

    /// 执行与 create 相同的校验与写入, 然后回滚
    pub fn validate_create<D: Draft>(&self, draft: D) -> ApiResult<D::Target> {
        self.store
            .dry_run(|tx| crud::create_in::<D::Target>(tx, draft, None))
    }

    /// 按 id 读取
    ///
    /// # 返回
    /// - Err(ApiError::NotFound): 记录不存在
    pub fn get<R: Resource>(&self, id: Uuid) -> ApiResult<R> {
        debug!(entity = %R::KIND, id = %id, "读取记录");
        self.store.read(|tx| {
            tx.fetch::<R>(id)?
                .ok_or_else(|| ApiError::not_found(R::KIND, id))
        })
    }

    /// 部分更新
    ///
    /// # 规则
    /// - 缺省字段保持原值; 可空引用显式 null 表示清空
    /// - 更新后的完整实体重新执行全部校验
    pub fn update<P: Patch>(
        &self,
        id: Uuid,
        patch: P,
        actor: Option<&str>,
    ) -> ApiResult<P::Target> {
        self.store
            .transaction(|tx| crud::update_in::<P::Target>(tx, id, patch, actor))
    }

    /// 删除记录, 依赖按删除策略处理
    ///
    /// # 返回
    /// - Err(ApiError::NotFound): 记录不存在
    /// - Err(ApiError::Conflict): 存在受保护的引用
    pub fn delete<R: Resource>(&self, id: Uuid, actor: Option<&str>) -> ApiResult<()> {
        self.store
            .transaction(|tx| crud::delete_in::<R>(tx, id, actor))?;
        info!(entity = %R::KIND, id = %id, actor = ?actor, "删除完成");
        Ok(())
    }

    /// 列表查询 (过滤 / 搜索 / 排序 / 分页)
    pub fn list<R: Resource>(&self, query: &ListQuery) -> ApiResult<Page<R>> {
        let settings = &self.settings.list;
        let page = self.store.read(|tx| {
            let items = tx.fetch_all::<R>()?;
            let names = NameIndex::build(tx, R::RELATED)?;
            apply_query(items, query, &names, settings)
        })?;
        debug!(entity = %R::KIND, count = page.count, returned = page.results.len(), "列表查询");
        Ok(page)
    }

    /// 审计日志查询
    pub fn list_audit(&self, query: &ListQuery) -> ApiResult<Page<AuditLog>> {
        let settings = &self.settings.list;
        self.store.read(|tx| {
            let entries = tx.list_audit()?;
            apply_query(entries, query, &NameIndex::default(), settings)
        })
    }
}

impl<S: Store> Clone for CampaignApi<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            settings: self.settings.clone(),
        }
    }
}
