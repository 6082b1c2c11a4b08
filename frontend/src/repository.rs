//! 实体仓库模块
//!
//! 每类实体一个类型化的仓库，三种实现共享同一 trait：
//! - `RestRepository`: `/api/{collection}/` REST 接口
//! - `PostgrestRepository`: 托管数据库的 PostgREST 接口
//! - `MemoryRepository`: 进程内演示数据，同时作为测试替身
//!
//! 每个调用恰好一次往返，不重试、不缓存。

mod memory;
mod postgrest;
mod rest;


pub use memory::{MemoryRepository, MemoryStore};
pub use postgrest::{PostgrestClient, PostgrestRepository, Query, flatten_joins};
pub use rest::RestRepository;

use akr_shared::{AppError, AppResult, Record, RecordId, Resource};

// 定义仓库 Trait
#[async_trait::async_trait(?Send)]
pub trait Repository<R: Resource> {
    /// 全部记录，最新创建的在前
    async fn list(&self) -> AppResult<Vec<Record<R>>>;

    async fn get(&self, id: &RecordId) -> AppResult<Record<R>>;

    /// 创建记录，返回带有服务端 id 与时间戳的结果
    async fn create(&self, draft: &R) -> AppResult<Record<R>>;

    async fn update(&self, id: &RecordId, patch: &R::Patch) -> AppResult<Record<R>>;

    async fn delete(&self, id: &RecordId) -> AppResult<()>;
}

/// 把底层的 NotFound 改写为带实体名的消息，其他错误原样返回
fn label_not_found<R: Resource>(err: AppError, id: &RecordId) -> AppError {
    if err.is_not_found() {
        AppError::not_found(R::LABEL, id)
    } else {
        err
    }
}
