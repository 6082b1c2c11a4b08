//! AKR 共享领域模型
//!
//! 前端与任意后端实现（REST / PostgREST / 内存）共用的类型：
//! - `models`: 七类业务实体及其 Patch 类型
//! - `protocol`: REST 端点定义
//! - `error`: 统一错误分类
//! - `stats`: 仪表盘统计
//! - `date`: 宽松的日期解析

use std::fmt;
use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

pub mod date;
pub mod error;
pub mod models;
pub mod protocol;
pub mod stats;

pub use error::{AppError, AppResult, ErrorKind, FieldError, ValidationErrors};
pub use models::*;
pub use stats::DashboardStats;

// =========================================================
// 常量定义 (Constants)
// =========================================================

pub const API_PREFIX: &str = "/api";
/// 会话用户在浏览器存储中的键
pub const STORAGE_SESSION_KEY: &str = "currentUser";
/// 运行时配置覆盖在浏览器存储中的键
pub const STORAGE_CONFIG_KEY: &str = "akr_config";
/// 库存低于此值即视为低库存
pub const LOW_STOCK_THRESHOLD: i32 = 5;
pub const RECENT_SALES_DAYS: i64 = 30;
pub const RECENT_SALES_LIMIT: usize = 10;

// =========================================================
// 记录标识与通用记录封装
// =========================================================

/// 后端分配的记录 ID（UUID 字符串），分配后不可变
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// 已持久化的记录：服务端分配的 id 与时间戳 + 实体字段（JSON 中平铺）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<R> {
    pub id: RecordId,
    #[serde(flatten)]
    pub data: R,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl<R> Deref for Record<R> {
    type Target = R;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

/// 按创建时间倒序排列（最新的在前），没有时间戳的记录排在最后。
///
/// 排序是稳定的，时间相同的记录保持原有顺序。
pub fn sort_newest_first<R>(records: &mut [Record<R>]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

// =========================================================
// 资源元数据
// =========================================================

/// 关联表投影
///
/// 例如 `customer:customers(name)` 会把客户名称嵌套进销售记录，
/// 随后被平铺为只读列 `customer_name`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Join {
    pub alias: &'static str,
    pub table: &'static str,
    pub columns: &'static [&'static str],
    /// 平铺后写入的列名，多个列以空格拼接
    pub target: &'static str,
}

impl Join {
    /// PostgREST select 片段，如 `bike:bikes(brand,model_name)`
    pub fn projection(&self) -> String {
        format!("{}:{}({})", self.alias, self.table, self.columns.join(","))
    }
}

/// 一类可增删改查的业务实体
///
/// 实现者本身即“草稿”：客户端可写的字段集合，不含 id 与时间戳。
pub trait Resource:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// 表名，同时也是 REST 路径段
    const COLLECTION: &'static str;
    /// 单数显示名，如 "Bike"
    const LABEL: &'static str;
    const JOINS: &'static [Join] = &[];

    /// 部分更新；缺省字段不参与序列化
    type Patch: Clone
        + fmt::Debug
        + Default
        + PartialEq
        + Serialize
        + DeserializeOwned
        + From<Self>
        + Send
        + Sync
        + 'static;

    /// 在下拉选择器等处显示的名称
    fn display_name(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn bike_record(id: &str, created: Option<i64>) -> Record<Bike> {
        Record {
            id: RecordId::new(id),
            data: Bike {
                model_name: "Trail X".into(),
                brand: "Acme".into(),
                bike_type: "MTB".into(),
                price: dec!(499.99),
                stock_quantity: 10,
            },
            created_at: created.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
            updated_at: None,
        }
    }

    #[test]
    fn record_flattens_fields_and_parses_string_decimals() {
        let json = r#"{
            "id": "7f1c",
            "model_name": "Trail X",
            "brand": "Acme",
            "type": "MTB",
            "price": "499.99",
            "stock_quantity": 10,
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-01T10:00:00Z"
        }"#;
        let record: Record<Bike> = serde_json::from_str(json).unwrap();
        assert_eq!(record.id.as_str(), "7f1c");
        assert_eq!(record.bike_type, "MTB");
        assert_eq!(record.price, dec!(499.99));
        assert!(record.created_at.is_some());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "MTB");
        assert_eq!(value["price"], "499.99");
    }

    #[test]
    fn sort_puts_newest_first_and_untimed_last() {
        let mut records = vec![
            bike_record("old", Some(100)),
            bike_record("none", None),
            bike_record("new", Some(200)),
        ];
        sort_newest_first(&mut records);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "none"]);
    }

    #[test]
    fn join_projection_lists_columns() {
        let join = Sale::JOINS
            .iter()
            .find(|j| j.target == "bike_name")
            .unwrap();
        assert_eq!(join.projection(), "bike:bikes(brand,model_name)");
    }
}
