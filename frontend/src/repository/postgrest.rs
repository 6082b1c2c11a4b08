//! PostgREST 实现
//!
//! 托管数据库（Supabase 一类）暴露的 `/rest/v1/{table}` 接口。
//! 关联表通过嵌套 select 投影取回，随后平铺为只读的 `*_name` 列。

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use akr_shared::protocol::HttpMethod;
use akr_shared::{AppError, AppResult, Join, Record, RecordId, Resource, ValidationErrors};
use serde::Deserialize;
use serde_json::Value;
use url::form_urlencoded;

use super::{Repository, label_not_found};
use crate::serde_helper::from_value;
use crate::web::{FetchClient, HttpClient, HttpRequest};

// =========================================================
// 查询构造器
// =========================================================

/// PostgREST 查询参数
///
/// 参数按添加顺序渲染，如 `select=*&id=eq.42&order=created_at.desc`。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, key: &str, value: String) -> Self {
        self.params.push((key.to_string(), value));
        self
    }

    pub fn select(self, columns: &str) -> Self {
        self.push("select", columns.to_string())
    }

    pub fn eq(self, column: &str, value: impl fmt::Display) -> Self {
        self.push(column, format!("eq.{}", value))
    }

    pub fn lt(self, column: &str, value: impl fmt::Display) -> Self {
        self.push(column, format!("lt.{}", value))
    }

    pub fn order(self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.push("order", format!("{}.{}", column, direction))
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.params)
            .finish()
    }
}

// =========================================================
// 客户端
// =========================================================

#[derive(Deserialize)]
struct PostgrestErrorBody {
    message: String,
    #[serde(default)]
    details: Option<String>,
}

/// PostgREST 客户端，返回原始 JSON 行
pub struct PostgrestClient<C = FetchClient> {
    url: String,
    anon_key: String,
    client: Rc<C>,
}

impl<C> Clone for PostgrestClient<C> {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            anon_key: self.anon_key.clone(),
            client: self.client.clone(),
        }
    }
}

impl PostgrestClient<FetchClient> {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self::with_client(url, anon_key, FetchClient)
    }
}

impl<C: HttpClient> PostgrestClient<C> {
    pub fn with_client(url: impl Into<String>, anon_key: impl Into<String>, client: C) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            client: Rc::new(client),
        }
    }

    pub fn table_url(&self, table: &str, query: &Query) -> String {
        let base = format!("{}/rest/v1/{}", self.url, table);
        if query.is_empty() {
            base
        } else {
            format!("{}?{}", base, query.to_query_string())
        }
    }

    pub async fn select(&self, table: &str, query: &Query) -> AppResult<Vec<Value>> {
        self.execute(HttpMethod::Get, table, query, None).await
    }

    pub async fn insert(&self, table: &str, row: &Value, query: &Query) -> AppResult<Vec<Value>> {
        self.execute(HttpMethod::Post, table, query, Some(row)).await
    }

    pub async fn update(&self, table: &str, patch: &Value, query: &Query) -> AppResult<Vec<Value>> {
        self.execute(HttpMethod::Patch, table, query, Some(patch))
            .await
    }

    /// 删除并返回被删除的行
    pub async fn delete(&self, table: &str, query: &Query) -> AppResult<Vec<Value>> {
        self.execute(HttpMethod::Delete, table, query, None).await
    }

    async fn execute(
        &self,
        method: HttpMethod,
        table: &str,
        query: &Query,
        body: Option<&Value>,
    ) -> AppResult<Vec<Value>> {
        let url = self.table_url(table, query);
        let context = format!("{} {}", method.as_str(), table);

        let mut req = HttpRequest::new(&url, method)
            .with_header("apikey", &self.anon_key)
            .with_header("Authorization", &format!("Bearer {}", self.anon_key))
            .with_header("Accept", "application/json");
        if method != HttpMethod::Get {
            req = req.with_header("Prefer", "return=representation");
        }
        if let Some(body) = body {
            req = req.with_json(body.to_string());
        }

        log::debug!("[Postgrest] {}", context);
        let res = self.client.send(req).await.map_err(|e| {
            log::error!("[Postgrest] {} failed: {}", context, e);
            AppError::from(e)
        })?;

        if !res.ok() {
            log::warn!("[Postgrest] {} -> HTTP {}", context, res.status);
            return Err(postgrest_error(res.status, &res.body, &context));
        }
        if res.body.trim().is_empty() {
            return Ok(Vec::new());
        }
        res.json()
            .map_err(|e| AppError::backend(format!("{}: {}", context, e)))
    }
}

/// 约束冲突与类型错误以 `{"message": ..., "details": ...}` 返回
fn postgrest_error(status: u16, body: &str, context: &str) -> AppError {
    match status {
        400 | 409 | 422 => match serde_json::from_str::<PostgrestErrorBody>(body) {
            Ok(err) => {
                let message = match err.details {
                    Some(details) if !details.is_empty() => format!("{} ({})", err.message, details),
                    _ => err.message,
                };
                AppError::Validation(ValidationErrors::single("non_field_errors", message))
            }
            Err(_) => AppError::from_status(400, body, context),
        },
        _ => AppError::from_status(status, body, context),
    }
}

/// 把嵌套的关联对象平铺为只读列
///
/// `{"bike": {"brand": "Acme", "model_name": "Trail X"}}` 变为
/// `{"bike_name": "Acme Trail X"}`；关联为空时不写入该列。
pub fn flatten_joins(row: &mut Value, joins: &[Join]) {
    let Value::Object(map) = row else {
        return;
    };
    for join in joins {
        let Some(Value::Object(nested)) = map.remove(join.alias) else {
            continue;
        };
        let text = join
            .columns
            .iter()
            .filter_map(|c| nested.get(*c).and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        if !text.is_empty() {
            map.insert(join.target.to_string(), Value::String(text));
        }
    }
}

// =========================================================
// 仓库
// =========================================================

pub struct PostgrestRepository<R, C = FetchClient> {
    client: PostgrestClient<C>,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Resource, C: HttpClient> PostgrestRepository<R, C> {
    pub fn new(client: PostgrestClient<C>) -> Self {
        Self {
            client,
            _marker: PhantomData,
        }
    }

    /// `*` 加上全部关联投影
    pub fn select_columns() -> String {
        std::iter::once("*".to_string())
            .chain(R::JOINS.iter().map(Join::projection))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn decode(mut row: Value) -> AppResult<Record<R>> {
        flatten_joins(&mut row, R::JOINS);
        from_value(row)
    }

    fn first(rows: Vec<Value>) -> AppResult<Option<Record<R>>> {
        rows.into_iter().next().map(Self::decode).transpose()
    }
}

#[async_trait::async_trait(?Send)]
impl<R: Resource, C: HttpClient> Repository<R> for PostgrestRepository<R, C> {
    async fn list(&self) -> AppResult<Vec<Record<R>>> {
        let query = Query::new()
            .select(&Self::select_columns())
            .order("created_at", false);
        let rows = self.client.select(R::COLLECTION, &query).await?;
        rows.into_iter().map(Self::decode).collect()
    }

    async fn get(&self, id: &RecordId) -> AppResult<Record<R>> {
        let query = Query::new().select(&Self::select_columns()).eq("id", id);
        let rows = self
            .client
            .select(R::COLLECTION, &query)
            .await
            .map_err(|e| label_not_found::<R>(e, id))?;
        Self::first(rows)?.ok_or_else(|| AppError::not_found(R::LABEL, id))
    }

    async fn create(&self, draft: &R) -> AppResult<Record<R>> {
        let row = serde_json::to_value(draft)?;
        let query = Query::new().select(&Self::select_columns());
        let rows = self.client.insert(R::COLLECTION, &row, &query).await?;
        let record = Self::first(rows)?.ok_or_else(|| {
            AppError::backend(format!("insert into {} returned no rows", R::COLLECTION))
        })?;
        log::info!("[Repository] Created {} {}", R::LABEL, record.id);
        Ok(record)
    }

    async fn update(&self, id: &RecordId, patch: &R::Patch) -> AppResult<Record<R>> {
        let body = serde_json::to_value(patch)?;
        let query = Query::new().select(&Self::select_columns()).eq("id", id);
        let rows = self
            .client
            .update(R::COLLECTION, &body, &query)
            .await
            .map_err(|e| label_not_found::<R>(e, id))?;
        Self::first(rows)?.ok_or_else(|| AppError::not_found(R::LABEL, id))
    }

    async fn delete(&self, id: &RecordId) -> AppResult<()> {
        let query = Query::new().eq("id", id);
        let rows = self
            .client
            .delete(R::COLLECTION, &query)
            .await
            .map_err(|e| label_not_found::<R>(e, id))?;
        if rows.is_empty() {
            return Err(AppError::not_found(R::LABEL, id));
        }
        log::info!("[Repository] Deleted {} {}", R::LABEL, id);
        Ok(())
    }
}
