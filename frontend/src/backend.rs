//! 数据后端
//!
//! 根据配置选择 REST / PostgREST / 内存实现，向页面提供类型化仓库与仪表盘查询。
//! REST 后端自带统计接口；其他后端由前端按相同规则从完整列表计算。

use std::rc::Rc;

use akr_shared::{
    AppError, AppResult, Bike, Customer, DashboardStats, Employee, LOW_STOCK_THRESHOLD, Record,
    RecordId, Resource, Sale, Service, ServiceStatus, Supplier, stats,
};
use chrono::Utc;
use leptos::prelude::*;

use crate::api::AkrApi;
use crate::config::BackendConfig;
use crate::repository::{
    MemoryRepository, MemoryStore, PostgrestClient, PostgrestRepository, Query, Repository,
    RestRepository, flatten_joins,
};
use crate::serde_helper::from_value;
use crate::web::{FetchClient, HttpClient};

pub enum Backend<C = FetchClient> {
    Rest(AkrApi<C>),
    Postgrest(PostgrestClient<C>),
    Memory(MemoryStore),
}

impl<C> Clone for Backend<C> {
    fn clone(&self) -> Self {
        match self {
            Backend::Rest(api) => Backend::Rest(api.clone()),
            Backend::Postgrest(client) => Backend::Postgrest(client.clone()),
            Backend::Memory(store) => Backend::Memory(store.clone()),
        }
    }
}

impl Backend<FetchClient> {
    pub fn from_config(config: &BackendConfig) -> Self {
        let backend = match config {
            BackendConfig::Rest { base_url } => Backend::Rest(AkrApi::new(base_url.as_str())),
            BackendConfig::Postgrest { url, anon_key } => {
                Backend::Postgrest(PostgrestClient::new(url.as_str(), anon_key.as_str()))
            }
            BackendConfig::Memory => Backend::Memory(MemoryStore::with_demo_data()),
        };
        log::info!("[Backend] Using {} backend", backend.name());
        backend
    }
}

impl<C: HttpClient + 'static> Backend<C> {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Rest(_) => "rest",
            Backend::Postgrest(_) => "postgrest",
            Backend::Memory(_) => "memory",
        }
    }

    /// 获取某类实体的仓库
    pub fn repository<R: Resource>(&self) -> Rc<dyn Repository<R>> {
        match self {
            Backend::Rest(api) => Rc::new(RestRepository::<R, C>::new(api.clone())),
            Backend::Postgrest(client) => Rc::new(PostgrestRepository::<R, C>::new(client.clone())),
            Backend::Memory(store) => Rc::new(MemoryRepository::<R>::new(store.clone())),
        }
    }

    pub async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        if let Backend::Rest(api) = self {
            return api.dashboard_stats().await;
        }

        let bikes = self.repository::<Bike>();
        let customers = self.repository::<Customer>();
        let sales = self.repository::<Sale>();
        let services = self.repository::<Service>();
        let (bikes, customers, sales, services) = futures::try_join!(
            bikes.list(),
            customers.list(),
            sales.list(),
            services.list()
        )?;

        Ok(DashboardStats::compute(
            &bikes,
            customers.len(),
            &sales,
            services.len(),
            Utc::now(),
        ))
    }

    pub async fn low_stock_bikes(&self) -> AppResult<Vec<Record<Bike>>> {
        match self {
            Backend::Rest(api) => api.low_stock_bikes().await,
            Backend::Postgrest(client) => {
                let query = Query::new()
                    .select("*")
                    .lt("stock_quantity", LOW_STOCK_THRESHOLD);
                client
                    .select(Bike::COLLECTION, &query)
                    .await?
                    .into_iter()
                    .map(from_value)
                    .collect()
            }
            Backend::Memory(_) => Ok(stats::low_stock_bikes(
                &self.repository::<Bike>().list().await?,
            )),
        }
    }

    /// 最近的 10 条销售
    pub async fn recent_sales(&self) -> AppResult<Vec<Record<Sale>>> {
        match self {
            Backend::Rest(api) => api.recent_sales().await,
            _ => Ok(stats::recent_sales(
                &self.repository::<Sale>().list().await?,
            )),
        }
    }

    pub async fn pending_services(&self) -> AppResult<Vec<Record<Service>>> {
        match self {
            Backend::Rest(api) => api.pending_services().await,
            Backend::Postgrest(client) => {
                let query = Query::new()
                    .select(&PostgrestRepository::<Service, C>::select_columns())
                    .eq("status", ServiceStatus::Pending.as_str())
                    .order("created_at", false);
                client
                    .select(Service::COLLECTION, &query)
                    .await?
                    .into_iter()
                    .map(|mut row| {
                        flatten_joins(&mut row, Service::JOINS);
                        from_value(row)
                    })
                    .collect()
            }
            Backend::Memory(_) => Ok(stats::pending_services(
                &self.repository::<Service>().list().await?,
            )),
        }
    }

    /// 下拉选择器的选项：(id, 显示名)
    pub async fn reference_options(&self, collection: &str) -> AppResult<Vec<(RecordId, String)>> {
        match collection {
            c if c == Bike::COLLECTION => self.options::<Bike>().await,
            c if c == Customer::COLLECTION => self.options::<Customer>().await,
            c if c == Supplier::COLLECTION => self.options::<Supplier>().await,
            c if c == Employee::COLLECTION => self.options::<Employee>().await,
            other => Err(AppError::backend(format!(
                "no reference options for '{}'",
                other
            ))),
        }
    }

    async fn options<R: Resource>(&self) -> AppResult<Vec<(RecordId, String)>> {
        let records = self.repository::<R>().list().await?;
        Ok(records
            .into_iter()
            .map(|r| {
                let label = r.display_name();
                (r.id, label)
            })
            .collect())
    }
}

// =========================================================
// Context
// =========================================================

/// 页面通过 Context 取得当前后端
///
/// `Backend` 内部持有 `Rc`，只能以本地存储的方式放进 arena。
#[derive(Clone, Copy)]
pub struct BackendContext(StoredValue<Backend, LocalStorage>);

pub fn provide_backend(backend: Backend) {
    provide_context(BackendContext(StoredValue::new_local(backend)));
}

pub fn use_backend() -> Backend {
    use_context::<BackendContext>()
        .expect("BackendContext should be provided")
        .0
        .get_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::MockHttpClient;
    use akr_shared::protocol::HttpMethod;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn memory() -> Backend<MockHttpClient> {
        Backend::Memory(MemoryStore::with_demo_data())
    }

    #[tokio::test]
    async fn memory_backend_computes_stats_from_lists() {
        let stats = memory().dashboard_stats().await.unwrap();
        assert_eq!(stats.total_bikes, 3);
        assert_eq!(stats.total_customers, 2);
        assert_eq!(stats.total_sales, 2);
        assert_eq!(stats.total_services, 2);
        // Metro 3 (2) 与 Aero SL (4)
        assert_eq!(stats.low_stock, 2);
        // 只有 2 天前的那笔销售落在 30 天窗口内
        assert_eq!(stats.recent_sales_amount, dec!(649.00));
    }

    #[tokio::test]
    async fn memory_backend_dashboard_lists() {
        let backend = memory();
        assert_eq!(backend.low_stock_bikes().await.unwrap().len(), 2);
        assert_eq!(backend.recent_sales().await.unwrap()[0].id.as_str(), "sa-0002");
        let pending = backend.pending_services().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].status, ServiceStatus::Pending);
    }

    #[tokio::test]
    async fn reference_options_use_display_names() {
        let backend = memory();
        let bikes = backend.reference_options("bikes").await.unwrap();
        assert!(bikes.contains(&(RecordId::new("b-0002"), "Summit Ridge 29".to_string())));

        let employees = backend.reference_options("employees").await.unwrap();
        assert_eq!(employees[0].1, "Priya Shah - Mechanic");

        assert!(backend.reference_options("sales").await.is_err());
    }

    #[tokio::test]
    async fn rest_backend_uses_stats_endpoint() {
        let mock = MockHttpClient::new();
        mock.mock_response(
            HttpMethod::Get,
            "http://api.test/api/dashboard/stats/",
            200,
            json!({
                "total_bikes": 1, "total_customers": 0, "total_sales": 0,
                "total_services": 0, "low_stock": 1, "recent_sales_amount": "0.00"
            }),
        );
        let backend = Backend::Rest(AkrApi::with_client("http://api.test", mock));
        assert_eq!(backend.dashboard_stats().await.unwrap().low_stock, 1);
    }

    #[tokio::test]
    async fn postgrest_low_stock_filters_server_side() {
        let mock = Rc::new(MockHttpClient::new());
        mock.mock_response(
            HttpMethod::Get,
            "https://db.test/rest/v1/bikes?select=*&stock_quantity=lt.5",
            200,
            json!([{
                "id": "b1", "model_name": "Metro", "brand": "Urbana", "type": "City",
                "price": "649.00", "stock_quantity": 2
            }]),
        );
        let backend = Backend::Postgrest(PostgrestClient::with_client(
            "https://db.test",
            "anon",
            mock.clone(),
        ));
        let bikes = backend.low_stock_bikes().await.unwrap();
        assert_eq!(bikes.len(), 1);
        assert_eq!(bikes[0].stock_quantity, 2);
    }

    #[tokio::test]
    async fn any_list_failure_fails_the_computed_stats() {
        let mock = MockHttpClient::new();
        *mock.fail_network.borrow_mut() = true;
        let backend = Backend::Postgrest(PostgrestClient::with_client("https://db.test", "anon", mock));
        assert_eq!(
            backend.dashboard_stats().await.unwrap_err().kind(),
            akr_shared::ErrorKind::Backend
        );
    }
}
