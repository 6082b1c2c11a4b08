use std::rc::Rc;

use akr_shared::protocol::{DashboardQuery, Endpoint};
use akr_shared::{AppError, AppResult, Bike, DashboardStats, Record, Sale, Service};
use serde::de::DeserializeOwned;

use crate::web::{FetchClient, HttpClient, HttpRequest, HttpResponse};

/// REST 后端客户端
///
/// 只负责拼接 URL、发送请求与映射状态码；实体语义由仓库层处理。
pub struct AkrApi<C = FetchClient> {
    pub base_url: String,
    client: Rc<C>,
}

impl<C> Clone for AkrApi<C> {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            client: self.client.clone(),
        }
    }
}

impl AkrApi<FetchClient> {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, FetchClient)
    }
}

impl<C: HttpClient> AkrApi<C> {
    pub fn with_client(base_url: impl Into<String>, client: C) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Rc::new(client),
        }
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// 发送请求，非 2xx 响应映射为对应的错误类型
    pub async fn send(&self, endpoint: &Endpoint, body: Option<String>) -> AppResult<HttpResponse> {
        let mut req = HttpRequest::new(&self.url(&endpoint.path), endpoint.method)
            .with_header("Accept", "application/json");
        if let Some(body) = body {
            req = req.with_json(body);
        }

        log::debug!("[Api] {}", endpoint.describe());
        let res = self.client.send(req).await.map_err(|e| {
            log::error!("[Api] {} failed: {}", endpoint.describe(), e);
            AppError::from(e)
        })?;

        if !res.ok() {
            log::warn!("[Api] {} -> HTTP {}", endpoint.describe(), res.status);
            return Err(AppError::from_status(
                res.status,
                &res.body,
                &endpoint.describe(),
            ));
        }
        Ok(res)
    }

    /// 发送请求并解析 JSON 响应
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        body: Option<String>,
    ) -> AppResult<T> {
        let res = self.send(endpoint, body).await?;
        res.json()
            .map_err(|e| AppError::backend(format!("{}: {}", endpoint.describe(), e)))
    }

    /// 获取仪表盘统计
    pub async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        self.fetch(&Endpoint::dashboard(DashboardQuery::Stats), None)
            .await
    }

    pub async fn low_stock_bikes(&self) -> AppResult<Vec<Record<Bike>>> {
        self.fetch(&Endpoint::dashboard(DashboardQuery::LowStock), None)
            .await
    }

    pub async fn recent_sales(&self) -> AppResult<Vec<Record<Sale>>> {
        self.fetch(&Endpoint::dashboard(DashboardQuery::RecentSales), None)
            .await
    }

    pub async fn pending_services(&self) -> AppResult<Vec<Record<Service>>> {
        self.fetch(&Endpoint::dashboard(DashboardQuery::PendingServices), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::MockHttpClient;
    use akr_shared::ErrorKind;
    use akr_shared::protocol::HttpMethod;
    use serde_json::json;

    #[test]
    fn strips_trailing_slash_from_base_url() {
        let api = AkrApi::with_client("http://localhost:8000/", MockHttpClient::new());
        assert_eq!(
            api.url("/api/bikes/"),
            "http://localhost:8000/api/bikes/"
        );
    }

    #[tokio::test]
    async fn dashboard_stats_parses_payload() {
        let mock = MockHttpClient::new();
        mock.mock_response(
            HttpMethod::Get,
            "http://api.test/api/dashboard/stats/",
            200,
            json!({
                "total_bikes": 12, "total_customers": 4, "total_sales": 9,
                "total_services": 3, "low_stock": 2, "recent_sales_amount": "1520.00"
            }),
        );
        let api = AkrApi::with_client("http://api.test", mock);
        let stats = api.dashboard_stats().await.unwrap();
        assert_eq!(stats.total_bikes, 12);
        assert_eq!(stats.low_stock, 2);
    }

    #[tokio::test]
    async fn server_errors_and_garbage_are_backend_errors() {
        let mock = MockHttpClient::new();
        mock.mock_raw(HttpMethod::Get, "http://api.test/api/dashboard/stats/", 500, "boom");
        mock.mock_raw(HttpMethod::Get, "http://api.test/api/dashboard/low-stock/", 200, "<html>");
        let api = AkrApi::with_client("http://api.test", mock);

        assert_eq!(
            api.dashboard_stats().await.unwrap_err().kind(),
            ErrorKind::Backend
        );
        let err = api.low_stock_bikes().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert!(err.to_string().contains("响应解析失败"));
    }
}
