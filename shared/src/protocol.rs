//! REST endpoint definitions.
//!
//! The backend exposes one collection per entity under `/api/{collection}/`
//! (trailing slashes are part of the contract) plus a few dashboard queries.

use serde::{Deserialize, Serialize};

use crate::{API_PREFIX, RecordId, Resource};

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A method + path pair relative to the backend base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: HttpMethod,
    pub path: String,
}

impl Endpoint {
    fn new(method: HttpMethod, path: String) -> Self {
        Self { method, path }
    }

    pub fn list<R: Resource>() -> Self {
        Self::new(HttpMethod::Get, collection_path(R::COLLECTION))
    }

    pub fn get<R: Resource>(id: &RecordId) -> Self {
        Self::new(HttpMethod::Get, item_path(R::COLLECTION, id))
    }

    pub fn create<R: Resource>() -> Self {
        Self::new(HttpMethod::Post, collection_path(R::COLLECTION))
    }

    pub fn update<R: Resource>(id: &RecordId) -> Self {
        Self::new(HttpMethod::Put, item_path(R::COLLECTION, id))
    }

    pub fn delete<R: Resource>(id: &RecordId) -> Self {
        Self::new(HttpMethod::Delete, item_path(R::COLLECTION, id))
    }

    pub fn dashboard(query: DashboardQuery) -> Self {
        Self::new(HttpMethod::Get, query.path().to_string())
    }

    /// `GET /api/bikes/` style label used in logs and error messages
    pub fn describe(&self) -> String {
        format!("{} {}", self.method.as_str(), self.path)
    }
}

/// Aggregate queries served by the dashboard endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardQuery {
    Stats,
    LowStock,
    RecentSales,
    PendingServices,
}

impl DashboardQuery {
    pub fn path(&self) -> &'static str {
        match self {
            DashboardQuery::Stats => "/api/dashboard/stats/",
            DashboardQuery::LowStock => "/api/dashboard/low-stock/",
            DashboardQuery::RecentSales => "/api/dashboard/recent-sales/",
            DashboardQuery::PendingServices => "/api/dashboard/pending-services/",
        }
    }
}

fn collection_path(collection: &str) -> String {
    format!("{}/{}/", API_PREFIX, collection)
}

fn item_path(collection: &str, id: &RecordId) -> String {
    format!("{}/{}/{}/", API_PREFIX, collection, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bike, Service};

    #[test]
    fn entity_endpoints_keep_trailing_slashes() {
        let id = RecordId::new("abc");
        assert_eq!(Endpoint::list::<Bike>().describe(), "GET /api/bikes/");
        assert_eq!(Endpoint::get::<Bike>(&id).describe(), "GET /api/bikes/abc/");
        assert_eq!(Endpoint::create::<Service>().describe(), "POST /api/services/");
        assert_eq!(
            Endpoint::update::<Service>(&id).describe(),
            "PUT /api/services/abc/"
        );
        assert_eq!(
            Endpoint::delete::<Bike>(&id).describe(),
            "DELETE /api/bikes/abc/"
        );
    }

    #[test]
    fn dashboard_endpoints() {
        assert_eq!(
            Endpoint::dashboard(DashboardQuery::Stats).path,
            "/api/dashboard/stats/"
        );
        assert_eq!(
            Endpoint::dashboard(DashboardQuery::PendingServices).method,
            HttpMethod::Get
        );
    }
}
