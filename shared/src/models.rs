//! 业务实体定义
//!
//! 每个实体结构体只包含客户端可写的字段（草稿），
//! 持久化后由 [`crate::Record`] 补上 id 与时间戳。
//! 形如 `customer_name` 的只读列由后端联表生成，永不序列化回后端。

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::date;
use crate::{Join, RecordId, Resource};

const CUSTOMER_JOIN: Join = Join {
    alias: "customer",
    table: "customers",
    columns: &["name"],
    target: "customer_name",
};

const SUPPLIER_JOIN: Join = Join {
    alias: "supplier",
    table: "suppliers",
    columns: &["name"],
    target: "supplier_name",
};

const EMPLOYEE_JOIN: Join = Join {
    alias: "employee",
    table: "employees",
    columns: &["name"],
    target: "employee_name",
};

const BIKE_JOIN: Join = Join {
    alias: "bike",
    table: "bikes",
    columns: &["brand", "model_name"],
    target: "bike_name",
};

// =========================================================
// Bike
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bike {
    pub model_name: String,
    pub brand: String,
    #[serde(rename = "type")]
    pub bike_type: String,
    pub price: Decimal,
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BikePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub bike_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i32>,
}

impl From<Bike> for BikePatch {
    fn from(b: Bike) -> Self {
        Self {
            model_name: Some(b.model_name),
            brand: Some(b.brand),
            bike_type: Some(b.bike_type),
            price: Some(b.price),
            stock_quantity: Some(b.stock_quantity),
        }
    }
}

impl Resource for Bike {
    const COLLECTION: &'static str = "bikes";
    const LABEL: &'static str = "Bike";
    type Patch = BikePatch;

    fn display_name(&self) -> String {
        format!("{} {}", self.brand, self.model_name)
    }
}

// =========================================================
// Customer
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl From<Customer> for CustomerPatch {
    fn from(c: Customer) -> Self {
        Self {
            name: Some(c.name),
            email: Some(c.email),
            phone: Some(c.phone),
            address: Some(c.address),
        }
    }
}

impl Resource for Customer {
    const COLLECTION: &'static str = "customers";
    const LABEL: &'static str = "Customer";
    type Patch = CustomerPatch;

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

// =========================================================
// Supplier
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub contact_person: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplierPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
}

impl From<Supplier> for SupplierPatch {
    fn from(s: Supplier) -> Self {
        Self {
            name: Some(s.name),
            email: Some(s.email),
            phone: Some(s.phone),
            address: Some(s.address),
            contact_person: Some(s.contact_person),
        }
    }
}

impl Resource for Supplier {
    const COLLECTION: &'static str = "suppliers";
    const LABEL: &'static str = "Supplier";
    type Patch = SupplierPatch;

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

// =========================================================
// Employee
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: String,
    pub position: String,
    #[serde(default)]
    pub salary: Option<Decimal>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    /// `Some(None)` 清空薪资
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<Option<Decimal>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<Option<NaiveDate>>,
}

impl From<Employee> for EmployeePatch {
    fn from(e: Employee) -> Self {
        Self {
            name: Some(e.name),
            email: Some(e.email),
            phone: Some(e.phone),
            position: Some(e.position),
            salary: Some(e.salary),
            hire_date: Some(e.hire_date),
        }
    }
}

impl Resource for Employee {
    const COLLECTION: &'static str = "employees";
    const LABEL: &'static str = "Employee";
    type Patch = EmployeePatch;

    fn display_name(&self) -> String {
        format!("{} - {}", self.name, self.position)
    }
}

// =========================================================
// Sale
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub customer_id: RecordId,
    pub bike_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<RecordId>,
    pub quantity: u32,
    pub total_amount: Decimal,
    #[serde(with = "date::flexible")]
    pub sale_date: DateTime<Utc>,

    // 只读联表列
    #[serde(default, skip_serializing)]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub bike_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub employee_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bike_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<Option<RecordId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_date: Option<DateTime<Utc>>,
}

impl From<Sale> for SalePatch {
    fn from(s: Sale) -> Self {
        Self {
            customer_id: Some(s.customer_id),
            bike_id: Some(s.bike_id),
            employee_id: Some(s.employee_id),
            quantity: Some(s.quantity),
            total_amount: Some(s.total_amount),
            sale_date: Some(s.sale_date),
        }
    }
}

impl Resource for Sale {
    const COLLECTION: &'static str = "sales";
    const LABEL: &'static str = "Sale";
    const JOINS: &'static [Join] = &[CUSTOMER_JOIN, BIKE_JOIN, EMPLOYEE_JOIN];
    type Patch = SalePatch;

    fn display_name(&self) -> String {
        format!("Sale {} x{}", self.sale_date.format("%Y-%m-%d"), self.quantity)
    }
}

// =========================================================
// Purchase
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub supplier_id: RecordId,
    pub bike_id: RecordId,
    pub quantity: u32,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    #[serde(with = "date::flexible")]
    pub purchase_date: DateTime<Utc>,

    #[serde(default, skip_serializing)]
    pub supplier_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub bike_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchasePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bike_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<DateTime<Utc>>,
}

impl From<Purchase> for PurchasePatch {
    fn from(p: Purchase) -> Self {
        Self {
            supplier_id: Some(p.supplier_id),
            bike_id: Some(p.bike_id),
            quantity: Some(p.quantity),
            unit_cost: Some(p.unit_cost),
            total_cost: Some(p.total_cost),
            purchase_date: Some(p.purchase_date),
        }
    }
}

impl Resource for Purchase {
    const COLLECTION: &'static str = "purchases";
    const LABEL: &'static str = "Purchase";
    const JOINS: &'static [Join] = &[SUPPLIER_JOIN, BIKE_JOIN];
    type Patch = PurchasePatch;

    fn display_name(&self) -> String {
        format!(
            "Purchase {} x{}",
            self.purchase_date.format("%Y-%m-%d"),
            self.quantity
        )
    }
}

// =========================================================
// Service
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl ServiceStatus {
    pub const ALL: [ServiceStatus; 4] = [
        ServiceStatus::Pending,
        ServiceStatus::InProgress,
        ServiceStatus::Completed,
        ServiceStatus::Cancelled,
    ];

    /// 线上取值，与 serde 表示一致
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Pending => "pending",
            ServiceStatus::InProgress => "in_progress",
            ServiceStatus::Completed => "completed",
            ServiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceStatus::Pending => "Pending",
            ServiceStatus::InProgress => "In Progress",
            ServiceStatus::Completed => "Completed",
            ServiceStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ServiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown service status '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub customer_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bike_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<RecordId>,
    pub service_type: String,
    pub description: String,
    pub cost: Decimal,
    #[serde(with = "date::flexible")]
    pub service_date: DateTime<Utc>,
    #[serde(default)]
    pub status: ServiceStatus,

    #[serde(default, skip_serializing)]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub bike_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub employee_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bike_id: Option<Option<RecordId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<Option<RecordId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceStatus>,
}

impl From<Service> for ServicePatch {
    fn from(s: Service) -> Self {
        Self {
            customer_id: Some(s.customer_id),
            bike_id: Some(s.bike_id),
            employee_id: Some(s.employee_id),
            service_type: Some(s.service_type),
            description: Some(s.description),
            cost: Some(s.cost),
            service_date: Some(s.service_date),
            status: Some(s.status),
        }
    }
}

impl Resource for Service {
    const COLLECTION: &'static str = "services";
    const LABEL: &'static str = "Service";
    const JOINS: &'static [Join] = &[CUSTOMER_JOIN, BIKE_JOIN, EMPLOYEE_JOIN];
    type Patch = ServicePatch;

    fn display_name(&self) -> String {
        format!("{} ({})", self.service_type, self.status)
    }
}

// =========================================================
// Session User
// =========================================================

/// 当前登录用户，仅存在于内存（可选地镜像到浏览器存储）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl SessionUser {
    /// "First Last"，缺少任一部分时退回用户名
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            _ => self.username.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn read_only_join_columns_are_never_sent() {
        let json = r#"{
            "customer_id": "c1",
            "bike_id": "b1",
            "quantity": 2,
            "total_amount": 999.98,
            "sale_date": "2024-05-01",
            "customer_name": "Jane",
            "bike_name": "Acme Trail X"
        }"#;
        let sale: Sale = serde_json::from_str(json).unwrap();
        assert_eq!(sale.customer_name.as_deref(), Some("Jane"));
        assert_eq!(sale.total_amount, dec!(999.98));

        let value = serde_json::to_value(&sale).unwrap();
        assert!(value.get("customer_name").is_none());
        assert!(value.get("bike_name").is_none());
        assert!(value.get("employee_id").is_none());
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = BikePatch {
            stock_quantity: Some(3),
            ..Default::default()
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, serde_json::json!({ "stock_quantity": 3 }));
    }

    #[test]
    fn optional_patch_field_can_clear_value() {
        let patch = EmployeePatch {
            salary: Some(None),
            ..Default::default()
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, serde_json::json!({ "salary": null }));
    }

    #[test]
    fn service_status_round_trips_wire_names() {
        assert_eq!(
            "in_progress".parse::<ServiceStatus>().unwrap(),
            ServiceStatus::InProgress
        );
        assert!("done".parse::<ServiceStatus>().is_err());
        let json = serde_json::to_string(&ServiceStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }

    #[test]
    fn session_user_display_name_falls_back_to_username() {
        let mut user = SessionUser {
            id: Some("2".into()),
            username: "demo".into(),
            email: None,
            first_name: Some("Demo".into()),
            last_name: Some("User".into()),
        };
        assert_eq!(user.display_name(), "Demo User");
        user.last_name = None;
        assert_eq!(user.display_name(), "demo");
    }
}
