//! 进程内实现
//!
//! 以 JSON 行保存各表数据，行为与远端后端一致：分配 UUID 与时间戳，
//! 新记录排在最前，读取时解析关联表的只读列。

use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

use akr_shared::{AppError, AppResult, Record, RecordId, Resource};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Value, json};

use super::Repository;
use crate::serde_helper::{from_value, merge_json, to_object};

/// 共享的内存数据表，克隆后指向同一份数据
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Rc<RefCell<HashMap<String, Vec<Value>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 带有演示数据的存储
    pub fn with_demo_data() -> Self {
        let store = Self::new();
        store.seed(Utc::now());
        store
    }

    pub fn repository<R: Resource>(&self) -> MemoryRepository<R> {
        MemoryRepository::new(self.clone())
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables.borrow().get(table).cloned().unwrap_or_default()
    }

    pub fn len(&self, table: &str) -> usize {
        self.tables.borrow().get(table).map_or(0, Vec::len)
    }

    fn find(&self, table: &str, id: &RecordId) -> Option<Value> {
        self.tables
            .borrow()
            .get(table)?
            .iter()
            .find(|row| row_id(row) == Some(id.as_str()))
            .cloned()
    }

    fn insert_front(&self, table: &str, row: Value) {
        self.tables
            .borrow_mut()
            .entry(table.to_string())
            .or_default()
            .insert(0, row);
    }

    fn replace(&self, table: &str, id: &RecordId, row: Value) -> bool {
        let mut tables = self.tables.borrow_mut();
        let Some(slot) = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r) == Some(id.as_str())))
        else {
            return false;
        };
        *slot = row;
        true
    }

    fn remove(&self, table: &str, id: &RecordId) -> bool {
        let mut tables = self.tables.borrow_mut();
        let Some(rows) = tables.get_mut(table) else {
            return false;
        };
        let before = rows.len();
        rows.retain(|r| row_id(r) != Some(id.as_str()));
        rows.len() != before
    }

    /// 为关联列填充只读名称，如 `bike_id` -> `bike_name`
    fn resolve_joins<R: Resource>(&self, row: &mut Value) {
        for join in R::JOINS {
            let fk = format!("{}_id", join.alias);
            let Some(target_id) = row.get(&fk).and_then(Value::as_str).map(RecordId::from) else {
                continue;
            };
            let Some(related) = self.find(join.table, &target_id) else {
                continue;
            };
            let text = join
                .columns
                .iter()
                .filter_map(|c| related.get(*c).and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(" ");
            if let Value::Object(map) = row {
                map.insert(join.target.to_string(), Value::String(text));
            }
        }
    }

    fn seed(&self, now: DateTime<Utc>) {
        let at = |days: i64| timestamp(now - Duration::days(days));

        let bikes = [
            json!({"id": "b-0003", "model_name": "Metro 3", "brand": "Urbana", "type": "City",
                   "price": "649.00", "stock_quantity": 2, "created_at": at(3), "updated_at": at(3)}),
            json!({"id": "b-0002", "model_name": "Ridge 29", "brand": "Summit", "type": "Mountain",
                   "price": "1299.00", "stock_quantity": 7, "created_at": at(20), "updated_at": at(20)}),
            json!({"id": "b-0001", "model_name": "Aero SL", "brand": "Velo", "type": "Road",
                   "price": "2199.99", "stock_quantity": 4, "created_at": at(60), "updated_at": at(60)}),
        ];
        let customers = [
            json!({"id": "c-0002", "name": "Ravi Kumar", "email": "ravi@example.com",
                   "phone": "555-0102", "address": "12 Market St", "created_at": at(10), "updated_at": at(10)}),
            json!({"id": "c-0001", "name": "Jane Doe", "email": "jane@example.com",
                   "phone": "555-0101", "address": "4 Elm Rd", "created_at": at(45), "updated_at": at(45)}),
        ];
        let suppliers = [json!({"id": "s-0001", "name": "Velo Distribution", "email": "orders@velo.example",
                   "phone": "555-0200", "address": "1 Depot Way", "contact_person": "Mark Lee",
                   "created_at": at(90), "updated_at": at(90)})];
        let employees = [json!({"id": "e-0001", "name": "Priya Shah", "email": "priya@akrbike.com",
                   "phone": "555-0300", "position": "Mechanic", "salary": "42000.00",
                   "hire_date": "2023-02-01", "created_at": at(120), "updated_at": at(120)})];
        let sales = [
            json!({"id": "sa-0002", "customer_id": "c-0002", "bike_id": "b-0003", "employee_id": "e-0001",
                   "quantity": 1, "total_amount": "649.00", "sale_date": at(2),
                   "created_at": at(2), "updated_at": at(2)}),
            json!({"id": "sa-0001", "customer_id": "c-0001", "bike_id": "b-0001",
                   "quantity": 1, "total_amount": "2199.99", "sale_date": at(40),
                   "created_at": at(40), "updated_at": at(40)}),
        ];
        let purchases = [json!({"id": "p-0001", "supplier_id": "s-0001", "bike_id": "b-0002", "quantity": 5,
                   "unit_cost": "900.00", "total_cost": "4500.00", "purchase_date": at(25),
                   "created_at": at(25), "updated_at": at(25)})];
        let services = [
            json!({"id": "sv-0002", "customer_id": "c-0001", "bike_id": "b-0001", "service_type": "Tune-up",
                   "description": "Gear indexing and brake bleed", "cost": "80.00", "service_date": at(1),
                   "status": "pending", "created_at": at(1), "updated_at": at(1)}),
            json!({"id": "sv-0001", "customer_id": "c-0002", "employee_id": "e-0001", "service_type": "Flat repair",
                   "description": "Rear tube replaced", "cost": "15.00", "service_date": at(8),
                   "status": "completed", "created_at": at(8), "updated_at": at(8)}),
        ];

        let mut tables = self.tables.borrow_mut();
        for (table, rows) in [
            ("bikes", bikes.to_vec()),
            ("customers", customers.to_vec()),
            ("suppliers", suppliers.to_vec()),
            ("employees", employees.to_vec()),
            ("sales", sales.to_vec()),
            ("purchases", purchases.to_vec()),
            ("services", services.to_vec()),
        ] {
            tables.insert(table.to_string(), rows);
        }
    }
}

fn row_id(row: &Value) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// =========================================================
// 仓库
// =========================================================

pub struct MemoryRepository<R> {
    store: MemoryStore,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Resource> MemoryRepository<R> {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    fn decode(&self, mut row: Value) -> AppResult<Record<R>> {
        self.store.resolve_joins::<R>(&mut row);
        from_value(row)
    }
}

#[async_trait::async_trait(?Send)]
impl<R: Resource> Repository<R> for MemoryRepository<R> {
    async fn list(&self) -> AppResult<Vec<Record<R>>> {
        self.store
            .rows(R::COLLECTION)
            .into_iter()
            .map(|row| self.decode(row))
            .collect()
    }

    async fn get(&self, id: &RecordId) -> AppResult<Record<R>> {
        let row = self
            .store
            .find(R::COLLECTION, id)
            .ok_or_else(|| AppError::not_found(R::LABEL, id))?;
        self.decode(row)
    }

    async fn create(&self, draft: &R) -> AppResult<Record<R>> {
        let mut row = to_object(draft)?;
        let id = RecordId::new(uuid::Uuid::new_v4().to_string());
        let now = timestamp(Utc::now());
        row.insert("id".into(), Value::String(id.to_string()));
        row.insert("created_at".into(), Value::String(now.clone()));
        row.insert("updated_at".into(), Value::String(now));

        let row = Value::Object(row);
        let record = self.decode(row.clone())?;
        self.store.insert_front(R::COLLECTION, row);
        log::info!("[Repository] Created {} {}", R::LABEL, id);
        Ok(record)
    }

    async fn update(&self, id: &RecordId, patch: &R::Patch) -> AppResult<Record<R>> {
        let mut row = self
            .store
            .find(R::COLLECTION, id)
            .ok_or_else(|| AppError::not_found(R::LABEL, id))?;
        merge_json(&mut row, &serde_json::to_value(patch)?);
        merge_json(&mut row, &json!({ "updated_at": timestamp(Utc::now()) }));

        // 合并结果必须仍是合法记录才写回
        let record = self.decode(row.clone())?;
        self.store.replace(R::COLLECTION, id, row);
        Ok(record)
    }

    async fn delete(&self, id: &RecordId) -> AppResult<()> {
        if !self.store.remove(R::COLLECTION, id) {
            return Err(AppError::not_found(R::LABEL, id));
        }
        log::info!("[Repository] Deleted {} {}", R::LABEL, id);
        Ok(())
    }
}
