//! 实体表单描述
//!
//! 页面是通用的，差异全部来自这里：字段列表、表格列，以及
//! 文本表单值与实体之间的转换。所有数字、日期、枚举都在提交时从
//! 文本解析，解析失败产生字段级的校验错误，不会触达后端。

use std::collections::BTreeMap;
use std::str::FromStr;

use akr_shared::date::{format_date_input, format_datetime_input, parse_date, parse_datetime};
use akr_shared::{
    Bike, Customer, Employee, Purchase, Record, RecordId, Resource, Sale, Service, ServiceStatus,
    Supplier, ValidationErrors,
};
use chrono::{DateTime, NaiveDate, Timelike, Utc};
use rust_decimal::Decimal;

// =========================================================
// 字段描述
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    LongText,
    Decimal,
    Integer,
    Date,
    DateTime,
    /// 维修状态下拉框
    Status,
    /// 指向另一张表的下拉框，值为记录 id
    Reference { collection: &'static str },
}

impl FieldKind {
    /// 对应的 `<input type=...>`
    pub fn input_type(&self) -> &'static str {
        match self {
            FieldKind::Email => "email",
            FieldKind::Decimal | FieldKind::Integer => "number",
            FieldKind::Date => "date",
            FieldKind::DateTime => "datetime-local",
            _ => "text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: &'static str,
}

impl FieldSpec {
    pub const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: true,
            default: "",
        }
    }

    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub const fn with_default(mut self, default: &'static str) -> Self {
        self.default = default;
        self
    }
}

const fn text(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec::new(name, label, FieldKind::Text)
}

const fn reference(name: &'static str, label: &'static str, collection: &'static str) -> FieldSpec {
    FieldSpec::new(name, label, FieldKind::Reference { collection })
}

// =========================================================
// 表单值
// =========================================================

/// 表单中各字段的原始文本
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues(BTreeMap<String, String>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// 缺失的字段视为空串
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// 逐字段读取表单并收集全部错误
struct FormReader<'a> {
    values: &'a FormValues,
    errors: ValidationErrors,
}

impl<'a> FormReader<'a> {
    fn new(values: &'a FormValues) -> Self {
        Self {
            values,
            errors: ValidationErrors::new(),
        }
    }

    fn raw(&self, name: &str) -> &'a str {
        self.values.get(name).trim()
    }

    fn text(&mut self, name: &str) -> String {
        let value = self.raw(name);
        if value.is_empty() {
            self.errors.push(name, "is required");
        }
        value.to_string()
    }

    fn optional_text(&mut self, name: &str) -> String {
        self.raw(name).to_string()
    }

    fn email(&mut self, name: &str) -> String {
        let value = self.raw(name);
        if value.is_empty() {
            self.errors.push(name, "is required");
        } else if !value.contains('@') {
            self.errors.push(name, "must be a valid email address");
        }
        value.to_string()
    }

    fn parse<T: FromStr>(&mut self, name: &str, message: &str) -> Option<T> {
        let value = self.raw(name);
        if value.is_empty() {
            self.errors.push(name, "is required");
            return None;
        }
        match value.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                self.errors.push(name, message);
                None
            }
        }
    }

    /// 非负金额
    fn amount(&mut self, name: &str) -> Decimal {
        match self.parse::<Decimal>(name, "must be a number") {
            Some(v) if v.is_sign_negative() && !v.is_zero() => {
                self.errors.push(name, "must not be negative");
                Decimal::ZERO
            }
            Some(v) => v,
            None => Decimal::ZERO,
        }
    }

    fn optional_amount(&mut self, name: &str) -> Option<Decimal> {
        if self.raw(name).is_empty() {
            None
        } else {
            Some(self.amount(name))
        }
    }

    fn stock(&mut self, name: &str) -> i32 {
        match self.parse::<i32>(name, "must be a whole number") {
            Some(v) if v < 0 => {
                self.errors.push(name, "must not be negative");
                0
            }
            Some(v) => v,
            None => 0,
        }
    }

    fn quantity(&mut self, name: &str) -> u32 {
        match self.parse::<i64>(name, "must be a whole number") {
            Some(v) if v <= 0 => {
                self.errors.push(name, "must be greater than zero");
                0
            }
            Some(v) => u32::try_from(v).unwrap_or_else(|_| {
                self.errors.push(name, "is too large");
                0
            }),
            None => 0,
        }
    }

    fn datetime(&mut self, name: &str) -> DateTime<Utc> {
        let value = self.raw(name);
        if value.is_empty() {
            self.errors.push(name, "is required");
            return DateTime::<Utc>::UNIX_EPOCH;
        }
        parse_datetime(value).unwrap_or_else(|| {
            self.errors.push(name, "must be a date and time (YYYY-MM-DDTHH:MM)");
            DateTime::<Utc>::UNIX_EPOCH
        })
    }

    fn optional_date(&mut self, name: &str) -> Option<NaiveDate> {
        let value = self.raw(name);
        if value.is_empty() {
            return None;
        }
        let parsed = parse_date(value);
        if parsed.is_none() {
            self.errors.push(name, "must be a date (YYYY-MM-DD)");
        }
        parsed
    }

    fn reference(&mut self, name: &str) -> RecordId {
        let value = self.raw(name);
        if value.is_empty() {
            self.errors.push(name, "must be selected");
        }
        RecordId::from(value)
    }

    fn optional_reference(&mut self, name: &str) -> Option<RecordId> {
        let value = self.raw(name);
        (!value.is_empty()).then(|| RecordId::from(value))
    }

    fn status(&mut self, name: &str) -> ServiceStatus {
        let value = self.raw(name);
        if value.is_empty() {
            return ServiceStatus::default();
        }
        value.parse().unwrap_or_else(|e: String| {
            self.errors.push(name, e);
            ServiceStatus::default()
        })
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        self.errors.into_result(value)
    }
}

// =========================================================
// EntitySchema
// =========================================================

/// 一类实体的页面描述
pub trait EntitySchema: Resource {
    /// 页面标题（复数）
    const TITLE: &'static str;
    const FIELDS: &'static [FieldSpec];
    /// 表格列头，与 `table_row` 一一对应
    const COLUMNS: &'static [&'static str];

    fn table_row(record: &Record<Self>) -> Vec<String>;

    /// 已有记录对应的表单值（编辑时填充）
    fn form_values(record: &Record<Self>) -> FormValues;

    /// 从表单文本解析出草稿
    fn parse_form(values: &FormValues) -> Result<Self, ValidationErrors>;

    /// 新建时的初始表单，日期时间字段默认为当前时刻（精确到分钟）
    fn default_values() -> FormValues {
        let now = Utc::now();
        let now = now.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(now);
        let today = format_datetime_input(&now);
        Self::FIELDS
            .iter()
            .map(|f| {
                let value = match f.kind {
                    FieldKind::DateTime if f.default.is_empty() => today.clone(),
                    _ => f.default.to_string(),
                };
                (f.name, value)
            })
            .collect()
    }

    /// 引用其他表的字段
    fn reference_fields() -> Vec<&'static FieldSpec> {
        Self::FIELDS
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::Reference { .. }))
            .collect()
    }
}

fn money(value: &Decimal) -> String {
    format!("${:.2}", value)
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

fn id_or_empty(id: &Option<RecordId>) -> String {
    id.as_ref().map(RecordId::to_string).unwrap_or_default()
}

impl EntitySchema for Bike {
    const TITLE: &'static str = "Bikes";
    const FIELDS: &'static [FieldSpec] = &[
        text("model_name", "Model Name"),
        text("brand", "Brand"),
        text("type", "Type"),
        FieldSpec::new("price", "Price", FieldKind::Decimal),
        FieldSpec::new("stock_quantity", "Stock Quantity", FieldKind::Integer).with_default("0"),
    ];
    const COLUMNS: &'static [&'static str] = &["Model", "Brand", "Type", "Price", "Stock"];

    fn table_row(r: &Record<Self>) -> Vec<String> {
        vec![
            r.model_name.clone(),
            r.brand.clone(),
            r.bike_type.clone(),
            money(&r.price),
            r.stock_quantity.to_string(),
        ]
    }

    fn form_values(r: &Record<Self>) -> FormValues {
        FormValues::new()
            .with("model_name", &r.model_name)
            .with("brand", &r.brand)
            .with("type", &r.bike_type)
            .with("price", r.price.to_string())
            .with("stock_quantity", r.stock_quantity.to_string())
    }

    fn parse_form(values: &FormValues) -> Result<Self, ValidationErrors> {
        let mut f = FormReader::new(values);
        let bike = Bike {
            model_name: f.text("model_name"),
            brand: f.text("brand"),
            bike_type: f.text("type"),
            price: f.amount("price"),
            stock_quantity: f.stock("stock_quantity"),
        };
        f.finish(bike)
    }
}

impl EntitySchema for Customer {
    const TITLE: &'static str = "Customers";
    const FIELDS: &'static [FieldSpec] = &[
        text("name", "Name"),
        FieldSpec::new("email", "Email", FieldKind::Email),
        text("phone", "Phone"),
        FieldSpec::new("address", "Address", FieldKind::LongText),
    ];
    const COLUMNS: &'static [&'static str] = &["Name", "Email", "Phone", "Address"];

    fn table_row(r: &Record<Self>) -> Vec<String> {
        vec![
            r.name.clone(),
            r.email.clone(),
            r.phone.clone(),
            r.address.clone(),
        ]
    }

    fn form_values(r: &Record<Self>) -> FormValues {
        FormValues::new()
            .with("name", &r.name)
            .with("email", &r.email)
            .with("phone", &r.phone)
            .with("address", &r.address)
    }

    fn parse_form(values: &FormValues) -> Result<Self, ValidationErrors> {
        let mut f = FormReader::new(values);
        let customer = Customer {
            name: f.text("name"),
            email: f.email("email"),
            phone: f.text("phone"),
            address: f.text("address"),
        };
        f.finish(customer)
    }
}

impl EntitySchema for Supplier {
    const TITLE: &'static str = "Suppliers";
    const FIELDS: &'static [FieldSpec] = &[
        text("name", "Name"),
        text("contact_person", "Contact Person"),
        FieldSpec::new("email", "Email", FieldKind::Email),
        text("phone", "Phone"),
        FieldSpec::new("address", "Address", FieldKind::LongText),
    ];
    const COLUMNS: &'static [&'static str] = &["Name", "Contact", "Email", "Phone", "Address"];

    fn table_row(r: &Record<Self>) -> Vec<String> {
        vec![
            r.name.clone(),
            r.contact_person.clone(),
            r.email.clone(),
            r.phone.clone(),
            r.address.clone(),
        ]
    }

    fn form_values(r: &Record<Self>) -> FormValues {
        FormValues::new()
            .with("name", &r.name)
            .with("contact_person", &r.contact_person)
            .with("email", &r.email)
            .with("phone", &r.phone)
            .with("address", &r.address)
    }

    fn parse_form(values: &FormValues) -> Result<Self, ValidationErrors> {
        let mut f = FormReader::new(values);
        let supplier = Supplier {
            name: f.text("name"),
            email: f.email("email"),
            phone: f.text("phone"),
            address: f.text("address"),
            contact_person: f.text("contact_person"),
        };
        f.finish(supplier)
    }
}

impl EntitySchema for Employee {
    const TITLE: &'static str = "Employees";
    const FIELDS: &'static [FieldSpec] = &[
        text("name", "Name"),
        FieldSpec::new("email", "Email", FieldKind::Email),
        text("phone", "Phone"),
        text("position", "Position"),
        FieldSpec::new("salary", "Salary", FieldKind::Decimal).optional(),
        FieldSpec::new("hire_date", "Hire Date", FieldKind::Date).optional(),
    ];
    const COLUMNS: &'static [&'static str] = &["Name", "Position", "Phone", "Salary", "Hire Date"];

    fn table_row(r: &Record<Self>) -> Vec<String> {
        vec![
            r.name.clone(),
            r.position.clone(),
            r.phone.clone(),
            r.salary.as_ref().map(money).unwrap_or_else(|| "-".into()),
            r.hire_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".into()),
        ]
    }

    fn form_values(r: &Record<Self>) -> FormValues {
        FormValues::new()
            .with("name", &r.name)
            .with("email", &r.email)
            .with("phone", &r.phone)
            .with("position", &r.position)
            .with(
                "salary",
                r.salary.map(|s| s.to_string()).unwrap_or_default(),
            )
            .with(
                "hire_date",
                r.hire_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            )
    }

    fn parse_form(values: &FormValues) -> Result<Self, ValidationErrors> {
        let mut f = FormReader::new(values);
        let employee = Employee {
            name: f.text("name"),
            email: f.email("email"),
            phone: f.text("phone"),
            position: f.text("position"),
            salary: f.optional_amount("salary"),
            hire_date: f.optional_date("hire_date"),
        };
        f.finish(employee)
    }
}

impl EntitySchema for Sale {
    const TITLE: &'static str = "Sales";
    const FIELDS: &'static [FieldSpec] = &[
        reference("customer_id", "Customer", "customers"),
        reference("employee_id", "Employee", "employees").optional(),
        reference("bike_id", "Bike", "bikes"),
        FieldSpec::new("quantity", "Quantity", FieldKind::Integer).with_default("1"),
        FieldSpec::new("total_amount", "Total Amount", FieldKind::Decimal),
        FieldSpec::new("sale_date", "Sale Date", FieldKind::DateTime),
    ];
    const COLUMNS: &'static [&'static str] =
        &["Date", "Customer", "Bike", "Employee", "Quantity", "Total"];

    fn table_row(r: &Record<Self>) -> Vec<String> {
        vec![
            format_date_input(&r.sale_date),
            opt(&r.customer_name),
            opt(&r.bike_name),
            opt(&r.employee_name),
            r.quantity.to_string(),
            money(&r.total_amount),
        ]
    }

    fn form_values(r: &Record<Self>) -> FormValues {
        FormValues::new()
            .with("customer_id", r.customer_id.to_string())
            .with("employee_id", id_or_empty(&r.employee_id))
            .with("bike_id", r.bike_id.to_string())
            .with("quantity", r.quantity.to_string())
            .with("total_amount", r.total_amount.to_string())
            .with("sale_date", format_datetime_input(&r.sale_date))
    }

    fn parse_form(values: &FormValues) -> Result<Self, ValidationErrors> {
        let mut f = FormReader::new(values);
        let sale = Sale {
            customer_id: f.reference("customer_id"),
            bike_id: f.reference("bike_id"),
            employee_id: f.optional_reference("employee_id"),
            quantity: f.quantity("quantity"),
            total_amount: f.amount("total_amount"),
            sale_date: f.datetime("sale_date"),
            customer_name: None,
            bike_name: None,
            employee_name: None,
        };
        f.finish(sale)
    }
}

impl EntitySchema for Purchase {
    const TITLE: &'static str = "Purchases";
    const FIELDS: &'static [FieldSpec] = &[
        reference("supplier_id", "Supplier", "suppliers"),
        reference("bike_id", "Bike", "bikes"),
        FieldSpec::new("quantity", "Quantity", FieldKind::Integer).with_default("1"),
        FieldSpec::new("unit_cost", "Unit Cost", FieldKind::Decimal),
        FieldSpec::new("total_cost", "Total Cost", FieldKind::Decimal).optional(),
        FieldSpec::new("purchase_date", "Purchase Date", FieldKind::DateTime),
    ];
    const COLUMNS: &'static [&'static str] =
        &["Date", "Supplier", "Bike", "Quantity", "Unit Cost", "Total"];

    fn table_row(r: &Record<Self>) -> Vec<String> {
        vec![
            format_date_input(&r.purchase_date),
            opt(&r.supplier_name),
            opt(&r.bike_name),
            r.quantity.to_string(),
            money(&r.unit_cost),
            money(&r.total_cost),
        ]
    }

    fn form_values(r: &Record<Self>) -> FormValues {
        FormValues::new()
            .with("supplier_id", r.supplier_id.to_string())
            .with("bike_id", r.bike_id.to_string())
            .with("quantity", r.quantity.to_string())
            .with("unit_cost", r.unit_cost.to_string())
            .with("total_cost", r.total_cost.to_string())
            .with("purchase_date", format_datetime_input(&r.purchase_date))
    }

    /// 总成本留空时按 单价 × 数量 计算
    fn parse_form(values: &FormValues) -> Result<Self, ValidationErrors> {
        let mut f = FormReader::new(values);
        let quantity = f.quantity("quantity");
        let unit_cost = f.amount("unit_cost");
        let total_cost = match f.optional_amount("total_cost") {
            Some(total) => total,
            None => unit_cost.checked_mul(Decimal::from(quantity)).unwrap_or_else(|| {
                f.errors.push("total_cost", "is too large");
                Decimal::ZERO
            }),
        };
        let purchase = Purchase {
            supplier_id: f.reference("supplier_id"),
            bike_id: f.reference("bike_id"),
            quantity,
            unit_cost,
            total_cost,
            purchase_date: f.datetime("purchase_date"),
            supplier_name: None,
            bike_name: None,
        };
        f.finish(purchase)
    }
}

impl EntitySchema for Service {
    const TITLE: &'static str = "Services";
    const FIELDS: &'static [FieldSpec] = &[
        reference("customer_id", "Customer", "customers"),
        reference("employee_id", "Employee", "employees").optional(),
        reference("bike_id", "Bike", "bikes").optional(),
        text("service_type", "Service Type"),
        FieldSpec::new("description", "Description", FieldKind::LongText).optional(),
        FieldSpec::new("cost", "Cost", FieldKind::Decimal),
        FieldSpec::new("service_date", "Service Date", FieldKind::DateTime),
        FieldSpec::new("status", "Status", FieldKind::Status).with_default("pending"),
    ];
    const COLUMNS: &'static [&'static str] =
        &["Date", "Customer", "Bike", "Type", "Cost", "Status"];

    fn table_row(r: &Record<Self>) -> Vec<String> {
        vec![
            format_date_input(&r.service_date),
            opt(&r.customer_name),
            opt(&r.bike_name),
            r.service_type.clone(),
            money(&r.cost),
            r.status.label().to_string(),
        ]
    }

    fn form_values(r: &Record<Self>) -> FormValues {
        FormValues::new()
            .with("customer_id", r.customer_id.to_string())
            .with("employee_id", id_or_empty(&r.employee_id))
            .with("bike_id", id_or_empty(&r.bike_id))
            .with("service_type", &r.service_type)
            .with("description", &r.description)
            .with("cost", r.cost.to_string())
            .with("service_date", format_datetime_input(&r.service_date))
            .with("status", r.status.as_str())
    }

    fn parse_form(values: &FormValues) -> Result<Self, ValidationErrors> {
        let mut f = FormReader::new(values);
        let service = Service {
            customer_id: f.reference("customer_id"),
            bike_id: f.optional_reference("bike_id"),
            employee_id: f.optional_reference("employee_id"),
            service_type: f.text("service_type"),
            description: f.optional_text("description"),
            cost: f.amount("cost"),
            service_date: f.datetime("service_date"),
            status: f.status("status"),
            customer_name: None,
            bike_name: None,
            employee_name: None,
        };
        f.finish(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bike_form(price: &str, stock: &str) -> FormValues {
        [
            ("model_name", "Trail X"),
            ("brand", "Acme"),
            ("type", "MTB"),
            ("price", price),
            ("stock_quantity", stock),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn parses_a_valid_bike() {
        let bike = Bike::parse_form(&bike_form("499.99", "10")).unwrap();
        assert_eq!(bike.price, dec!(499.99));
        assert_eq!(bike.stock_quantity, 10);
    }

    #[test]
    fn non_numeric_and_negative_values_are_field_errors() {
        let errors = Bike::parse_form(&bike_form("abc", "-1")).unwrap_err();
        assert_eq!(errors.for_field("price"), Some("must be a number"));
        assert_eq!(errors.for_field("stock_quantity"), Some("must not be negative"));

        let errors = Bike::parse_form(&bike_form("-5", "2.5")).unwrap_err();
        assert_eq!(errors.for_field("price"), Some("must not be negative"));
        assert_eq!(errors.for_field("stock_quantity"), Some("must be a whole number"));
    }

    #[test]
    fn missing_required_fields_are_all_reported() {
        let errors = Customer::parse_form(&FormValues::new()).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.for_field("email"), Some("is required"));

        let values = FormValues::new()
            .with("name", "Jane")
            .with("email", "not-an-email")
            .with("phone", "555")
            .with("address", "4 Elm Rd");
        let errors = Customer::parse_form(&values).unwrap_err();
        assert_eq!(errors.for_field("email"), Some("must be a valid email address"));
    }

    #[test]
    fn sale_quantity_must_be_positive_and_references_selected() {
        let values = FormValues::new()
            .with("quantity", "0")
            .with("total_amount", "10")
            .with("sale_date", "2024-05-01");
        let errors = Sale::parse_form(&values).unwrap_err();
        assert_eq!(errors.for_field("quantity"), Some("must be greater than zero"));
        assert_eq!(errors.for_field("customer_id"), Some("must be selected"));
        assert_eq!(errors.for_field("bike_id"), Some("must be selected"));
        assert_eq!(errors.for_field("employee_id"), None);
    }

    #[test]
    fn purchase_total_defaults_to_unit_cost_times_quantity() {
        let values = FormValues::new()
            .with("supplier_id", "s1")
            .with("bike_id", "b1")
            .with("quantity", "4")
            .with("unit_cost", "250.50")
            .with("purchase_date", "2024-05-01");
        let purchase = Purchase::parse_form(&values).unwrap();
        assert_eq!(purchase.total_cost, dec!(1002.00));
    }

    #[test]
    fn purchase_total_overflow_is_a_field_error() {
        let values = FormValues::new()
            .with("supplier_id", "s1")
            .with("bike_id", "b1")
            .with("quantity", "2")
            .with("unit_cost", "79228162514264337593543950335")
            .with("total_cost", "")
            .with("purchase_date", "2024-05-01T09:00");
        let errors = Purchase::parse_form(&values).unwrap_err();
        assert_eq!(errors.for_field("total_cost"), Some("is too large"));
        assert_eq!(errors.for_field("unit_cost"), None);
    }

    #[test]
    fn edit_form_preserves_time_of_day() {
        let sale_date = parse_datetime("2024-05-01T14:30:00Z").unwrap();
        let record = Record {
            id: RecordId::new("s1"),
            data: Sale {
                customer_id: RecordId::new("c1"),
                bike_id: RecordId::new("b1"),
                employee_id: None,
                quantity: 1,
                total_amount: dec!(499.99),
                sale_date,
                customer_name: None,
                bike_name: None,
                employee_name: None,
            },
            created_at: None,
            updated_at: None,
        };
        let values = Sale::form_values(&record);
        assert_eq!(values.get("sale_date"), "2024-05-01T14:30");
        assert_eq!(Sale::parse_form(&values).unwrap().sale_date, sale_date);
    }

    #[test]
    fn employee_optional_fields_may_be_blank_but_email_is_required() {
        let values = FormValues::new()
            .with("name", "Priya")
            .with("email", "priya@akrbike.com")
            .with("phone", "555")
            .with("position", "Mechanic");
        let employee = Employee::parse_form(&values).unwrap();
        assert_eq!(employee.salary, None);
        assert_eq!(employee.hire_date, None);

        let errors = Employee::parse_form(&values.clone().with("email", "")).unwrap_err();
        assert_eq!(errors.for_field("email"), Some("is required"));

        let errors = Employee::parse_form(&values.clone().with("hire_date", "01/02/2023")).unwrap_err();
        assert!(errors.for_field("hire_date").is_some());
    }

    #[test]
    fn service_form_round_trips_through_record() {
        let values = FormValues::new()
            .with("customer_id", "c1")
            .with("bike_id", "")
            .with("service_type", "Tune-up")
            .with("cost", "80")
            .with("service_date", "2024-05-01")
            .with("status", "in_progress");
        let service = Service::parse_form(&values).unwrap();
        assert_eq!(service.status, ServiceStatus::InProgress);
        assert_eq!(service.bike_id, None);

        let record = Record {
            id: RecordId::new("sv1"),
            data: service.clone(),
            created_at: None,
            updated_at: None,
        };
        assert_eq!(Service::parse_form(&Service::form_values(&record)).unwrap(), service);

        let errors = Service::parse_form(&values.with("status", "done")).unwrap_err();
        assert!(errors.for_field("status").is_some());
    }

    #[test]
    fn defaults_fill_status_quantity_and_today() {
        let defaults = Service::default_values();
        assert_eq!(defaults.get("status"), "pending");
        assert_eq!(defaults.get("service_date").len(), "2024-05-01T08:30".len());
        assert!(parse_datetime(defaults.get("service_date")).is_some());
        assert_eq!(FieldKind::DateTime.input_type(), "datetime-local");

        assert_eq!(Sale::default_values().get("quantity"), "1");
        assert_eq!(
            Sale::reference_fields()
                .iter()
                .map(|f| f.name)
                .collect::<Vec<_>>(),
            vec!["customer_id", "employee_id", "bike_id"]
        );
    }
}
