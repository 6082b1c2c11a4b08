//! 仪表盘统计
//!
//! REST 后端直接提供统计结果；其他后端由前端根据完整列表计算，
//! 计算规则与 REST 后端保持一致。

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Bike, LOW_STOCK_THRESHOLD, RECENT_SALES_DAYS, RECENT_SALES_LIMIT, Record, Sale, Service,
    ServiceStatus, sort_newest_first,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_bikes: u64,
    pub total_customers: u64,
    pub total_sales: u64,
    pub total_services: u64,
    pub low_stock: u64,
    pub recent_sales_amount: Decimal,
}

impl DashboardStats {
    /// 根据完整列表计算统计值
    ///
    /// 近期销售额为最近 30 天内创建的销售记录的总额；
    /// 没有创建时间的记录以销售日期代替。
    pub fn compute(
        bikes: &[Record<Bike>],
        total_customers: usize,
        sales: &[Record<Sale>],
        total_services: usize,
        now: DateTime<Utc>,
    ) -> Self {
        let since = now - Duration::days(RECENT_SALES_DAYS);
        let recent_sales_amount = sales
            .iter()
            .filter(|s| s.created_at.unwrap_or(s.sale_date) >= since)
            .map(|s| s.total_amount)
            .sum();

        Self {
            total_bikes: bikes.len() as u64,
            total_customers: total_customers as u64,
            total_sales: sales.len() as u64,
            total_services: total_services as u64,
            low_stock: bikes.iter().filter(|b| is_low_stock(b)).count() as u64,
            recent_sales_amount,
        }
    }
}

pub fn is_low_stock(bike: &Bike) -> bool {
    bike.stock_quantity < LOW_STOCK_THRESHOLD
}

pub fn low_stock_bikes(bikes: &[Record<Bike>]) -> Vec<Record<Bike>> {
    bikes.iter().filter(|b| is_low_stock(b)).cloned().collect()
}

/// 最近创建的若干条销售记录
pub fn recent_sales(sales: &[Record<Sale>]) -> Vec<Record<Sale>> {
    let mut sales = sales.to_vec();
    sort_newest_first(&mut sales);
    sales.truncate(RECENT_SALES_LIMIT);
    sales
}

pub fn pending_services(services: &[Record<Service>]) -> Vec<Record<Service>> {
    services
        .iter()
        .filter(|s| s.status == ServiceStatus::Pending)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordId;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn bike(id: &str, stock: i32) -> Record<Bike> {
        Record {
            id: RecordId::new(id),
            data: Bike {
                model_name: id.to_string(),
                brand: "Acme".into(),
                bike_type: "MTB".into(),
                price: dec!(100),
                stock_quantity: stock,
            },
            created_at: None,
            updated_at: None,
        }
    }

    fn sale(id: &str, amount: Decimal, days_ago: i64) -> Record<Sale> {
        let at = now() - Duration::days(days_ago);
        Record {
            id: RecordId::new(id),
            data: Sale {
                customer_id: RecordId::new("c1"),
                bike_id: RecordId::new("b1"),
                employee_id: None,
                quantity: 1,
                total_amount: amount,
                sale_date: at,
                customer_name: None,
                bike_name: None,
                employee_name: None,
            },
            created_at: Some(at),
            updated_at: None,
        }
    }

    #[test]
    fn computes_counts_low_stock_and_recent_amount() {
        let bikes = vec![bike("a", 2), bike("b", 5), bike("c", 0)];
        let sales = vec![
            sale("s1", dec!(100.50), 1),
            sale("s2", dec!(200), 29),
            sale("s3", dec!(999), 31),
        ];
        let stats = DashboardStats::compute(&bikes, 4, &sales, 7, now());

        assert_eq!(stats.total_bikes, 3);
        assert_eq!(stats.total_customers, 4);
        assert_eq!(stats.total_sales, 3);
        assert_eq!(stats.total_services, 7);
        // 库存恰好为 5 不算低库存
        assert_eq!(stats.low_stock, 2);
        assert_eq!(stats.recent_sales_amount, dec!(300.50));
    }

    #[test]
    fn recent_sales_are_newest_first_and_capped() {
        let sales: Vec<_> = (0..15)
            .map(|i| sale(&format!("s{}", i), dec!(1), i))
            .collect();
        let recent = recent_sales(&sales);
        assert_eq!(recent.len(), RECENT_SALES_LIMIT);
        assert_eq!(recent[0].id.as_str(), "s0");
    }

    #[test]
    fn stats_deserialize_from_rest_payload() {
        let json = r#"{"total_bikes":3,"total_customers":1,"total_sales":2,
            "total_services":0,"low_stock":1,"recent_sales_amount":"120.00"}"#;
        let stats: DashboardStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.recent_sales_amount, dec!(120.00));
    }
}
