use super::*;
use crate::repository::{MemoryRepository, MemoryStore};
use akr_shared::{Bike, BikePatch, Customer, ErrorKind, Sale};
use rust_decimal_macros::dec;
use std::cell::Cell;

// =========================================================
// 辅助函数
// =========================================================

/// 记录调用次数的仓库包装
struct CountingRepository<R: EntitySchema> {
    inner: MemoryRepository<R>,
    calls: Cell<usize>,
}

impl<R: EntitySchema> CountingRepository<R> {
    fn new(store: &MemoryStore) -> Self {
        Self {
            inner: store.repository::<R>(),
            calls: Cell::new(0),
        }
    }

    fn bump(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

#[async_trait::async_trait(?Send)]
impl<R: EntitySchema> Repository<R> for CountingRepository<R> {
    async fn list(&self) -> AppResult<Vec<Record<R>>> {
        self.bump();
        self.inner.list().await
    }

    async fn get(&self, id: &RecordId) -> AppResult<Record<R>> {
        self.bump();
        self.inner.get(id).await
    }

    async fn create(&self, draft: &R) -> AppResult<Record<R>> {
        self.bump();
        self.inner.create(draft).await
    }

    async fn update(&self, id: &RecordId, patch: &R::Patch) -> AppResult<Record<R>> {
        self.bump();
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &RecordId) -> AppResult<()> {
        self.bump();
        self.inner.delete(id).await
    }
}

fn fill_bike(ctl: &mut ListEditController<Bike>, price: &str, stock: &str) {
    ctl.set_field("model_name", "Trail X");
    ctl.set_field("brand", "Acme");
    ctl.set_field("type", "MTB");
    ctl.set_field("price", price);
    ctl.set_field("stock_quantity", stock);
}

/// 模拟页面的一次完整提交
async fn submit(ctl: &mut ListEditController<Bike>, repo: &dyn Repository<Bike>) -> bool {
    let Some(mutation) = ctl.begin_submit() else {
        return false;
    };
    let reload = ctl.finish_submit(mutation.apply(repo).await);
    if reload {
        ctl.begin_load();
        ctl.finish_load(repo.list().await);
    }
    reload
}

// =========================================================
// 对话框与提交
// =========================================================

#[test]
fn test_starts_idle_with_defaults() {
    let ctl = ListEditController::<Bike>::new();
    assert_eq!(ctl.state(), &EditState::Idle);
    assert!(!ctl.is_dialog_open());
    assert_eq!(ctl.form().get("stock_quantity"), "0");
    assert!(ctl.records().is_empty());
}

#[test]
fn test_cancel_discards_form() {
    let mut ctl = ListEditController::<Bike>::new();
    assert!(!ctl.cancel(), "nothing to cancel while idle");

    ctl.open_create();
    ctl.set_field("brand", "Acme");
    assert!(ctl.cancel());
    assert_eq!(ctl.state(), &EditState::Idle);
    assert_eq!(ctl.form().get("brand"), "");
}

#[test]
fn test_edit_opens_the_dialog_like_create() {
    // 页面在对话框打开时加载下拉选项，编辑与新建走同一判断
    let mut ctl = ListEditController::<Bike>::new();
    let record = Record {
        id: RecordId::new("b1"),
        data: Bike::parse_form(&Bike::default_values()
            .with("model_name", "A")
            .with("brand", "B")
            .with("type", "C")
            .with("price", "1"))
        .unwrap(),
        created_at: None,
        updated_at: None,
    };
    assert!(ctl.open_edit(record));
    assert!(ctl.is_dialog_open());

    ctl.begin_submit().unwrap();
    assert!(ctl.is_dialog_open(), "still open while the request is in flight");
    ctl.finish_submit(Err(AppError::backend("HTTP 500")));
    assert!(ctl.is_dialog_open());
}

#[test]
fn test_set_field_is_ignored_while_idle() {
    let mut ctl = ListEditController::<Bike>::new();
    ctl.set_field("brand", "Acme");
    assert_eq!(ctl.form().get("brand"), "");
}

#[tokio::test]
async fn test_non_numeric_price_never_reaches_backend() {
    let store = MemoryStore::new();
    let repo = CountingRepository::<Bike>::new(&store);
    let mut ctl = ListEditController::<Bike>::new();

    ctl.open_create();
    fill_bike(&mut ctl, "abc", "10");
    assert!(!submit(&mut ctl, &repo).await);

    assert_eq!(repo.calls.get(), 0);
    assert_eq!(ctl.state(), &EditState::Creating);
    assert_eq!(ctl.form_errors().for_field("price"), Some("must be a number"));
    assert_eq!(ctl.form().get("price"), "abc", "input is kept for correction");
}

#[tokio::test]
async fn test_create_closes_dialog_and_reloads() {
    let store = MemoryStore::new();
    let repo = CountingRepository::<Bike>::new(&store);
    let mut ctl = ListEditController::<Bike>::new();

    ctl.open_create();
    fill_bike(&mut ctl, "499.99", "10");
    assert!(submit(&mut ctl, &repo).await);

    assert_eq!(ctl.state(), &EditState::Idle);
    assert_eq!(ctl.records().len(), 1);
    assert_eq!(ctl.records()[0].price, dec!(499.99));
    assert_eq!(
        ctl.notice(),
        Some(&Notice::Success("Bike created successfully".into()))
    );
    // create + list
    assert_eq!(repo.calls.get(), 2);
}

#[tokio::test]
async fn test_edit_sends_update_for_the_edited_record() {
    let store = MemoryStore::new();
    let repo = store.repository::<Bike>();
    let created = repo
        .create(&Bike {
            model_name: "Trail X".into(),
            brand: "Acme".into(),
            bike_type: "MTB".into(),
            price: dec!(499.99),
            stock_quantity: 10,
        })
        .await
        .unwrap();

    let mut ctl = ListEditController::<Bike>::new();
    assert!(ctl.open_edit(created.clone()));
    assert_eq!(ctl.dialog_title(), "Edit Bike");
    assert_eq!(ctl.form().get("price"), "499.99");

    ctl.set_field("stock_quantity", "3");
    let mutation = ctl.begin_submit().unwrap();
    assert!(ctl.is_submitting());
    assert_eq!(ctl.state().target(), Some(&created.id));
    match &mutation {
        Mutation::Update(id, patch) => {
            assert_eq!(id, &created.id);
            assert_eq!(patch.stock_quantity, Some(3));
            assert_eq!(patch.brand.as_deref(), Some("Acme"));
        }
        other => panic!("expected update, got {:?}", other),
    }

    let result = mutation.apply(&repo).await;
    assert!(ctl.finish_submit(result));
    assert_eq!(repo.get(&created.id).await.unwrap().stock_quantity, 3);
    assert_eq!(
        ctl.notice().map(Notice::message),
        Some("Bike updated successfully")
    );
}

#[test]
fn test_submitting_refuses_second_submit_and_dialog_changes() {
    let mut ctl = ListEditController::<Bike>::new();
    ctl.open_create();
    fill_bike(&mut ctl, "10", "1");

    assert!(ctl.begin_submit().is_some());
    assert!(ctl.begin_submit().is_none());
    assert!(!ctl.cancel());
    assert!(!ctl.open_create());
}

#[test]
fn test_failed_submit_returns_to_origin_state() {
    let mut ctl = ListEditController::<Bike>::new();
    ctl.open_create();
    fill_bike(&mut ctl, "10", "1");
    ctl.begin_submit().unwrap();

    let reload = ctl.finish_submit(Err(AppError::backend("HTTP 500")));
    assert!(!reload);
    assert_eq!(ctl.state(), &EditState::Creating);
    assert!(ctl.notice().unwrap().is_error());
    assert_eq!(ctl.form().get("brand"), "Acme");
}

#[test]
fn test_backend_validation_errors_are_shown_inline() {
    let mut ctl = ListEditController::<Customer>::new();
    ctl.open_create();
    for (field, value) in [
        ("name", "Jane"),
        ("email", "jane@example.com"),
        ("phone", "555"),
        ("address", "4 Elm Rd"),
    ] {
        ctl.set_field(field, value);
    }
    ctl.begin_submit().unwrap();

    let err = AppError::validation("email", "customer with this email already exists.");
    ctl.finish_submit(Err(err));
    assert_eq!(
        ctl.form_errors().for_field("email"),
        Some("customer with this email already exists.")
    );
}

#[tokio::test]
async fn test_editing_a_vanished_record_requests_reload() {
    let store = MemoryStore::new();
    let repo = store.repository::<Bike>();
    let record = Record {
        id: RecordId::new("gone"),
        data: Bike {
            model_name: "Ghost".into(),
            brand: "Acme".into(),
            bike_type: "Road".into(),
            price: dec!(1),
            stock_quantity: 1,
        },
        created_at: None,
        updated_at: None,
    };

    let mut ctl = ListEditController::<Bike>::new();
    ctl.open_edit(record.clone());
    let result = ctl.begin_submit().unwrap().apply(&repo).await;
    assert_eq!(result.as_ref().unwrap_err().kind(), ErrorKind::NotFound);

    assert!(ctl.finish_submit(result));
    assert_eq!(ctl.state(), &EditState::Editing(record));
}

// =========================================================
// 删除
// =========================================================

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let store = MemoryStore::with_demo_data();
    let repo = CountingRepository::<Bike>::new(&store);
    let mut ctl = ListEditController::<Bike>::new();

    ctl.request_delete(RecordId::new("b-0001"));
    assert_eq!(ctl.pending_delete(), Some(&RecordId::new("b-0001")));
    assert_eq!(ctl.resolve_delete(false), None);
    assert_eq!(ctl.pending_delete(), None);
    assert_eq!(ctl.resolve_delete(true), None, "confirmation is consumed");
    assert_eq!(repo.calls.get(), 0);

    ctl.request_delete(RecordId::new("b-0001"));
    let id = ctl.resolve_delete(true).unwrap();
    let reload = ctl.finish_delete(repo.delete(&id).await);
    assert!(reload);
    assert_eq!(repo.calls.get(), 1);
    assert_eq!(
        ctl.notice().map(Notice::message),
        Some("Bike deleted successfully")
    );
    assert!(store.repository::<Bike>().get(&id).await.is_err());
}

#[test]
fn test_delete_failures() {
    let mut ctl = ListEditController::<Bike>::new();
    assert!(ctl.finish_delete(Err(AppError::not_found("Bike", "b1"))));
    assert_eq!(ctl.notice().map(Notice::message), Some("Bike b1 not found"));

    assert!(!ctl.finish_delete(Err(AppError::backend("HTTP 503"))));
    assert!(ctl.notice().unwrap().is_error());
}

// =========================================================
// 列表加载
// =========================================================

#[tokio::test]
async fn test_failed_load_keeps_previous_list() {
    let store = MemoryStore::with_demo_data();
    let repo = store.repository::<Bike>();
    let mut ctl = ListEditController::<Bike>::new();

    ctl.begin_load();
    assert!(ctl.is_loading());
    ctl.finish_load(repo.list().await);
    assert!(!ctl.is_loading());
    assert_eq!(ctl.records().len(), 3);

    ctl.begin_load();
    ctl.finish_load(Err(AppError::backend("offline")));
    assert_eq!(ctl.records().len(), 3);
    assert_eq!(
        ctl.notice().map(Notice::message),
        Some("Failed to load bikes: backend error: offline")
    );

    ctl.dismiss_notice();
    assert!(ctl.notice().is_none());
}

#[test]
fn test_update_patch_is_complete() {
    // 编辑时总是发送完整的字段集合
    let patch = BikePatch::from(
        Bike::parse_form(&Bike::default_values()
            .with("model_name", "A")
            .with("brand", "B")
            .with("type", "C")
            .with("price", "1"))
        .unwrap(),
    );
    assert!(patch.model_name.is_some() && patch.price.is_some() && patch.stock_quantity.is_some());
}

#[test]
fn test_untouched_sale_date_survives_edit() {
    let sale_date = akr_shared::date::parse_datetime("2024-05-01T14:30:00Z").unwrap();
    let record = Record {
        id: RecordId::new("s1"),
        data: Sale {
            customer_id: RecordId::new("c1"),
            bike_id: RecordId::new("b1"),
            employee_id: None,
            quantity: 2,
            total_amount: dec!(998.00),
            sale_date,
            customer_name: None,
            bike_name: None,
            employee_name: None,
        },
        created_at: None,
        updated_at: None,
    };

    let mut ctl = ListEditController::<Sale>::new();
    assert!(ctl.open_edit(record));
    let Some(Mutation::Update(id, patch)) = ctl.begin_submit() else {
        panic!("expected an update");
    };
    assert_eq!(id, RecordId::new("s1"));
    assert_eq!(patch.sale_date, Some(sale_date));
}
