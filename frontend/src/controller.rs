//! 列表-编辑控制器
//!
//! 每个实体页面共用的状态机。控制器本身是同步的：
//! 需要访问后端时返回一个 [`Mutation`] 或待删除的 id，由调用方执行
//! 异步请求后再把结果交回 `finish_*`。这样任何一次后端调用都必须
//! 先经过状态检查与表单解析。
//!
//! ```text
//! Idle ──open_create──▶ Creating ──begin_submit──▶ Submitting ──ok──▶ Idle
//!  │                       ▲                           │
//!  └──open_edit──▶ Editing ┴────────── err ────────────┘
//! ```

#[cfg(test)]
mod tests;

use akr_shared::{AppError, AppResult, Record, RecordId, ValidationErrors};

use crate::repository::Repository;
use crate::schema::{EntitySchema, FormValues};

/// 对话框状态
#[derive(Debug, Clone, PartialEq)]
pub enum EditState<R> {
    Idle,
    Creating,
    Editing(Record<R>),
    /// 请求进行中；`editing` 为 `None` 表示正在创建
    Submitting { editing: Option<Record<R>> },
}

impl<R> EditState<R> {
    /// 正在提交的目标记录
    pub fn target(&self) -> Option<&RecordId> {
        match self {
            EditState::Editing(record) => Some(&record.id),
            EditState::Submitting {
                editing: Some(record),
            } => Some(&record.id),
            _ => None,
        }
    }
}

/// 一次提交对应的后端调用
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<R: EntitySchema> {
    Create(R),
    Update(RecordId, R::Patch),
}

impl<R: EntitySchema> Mutation<R> {
    /// 执行唯一的一次仓库调用
    pub async fn apply(self, repo: &dyn Repository<R>) -> AppResult<Record<R>> {
        match self {
            Mutation::Create(draft) => repo.create(&draft).await,
            Mutation::Update(id, patch) => repo.update(&id, &patch).await,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Error(m) => m,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

pub struct ListEditController<R: EntitySchema> {
    records: Vec<Record<R>>,
    state: EditState<R>,
    form: FormValues,
    form_errors: ValidationErrors,
    notice: Option<Notice>,
    pending_delete: Option<RecordId>,
    loading: bool,
}

impl<R: EntitySchema> Default for ListEditController<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: EntitySchema> ListEditController<R> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            state: EditState::Idle,
            form: R::default_values(),
            form_errors: ValidationErrors::new(),
            notice: None,
            pending_delete: None,
            loading: false,
        }
    }

    // =========================================================
    // 只读访问
    // =========================================================

    pub fn records(&self) -> &[Record<R>] {
        &self.records
    }

    pub fn state(&self) -> &EditState<R> {
        &self.state
    }

    pub fn form(&self) -> &FormValues {
        &self.form
    }

    pub fn form_errors(&self) -> &ValidationErrors {
        &self.form_errors
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn pending_delete(&self) -> Option<&RecordId> {
        self.pending_delete.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_dialog_open(&self) -> bool {
        !matches!(self.state, EditState::Idle)
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, EditState::Submitting { .. })
    }

    pub fn is_editing(&self) -> bool {
        self.state.target().is_some()
    }

    /// "Add Bike" / "Edit Bike"
    pub fn dialog_title(&self) -> String {
        if self.is_editing() {
            format!("Edit {}", R::LABEL)
        } else {
            format!("Add {}", R::LABEL)
        }
    }

    // =========================================================
    // 对话框
    // =========================================================

    /// 打开新建对话框，表单重置为默认值
    pub fn open_create(&mut self) -> bool {
        if self.is_submitting() {
            return false;
        }
        self.state = EditState::Creating;
        self.form = R::default_values();
        self.form_errors = ValidationErrors::new();
        true
    }

    /// 打开编辑对话框，表单填充为记录的当前值
    pub fn open_edit(&mut self, record: Record<R>) -> bool {
        if self.is_submitting() {
            return false;
        }
        self.form = R::form_values(&record);
        self.form_errors = ValidationErrors::new();
        self.state = EditState::Editing(record);
        true
    }

    /// 关闭对话框并丢弃表单，不访问后端
    pub fn cancel(&mut self) -> bool {
        match self.state {
            EditState::Creating | EditState::Editing(_) => {
                self.state = EditState::Idle;
                self.form = R::default_values();
                self.form_errors = ValidationErrors::new();
                true
            }
            _ => false,
        }
    }

    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        if matches!(self.state, EditState::Creating | EditState::Editing(_)) {
            self.form.set(name, value);
        }
    }

    /// 解析表单并进入 Submitting
    ///
    /// 解析失败时记录字段错误、状态不变并返回 `None`；
    /// 已在提交中时同样返回 `None`。
    pub fn begin_submit(&mut self) -> Option<Mutation<R>> {
        let editing = match &self.state {
            EditState::Creating => None,
            EditState::Editing(record) => Some(record.clone()),
            _ => return None,
        };

        let draft = match R::parse_form(&self.form) {
            Ok(draft) => draft,
            Err(errors) => {
                log::debug!("[{}] Form rejected: {}", R::TITLE, errors);
                self.form_errors = errors;
                return None;
            }
        };

        self.form_errors = ValidationErrors::new();
        let mutation = match &editing {
            Some(record) => Mutation::Update(record.id.clone(), R::Patch::from(draft)),
            None => Mutation::Create(draft),
        };
        self.state = EditState::Submitting { editing };
        Some(mutation)
    }

    /// 处理提交结果，返回是否需要重新加载列表
    pub fn finish_submit(&mut self, result: AppResult<Record<R>>) -> bool {
        let EditState::Submitting { editing } = &self.state else {
            return false;
        };
        let was_editing = editing.is_some();

        match result {
            Ok(record) => {
                log::info!("[{}] Saved {}", R::TITLE, record.id);
                self.state = EditState::Idle;
                self.form = R::default_values();
                self.form_errors = ValidationErrors::new();
                let verb = if was_editing { "updated" } else { "created" };
                self.notice = Some(Notice::Success(format!(
                    "{} {} successfully",
                    R::LABEL,
                    verb
                )));
                true
            }
            Err(err) => {
                log::warn!("[{}] Save failed: {}", R::TITLE, err);
                self.state = match std::mem::replace(&mut self.state, EditState::Idle) {
                    EditState::Submitting {
                        editing: Some(record),
                    } => EditState::Editing(record),
                    _ => EditState::Creating,
                };
                let reload = err.is_not_found();
                if let AppError::Validation(errors) = &err {
                    self.form_errors = errors.clone();
                }
                self.notice = Some(Notice::Error(err.to_string()));
                reload
            }
        }
    }

    // =========================================================
    // 删除（两步确认）
    // =========================================================

    pub fn request_delete(&mut self, id: RecordId) {
        self.pending_delete = Some(id);
    }

    /// 用户确认后返回要删除的 id；取消时返回 `None`
    pub fn resolve_delete(&mut self, confirmed: bool) -> Option<RecordId> {
        let id = self.pending_delete.take()?;
        confirmed.then_some(id)
    }

    /// 处理删除结果，返回是否需要重新加载列表
    pub fn finish_delete(&mut self, result: AppResult<()>) -> bool {
        match result {
            Ok(()) => {
                self.notice = Some(Notice::Success(format!(
                    "{} deleted successfully",
                    R::LABEL
                )));
                true
            }
            Err(err) => {
                log::warn!("[{}] Delete failed: {}", R::TITLE, err);
                let reload = err.is_not_found();
                self.notice = Some(Notice::Error(err.to_string()));
                reload
            }
        }
    }

    // =========================================================
    // 列表加载
    // =========================================================

    pub fn begin_load(&mut self) {
        self.loading = true;
    }

    /// 成功时整体替换列表；失败时保留旧列表并提示
    pub fn finish_load(&mut self, result: AppResult<Vec<Record<R>>>) {
        self.loading = false;
        match result {
            Ok(records) => self.records = records,
            Err(err) => {
                log::error!("[{}] Load failed: {}", R::TITLE, err);
                self.notice = Some(Notice::Error(format!(
                    "Failed to load {}: {}",
                    R::TITLE.to_lowercase(),
                    err
                )));
            }
        }
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}
