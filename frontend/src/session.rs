//! 会话存储模块
//!
//! 持有当前登录用户，提供登录/注销与同步的变更通知。
//! 这是一个显式对象（`Rc` 句柄），由 App 创建后注入认证上下文与路由，
//! 不存在任何全局状态。

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use akr_shared::{AppError, AppResult, STORAGE_SESSION_KEY, SessionUser};

use crate::web::KeyValueStore;

/// 会话相关的配置项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// 启动时清除已持久化的会话（强制重新登录）
    pub clear_on_start: bool,
    /// `is_logged_in` 恒为 false，无论是否已登录
    pub force_logout_for_demo: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            clear_on_start: true,
            force_logout_for_demo: false,
        }
    }
}

/// 演示账号：(用户名, 密码, 用户信息)
fn demo_account(username: &str, password: &str) -> Option<SessionUser> {
    let (id, first) = match (username, password) {
        ("admin", "admin123") => ("1", "Admin"),
        ("demo", "demo123") => ("2", "Demo"),
        _ => return None,
    };
    Some(SessionUser {
        id: Some(id.to_string()),
        username: username.to_string(),
        email: Some(format!("{}@akrbike.com", username)),
        first_name: Some(first.to_string()),
        last_name: Some("User".to_string()),
    })
}

type Listener = Rc<dyn Fn(Option<&SessionUser>)>;

struct Inner {
    current: Option<SessionUser>,
    listeners: Vec<(u64, Listener)>,
    next_listener_id: u64,
    options: SessionOptions,
    storage: Box<dyn KeyValueStore>,
}

/// 会话存储
///
/// 克隆得到的是同一会话的另一个句柄。
#[derive(Clone)]
pub struct SessionStore {
    inner: Rc<RefCell<Inner>>,
}

impl SessionStore {
    /// 创建会话存储
    ///
    /// `clear_on_start` 时删除持久化的用户；否则尝试恢复。
    pub fn new(options: SessionOptions, storage: Box<dyn KeyValueStore>) -> Self {
        let current = if options.clear_on_start {
            storage.delete(STORAGE_SESSION_KEY);
            None
        } else {
            storage
                .get(STORAGE_SESSION_KEY)
                .and_then(|raw| match serde_json::from_str::<SessionUser>(&raw) {
                    Ok(user) => Some(user),
                    Err(e) => {
                        log::warn!("[Session] Discarding unreadable stored session: {}", e);
                        storage.delete(STORAGE_SESSION_KEY);
                        None
                    }
                })
        };

        if let Some(user) = &current {
            log::info!("[Session] Restored session for '{}'", user.username);
        }

        Self {
            inner: Rc::new(RefCell::new(Inner {
                current,
                listeners: Vec::new(),
                next_listener_id: 0,
                options,
                storage,
            })),
        }
    }

    pub fn current_user(&self) -> Option<SessionUser> {
        self.inner.borrow().current.clone()
    }

    /// 是否已登录
    ///
    /// 配置了 `force_logout_for_demo` 时恒为 false。
    pub fn is_logged_in(&self) -> bool {
        let inner = self.inner.borrow();
        !inner.options.force_logout_for_demo && inner.current.is_some()
    }

    /// 校验演示账号并建立会话
    ///
    /// 失败时返回 `InvalidCredentials`，状态保持不变。
    pub fn login(&self, username: &str, password: &str) -> AppResult<SessionUser> {
        let Some(user) = demo_account(username, password) else {
            log::warn!("[Session] Rejected login for '{}'", username);
            return Err(AppError::InvalidCredentials);
        };

        {
            let mut inner = self.inner.borrow_mut();
            match serde_json::to_string(&user) {
                Ok(raw) => {
                    inner.storage.set(STORAGE_SESSION_KEY, &raw);
                }
                Err(e) => log::warn!("[Session] Could not persist session: {}", e),
            }
            inner.current = Some(user.clone());
        }
        log::info!("[Session] '{}' logged in", user.username);
        self.notify();
        Ok(user)
    }

    /// 注销并清除持久化的会话
    pub fn logout(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.storage.delete(STORAGE_SESSION_KEY);
            inner.current = None;
        }
        log::info!("[Session] Logged out");
        self.notify();
    }

    /// "First Last"，未登录时为空串
    pub fn display_name(&self) -> String {
        self.inner
            .borrow()
            .current
            .as_ref()
            .map(SessionUser::display_name)
            .unwrap_or_default()
    }

    /// 当前用户是否为 admin 账号
    pub fn is_admin(&self) -> bool {
        self.inner
            .borrow()
            .current
            .as_ref()
            .is_some_and(|u| u.username == "admin")
    }

    /// 订阅“当前用户变更”
    ///
    /// 监听器在状态变化后同步触发。返回的句柄被 drop 时自动取消订阅。
    pub fn subscribe(&self, listener: impl Fn(Option<&SessionUser>) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.listeners.push((id, Rc::new(listener)));
        Subscription {
            id,
            store: Rc::downgrade(&self.inner),
        }
    }

    fn notify(&self) {
        // 先复制快照再释放借用，监听器内部可以再次读取会话
        let (user, listeners) = {
            let inner = self.inner.borrow();
            let listeners: Vec<_> = inner.listeners.iter().map(|(_, l)| l.clone()).collect();
            (inner.current.clone(), listeners)
        };
        for listener in listeners {
            (*listener)(user.as_ref());
        }
    }
}

/// 订阅句柄
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    store: Weak<RefCell<Inner>>,
}

impl Subscription {
    /// 显式取消订阅
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner.borrow_mut().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
