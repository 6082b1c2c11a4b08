//! 认证模块
//!
//! 把会话存储桥接到响应式系统，与路由系统解耦。
//! 会话变更通过订阅同步到信号，路由服务只依赖注入的 `is_logged_in` 信号。

use akr_shared::{AppResult, SessionUser};
use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;

use crate::session::{SessionStore, Subscription};

/// 认证上下文
///
/// 所有字段都是 arena 句柄，可以 `Copy` 进任意闭包。
#[derive(Clone, Copy)]
pub struct AuthContext {
    store: StoredValue<SessionStore, LocalStorage>,
    /// 当前用户的镜像，由会话订阅维护
    user: RwSignal<Option<SessionUser>>,
    _subscription: StoredValue<Subscription, LocalStorage>,
    login_delay_ms: u32,
}

impl AuthContext {
    /// 创建新的认证上下文
    pub fn new(store: SessionStore, login_delay_ms: u32) -> Self {
        let user = RwSignal::new(store.current_user());
        let subscription = store.subscribe(move |current| user.set(current.cloned()));

        Self {
            store: StoredValue::new_local(store),
            user,
            _subscription: StoredValue::new_local(subscription),
            login_delay_ms,
        }
    }

    /// 获取登录状态信号（用于路由服务注入）
    pub fn is_logged_in_signal(&self) -> Signal<bool> {
        let user = self.user;
        let store = self.store;
        Signal::derive(move || {
            user.track();
            store.with_value(SessionStore::is_logged_in)
        })
    }

    pub fn display_name(&self) -> Signal<String> {
        let user = self.user;
        let store = self.store;
        Signal::derive(move || {
            user.track();
            store.with_value(SessionStore::display_name)
        })
    }

    pub fn is_admin(&self) -> Signal<bool> {
        let user = self.user;
        let store = self.store;
        Signal::derive(move || {
            user.track();
            store.with_value(SessionStore::is_admin)
        })
    }

    /// 模拟网络延迟后校验凭据
    ///
    /// 成功后会话订阅会更新信号，导航由路由服务自动处理。
    pub async fn login(&self, username: String, password: String) -> AppResult<SessionUser> {
        if self.login_delay_ms > 0 {
            TimeoutFuture::new(self.login_delay_ms).await;
        }
        let store = self.store.get_value();
        store.login(&username, &password)
    }

    /// 注销
    ///
    /// 注意：不需要手动导航，路由服务会监听认证状态变化并自动重定向
    pub fn logout(&self) {
        let store = self.store.get_value();
        store.logout();
    }
}

/// 从 Context 获取认证上下文
pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().expect("AuthContext should be provided")
}
