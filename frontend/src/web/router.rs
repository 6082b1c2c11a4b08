//! 浏览器路由
//!
//! 地址栏与 `AppRoute` 信号之间的唯一桥梁。任何地址变化
//! （点击链接、前进/后退、首次加载、登录状态变化）都先经过 [`guard`]，
//! 再决定写入 History 的是请求的地址还是重定向地址。

use leptos::prelude::*;
use wasm_bindgen::prelude::*;

use super::route::{AppRoute, Navigation, guard};

/// 写入 History 的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryMode {
    /// 用户主动导航，保留在后退栈中
    Push,
    /// 重定向或回放，不产生新的历史条目
    Replace,
}

/// 当前地址栏中的路径 + 查询串
fn browser_location() -> String {
    let Some(location) = web_sys::window().map(|w| w.location()) else {
        return "/".to_string();
    };
    let path = location.pathname().unwrap_or_else(|_| "/".to_string());
    let search = location.search().unwrap_or_default();
    format!("{}{}", path, search)
}

fn write_history(location: &str, mode: HistoryMode) {
    let Some(history) = web_sys::window().and_then(|w| w.history().ok()) else {
        return;
    };
    let result = match mode {
        HistoryMode::Push => history.push_state_with_url(&JsValue::NULL, "", Some(location)),
        HistoryMode::Replace => history.replace_state_with_url(&JsValue::NULL, "", Some(location)),
    };
    if result.is_err() {
        log::warn!("[Router] Could not write history entry for {}", location);
    }
}

/// 把守卫结果同步到地址栏与路由信号
fn commit(set_route: WriteSignal<AppRoute>, nav: &Navigation, mode: HistoryMode) {
    let location = nav.location();
    if nav.is_redirect() {
        log::info!("[Router] Access denied. Redirecting to {}", location);
    }
    if location != browser_location() {
        write_history(&location, mode);
    }
    set_route.set(nav.route());
}

/// 路由服务
///
/// 登录状态以信号形式注入，路由本身不知道会话存储的存在。
#[derive(Clone, Copy)]
pub struct RouterService {
    current_route: ReadSignal<AppRoute>,
    set_route: WriteSignal<AppRoute>,
    is_logged_in: Signal<bool>,
}

impl RouterService {
    /// 首次加载同样经过守卫：深链接到受保护页面会被改写为登录页
    fn new(is_logged_in: Signal<bool>) -> Self {
        let nav = guard(&browser_location(), is_logged_in.get_untracked());
        let (current_route, set_route) = signal(nav.route());
        commit(set_route, &nav, HistoryMode::Replace);

        Self {
            current_route,
            set_route,
            is_logged_in,
        }
    }

    pub fn current_route(&self) -> ReadSignal<AppRoute> {
        self.current_route
    }

    /// 导航到 `path`（可带查询串），被拒绝时落到守卫给出的地址
    pub fn navigate(&self, path: &str) {
        let nav = guard(path, self.is_logged_in.get_untracked());
        commit(self.set_route, &nav, HistoryMode::Push);
    }

    /// 前进/后退时对新地址重新执行守卫
    fn listen_popstate(&self) {
        let set_route = self.set_route;
        let is_logged_in = self.is_logged_in;

        let on_popstate = Closure::<dyn Fn()>::new(move || {
            let nav = guard(&browser_location(), is_logged_in.get_untracked());
            commit(set_route, &nav, HistoryMode::Replace);
        });

        if let Some(window) = web_sys::window() {
            let _ = window.add_event_listener_with_callback(
                "popstate",
                on_popstate.as_ref().unchecked_ref(),
            );
        }

        // 监听器与页面同生命周期
        on_popstate.forget();
    }

    /// 登录后离开登录页（优先回到 `returnUrl`），注销后离开受保护页面
    fn follow_session(&self) {
        let current_route = self.current_route;
        let set_route = self.set_route;
        let is_logged_in = self.is_logged_in;

        Effect::new(move |_| {
            let logged_in = is_logged_in.get();
            let nav = guard(&browser_location(), logged_in);
            if nav.is_redirect() || nav.route() != current_route.get_untracked() {
                log::info!(
                    "[Router] Session changed (logged in: {}), showing {}",
                    logged_in,
                    nav.route()
                );
                commit(set_route, &nav, HistoryMode::Push);
            }
        });
    }
}

pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

// ============================================================================
// 组件
// ============================================================================

/// 在 App 根部创建路由服务并放入 Context
#[component]
pub fn Router(is_logged_in: Signal<bool>, children: Children) -> impl IntoView {
    let router = RouterService::new(is_logged_in);
    router.listen_popstate();
    router.follow_session();
    provide_context(router);

    children()
}

/// 按当前路由渲染页面
#[component]
pub fn RouterOutlet(matcher: fn(AppRoute) -> AnyView) -> impl IntoView {
    let router = use_router();
    move || matcher(router.current_route().get())
}

/// 站内链接，点击时走路由服务而不是整页跳转
#[component]
pub fn Link(
    route: AppRoute,
    #[prop(into)] class: Signal<String>,
    children: Children,
) -> impl IntoView {
    let router = use_router();

    let on_click = move |ev: leptos::ev::MouseEvent| {
        ev.prevent_default();
        router.navigate(route.to_path());
    };

    view! {
        <a href=route.to_path() class=class on:click=on_click>
            {children()}
        </a>
    }
}
