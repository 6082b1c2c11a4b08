//! AKR 单车管理后台前端
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `web::route`: 路由定义与导航守卫（领域模型）
//! - `web::router`: 路由服务（核心引擎）
//! - `session` / `auth`: 会话存储及其响应式桥接
//! - `repository` / `backend`: 实体仓库与后端选择
//! - `schema` / `controller`: 通用列表-编辑页面的描述与状态机
//! - `components`: UI 组件层

mod api;
mod auth;
mod backend;
mod components {
    pub mod dashboard;
    pub mod entity_page;
    pub mod layout;
    pub mod login;
}
mod config;
mod controller;
mod logger;
mod repository;
mod schema;
mod serde_helper;
mod session;

use akr_shared::{Bike, Customer, Employee, Purchase, Sale, Service, Supplier};
use leptos::prelude::*;

use crate::auth::AuthContext;
use crate::backend::{Backend, provide_backend};
use crate::components::dashboard::DashboardPage;
use crate::components::entity_page::entity_page;
use crate::components::login::LoginPage;
use crate::config::AppConfig;
use crate::session::SessionStore;

// 原生 Web API 封装模块
// 此模块提供对浏览器原生 API 的轻量级封装，替代 gloo-net / gloo-storage，
// 以减小 WASM 二进制体积。
pub(crate) mod web {
    mod http;
    pub mod route;
    pub mod router;
    mod storage;

    #[cfg(test)]
    pub use http::MockHttpClient;
    pub use http::{FetchClient, HttpClient, HttpRequest, HttpResponse};
    #[cfg(test)]
    pub use storage::MemoryKeyValueStore;
    pub use storage::{BrowserStorage, KeyValueStore};
}

use web::BrowserStorage;
use web::route::AppRoute;
use web::router::{Router, RouterOutlet};

/// 路由匹配函数
///
/// 根据 AppRoute 枚举返回对应的视图组件。
fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::Dashboard => view! { <DashboardPage /> }.into_any(),
        AppRoute::Bikes => entity_page::<Bike>(),
        AppRoute::Customers => entity_page::<Customer>(),
        AppRoute::Suppliers => entity_page::<Supplier>(),
        AppRoute::Employees => entity_page::<Employee>(),
        AppRoute::Sales => entity_page::<Sale>(),
        AppRoute::Purchases => entity_page::<Purchase>(),
        AppRoute::Services => entity_page::<Service>(),
        AppRoute::NotFound => view! {
            <div class="flex items-center justify-center min-h-screen bg-base-200">
                <div class="text-center">
                    <h1 class="text-6xl font-bold text-error">"404"</h1>
                    <p class="text-xl mt-4">"Page not found"</p>
                </div>
            </div>
        }
        .into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 加载配置并初始化日志
    let config = AppConfig::load(&BrowserStorage);
    logger::init(config.log_level());

    // 2. 创建会话与认证上下文
    let store = SessionStore::new(config.session_options(), Box::new(BrowserStorage));
    let auth = AuthContext::new(store, config.login_delay_ms);
    provide_context(auth);

    // 3. 选择数据后端
    provide_backend(Backend::from_config(&config.backend));

    // 4. 获取登录状态信号，用于注入路由服务（解耦！）
    let is_logged_in = auth.is_logged_in_signal();

    view! {
        <Router is_logged_in=is_logged_in>
            <RouterOutlet matcher=route_matcher />
        </Router>
    }
}
