//! 路由定义模块 - 领域模型
//!
//! 这是纯粹的业务逻辑层，不依赖于 DOM 或 web_sys。
//! 定义了应用的所有路由、其属性以及导航守卫。

use std::fmt::Display;

use url::form_urlencoded;

/// 登录页携带原始目标路径时使用的查询参数
pub const RETURN_URL_PARAM: &str = "returnUrl";

/// 应用路由枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppRoute {
    /// 登录页面 (默认路由)
    #[default]
    Login,
    /// 控制面板 (需要认证)
    Dashboard,
    Bikes,
    Customers,
    Suppliers,
    Employees,
    Sales,
    Purchases,
    Services,
    /// 页面未找到
    NotFound,
}

impl AppRoute {
    /// 侧边栏中展示的业务页面
    pub const NAVIGATION: [AppRoute; 8] = [
        AppRoute::Dashboard,
        AppRoute::Bikes,
        AppRoute::Customers,
        AppRoute::Sales,
        AppRoute::Suppliers,
        AppRoute::Purchases,
        AppRoute::Services,
        AppRoute::Employees,
    ];

    /// 将 URL path 解析为路由枚举（忽略查询串与末尾斜杠）
    pub fn from_path(path: &str) -> Self {
        let (path, _) = split_query(path);
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" | "/login" => Self::Login,
            "/dashboard" => Self::Dashboard,
            "/bikes" => Self::Bikes,
            "/customers" => Self::Customers,
            "/suppliers" => Self::Suppliers,
            "/employees" => Self::Employees,
            "/sales" => Self::Sales,
            "/purchases" => Self::Purchases,
            "/services" => Self::Services,
            _ => Self::NotFound,
        }
    }

    /// 获取路由对应的 URL path
    pub fn to_path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
            Self::Bikes => "/bikes",
            Self::Customers => "/customers",
            Self::Suppliers => "/suppliers",
            Self::Employees => "/employees",
            Self::Sales => "/sales",
            Self::Purchases => "/purchases",
            Self::Services => "/services",
            Self::NotFound => "/404",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Dashboard => "Dashboard",
            Self::Bikes => "Bikes",
            Self::Customers => "Customers",
            Self::Suppliers => "Suppliers",
            Self::Employees => "Employees",
            Self::Sales => "Sales",
            Self::Purchases => "Purchases",
            Self::Services => "Services",
            Self::NotFound => "Not Found",
        }
    }

    /// **核心守卫逻辑：定义该路由是否需要认证**
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Self::Login | Self::NotFound)
    }

    /// 定义已认证用户是否应该离开此路由（如登录页）
    pub fn should_redirect_when_authenticated(&self) -> bool {
        matches!(self, Self::Login)
    }

    /// 获取认证失败时的重定向目标
    pub fn auth_failure_redirect() -> Self {
        Self::Login
    }

    /// 获取认证成功时的默认重定向目标（从登录页）
    pub fn auth_success_redirect() -> Self {
        Self::Dashboard
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

// =========================================================
// 导航守卫
// =========================================================

/// 守卫的裁决结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// 允许进入，`path` 为最终写入地址栏的路径
    Allow { route: AppRoute, path: String },
    /// 拒绝并重定向
    Redirect {
        to: AppRoute,
        /// 登录后应返回的原始路径
        return_to: Option<String>,
    },
}

impl Navigation {
    /// 最终要展示的路由
    pub fn route(&self) -> AppRoute {
        match self {
            Navigation::Allow { route, .. } => *route,
            Navigation::Redirect { to, .. } => *to,
        }
    }

    /// 最终写入地址栏的路径（含查询串）
    pub fn location(&self) -> String {
        match self {
            Navigation::Allow { path, .. } => path.clone(),
            Navigation::Redirect { to, return_to } => match return_to {
                Some(target) => login_path_with_return(*to, target),
                None => to.to_path().to_string(),
            },
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Navigation::Redirect { .. })
    }
}

/// 对一次导航请求执行守卫
///
/// - 受保护路由 + 未登录：重定向到登录页并携带原始路径
/// - 登录页 + 已登录：跳转到 `returnUrl`（若存在且可进入）或控制面板
/// - 其余情况放行
pub fn guard(requested: &str, is_logged_in: bool) -> Navigation {
    let route = AppRoute::from_path(requested);

    if route.requires_auth() && !is_logged_in {
        return Navigation::Redirect {
            to: AppRoute::auth_failure_redirect(),
            return_to: Some(requested.to_string()),
        };
    }

    if route.should_redirect_when_authenticated() && is_logged_in {
        let target = return_target(requested)
            .filter(|path| {
                let r = AppRoute::from_path(path);
                r.requires_auth() || r == AppRoute::NotFound
            })
            .unwrap_or_else(|| AppRoute::auth_success_redirect().to_path().to_string());
        return Navigation::Allow {
            route: AppRoute::from_path(&target),
            path: target,
        };
    }

    let path = if route == AppRoute::Login {
        requested.to_string()
    } else {
        route_path_or_original(route, requested)
    };
    Navigation::Allow { route, path }
}

fn route_path_or_original(route: AppRoute, requested: &str) -> String {
    if route == AppRoute::NotFound {
        requested.to_string()
    } else {
        route.to_path().to_string()
    }
}

/// 从 `/login?returnUrl=...` 中取出原始路径
pub fn return_target(location: &str) -> Option<String> {
    let (_, query) = split_query(location);
    form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| k == RETURN_URL_PARAM)
        .map(|(_, v)| v.into_owned())
        .filter(|v| v.starts_with('/') && !v.starts_with("//"))
}

/// `/login?returnUrl=%2Fbikes`
pub fn login_path_with_return(login: AppRoute, return_to: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(RETURN_URL_PARAM, return_to)
        .finish();
    format!("{}?{}", login.to_path(), query)
}

fn split_query(location: &str) -> (&str, Option<&str>) {
    match location.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (location, None),
    }
}
