//! 管理后台外壳：侧边栏、顶栏与通知提示

use crate::auth::use_auth;
use crate::controller::Notice;
use crate::web::route::AppRoute;
use crate::web::router::{Link, use_router};
use leptos::prelude::*;

/// 通知自动消失的时间
const NOTICE_TIMEOUT_SECS: u64 = 3;

/// 通知的代数计数
///
/// 每条新通知递增一次；定时器只在代数未变时关闭通知。
#[derive(Debug, Default)]
struct DismissGuard {
    generation: u64,
}

impl DismissGuard {
    fn arm(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

#[component]
pub fn AdminLayout(children: Children) -> impl IntoView {
    let auth = use_auth();
    let router = use_router();
    let display_name = auth.display_name();
    let is_admin = auth.is_admin();

    let on_logout = move |_| {
        // 跳转由路由服务根据登录状态完成
        auth.logout();
    };

    let title = move || router.current_route().get().title();

    view! {
        <div class="drawer lg:drawer-open min-h-screen bg-base-200 font-sans">
            <input id="sidebar" type="checkbox" class="drawer-toggle" />
            <div class="drawer-content flex flex-col">
                <div class="navbar bg-base-100 shadow-sm px-4">
                    <div class="flex-none lg:hidden">
                        <label for="sidebar" class="btn btn-square btn-ghost">"☰"</label>
                    </div>
                    <div class="flex-1">
                        <h2 class="text-xl font-semibold">{title}</h2>
                    </div>
                    <div class="flex-none gap-2">
                        <span class="hidden md:inline text-sm text-base-content/70">
                            {move || display_name.get()}
                        </span>
                        <Show when=move || is_admin.get()>
                            <span class="badge badge-primary badge-outline">"Admin"</span>
                        </Show>
                        <button on:click=on_logout class="btn btn-outline btn-error btn-sm">
                            "Logout"
                        </button>
                    </div>
                </div>
                <main class="p-4 md:p-8 max-w-7xl w-full mx-auto space-y-8">
                    {children()}
                </main>
            </div>
            <div class="drawer-side">
                <label for="sidebar" class="drawer-overlay"></label>
                <aside class="w-64 min-h-full bg-base-100 border-r border-base-300">
                    <div class="p-6 text-2xl font-bold text-primary">"AKR Bikes"</div>
                    <ul class="menu p-4 gap-1">
                        {AppRoute::NAVIGATION
                            .into_iter()
                            .map(|route| {
                                let class = Signal::derive(move || {
                                    if router.current_route().get() == route {
                                        "active".to_string()
                                    } else {
                                        String::new()
                                    }
                                });
                                view! {
                                    <li>
                                        <Link route=route class=class>{route.title()}</Link>
                                    </li>
                                }
                            })
                            .collect_view()}
                    </ul>
                </aside>
            </div>
        </div>
    }
}

/// 右上角的通知提示，几秒后自动关闭
#[component]
pub fn NoticeToast(
    #[prop(into)] notice: Signal<Option<Notice>>,
    #[prop(into)] on_dismiss: Callback<()>,
) -> impl IntoView {
    let guard = StoredValue::new(DismissGuard::default());

    Effect::new(move |prev: Option<Option<Notice>>| {
        let current = notice.get();
        if prev.as_ref() == Some(&current) {
            return current;
        }
        let Some(generation) = guard.try_update_value(DismissGuard::arm) else {
            return current;
        };
        if current.is_some() {
            set_timeout(
                move || {
                    // 期间出现了新通知或通知已被关闭
                    if guard.with_value(|g| g.is_current(generation)) {
                        on_dismiss.run(());
                    }
                },
                std::time::Duration::from_secs(NOTICE_TIMEOUT_SECS),
            );
        }
        current
    });

    view! {
        <Show when=move || notice.with(Option::is_some)>
            <div class="toast toast-top toast-end z-50">
                <div
                    class=move || {
                        if notice.with(|n| n.as_ref().is_some_and(Notice::is_error)) {
                            "alert alert-error shadow-lg"
                        } else {
                            "alert alert-success shadow-lg"
                        }
                    }
                    on:click=move |_| on_dismiss.run(())
                >
                    <span>
                        {move || notice.with(|n| n.as_ref().map(|n| n.message().to_string()).unwrap_or_default())}
                    </span>
                </div>
            </div>
        </Show>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_timer_does_not_dismiss_a_newer_notice() {
        let mut guard = DismissGuard::default();
        let first = guard.arm();
        assert!(guard.is_current(first));

        let second = guard.arm();
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));
    }
}
