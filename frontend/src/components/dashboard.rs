use crate::backend::use_backend;
use crate::components::layout::{AdminLayout, NoticeToast};
use crate::controller::Notice;
use akr_shared::date::format_date_input;
use akr_shared::{Bike, DashboardStats, Record, Sale, Service};
use leptos::prelude::*;
use leptos::task::spawn_local;

#[component]
pub fn DashboardPage() -> impl IntoView {
    let backend = StoredValue::new_local(use_backend());

    let (stats, set_stats) = signal(DashboardStats::default());
    let (low_stock, set_low_stock) = signal(Vec::<Record<Bike>>::new());
    let (recent_sales, set_recent_sales) = signal(Vec::<Record<Sale>>::new());
    let (pending, set_pending) = signal(Vec::<Record<Service>>::new());
    let (loading, set_loading) = signal(true);
    let (notice, set_notice) = signal(Option::<Notice>::None);

    let load = move || {
        let backend = backend.get_value();
        set_loading.set(true);
        spawn_local(async move {
            let (s, l, r, p) = futures::join!(
                backend.dashboard_stats(),
                backend.low_stock_bikes(),
                backend.recent_sales(),
                backend.pending_services()
            );
            // 每一块独立展示，任一失败只提示一次
            let mut failure = None;
            match s {
                Ok(v) => set_stats.set(v),
                Err(e) => failure = Some(e),
            }
            match l {
                Ok(v) => set_low_stock.set(v),
                Err(e) => failure = Some(e),
            }
            match r {
                Ok(v) => set_recent_sales.set(v),
                Err(e) => failure = Some(e),
            }
            match p {
                Ok(v) => set_pending.set(v),
                Err(e) => failure = Some(e),
            }
            if let Some(e) = failure {
                log::error!("[Dashboard] Load failed: {}", e);
                set_notice.set(Some(Notice::Error(format!(
                    "Failed to load dashboard: {}",
                    e
                ))));
            }
            set_loading.set(false);
        });
    };

    // 初始加载
    load();

    view! {
        <AdminLayout>
            <NoticeToast notice=notice on_dismiss=move |_| set_notice.set(None) />

            <div class="flex items-center justify-between">
                <p class="text-base-content/70">"Overview of the shop"</p>
                <button
                    on:click=move |_| load()
                    disabled=move || loading.get()
                    class="btn btn-ghost btn-sm"
                >
                    {move || if loading.get() { "Refreshing..." } else { "Refresh" }}
                </button>
            </div>

            <div class="stats shadow w-full stats-vertical md:stats-horizontal bg-base-100">
                <div class="stat">
                    <div class="stat-title">"Total Bikes"</div>
                    <div class="stat-value text-primary">{move || stats.with(|s| s.total_bikes)}</div>
                    <div class="stat-desc">
                        {move || format!("{} low on stock", stats.with(|s| s.low_stock))}
                    </div>
                </div>
                <div class="stat">
                    <div class="stat-title">"Customers"</div>
                    <div class="stat-value">{move || stats.with(|s| s.total_customers)}</div>
                </div>
                <div class="stat">
                    <div class="stat-title">"Sales"</div>
                    <div class="stat-value">{move || stats.with(|s| s.total_sales)}</div>
                    <div class="stat-desc">
                        {move || format!("${:.2} in the last 30 days", stats.with(|s| s.recent_sales_amount))}
                    </div>
                </div>
                <div class="stat">
                    <div class="stat-title">"Services"</div>
                    <div class="stat-value text-secondary">{move || stats.with(|s| s.total_services)}</div>
                </div>
            </div>

            <div class="grid gap-8 lg:grid-cols-2">
                <div class="card bg-base-100 shadow-xl">
                    <div class="card-body">
                        <h3 class="card-title">"Low Stock"</h3>
                        <Show
                            when=move || !low_stock.with(Vec::is_empty)
                            fallback=|| view! { <p class="text-base-content/50">"All bikes are well stocked."</p> }
                        >
                            <ul class="divide-y divide-base-200">
                                <For
                                    each=move || low_stock.get()
                                    key=|b| b.id.clone()
                                    children=|bike| view! {
                                        <li class="flex justify-between py-2">
                                            <span>{bike.brand.clone()} " " {bike.model_name.clone()}</span>
                                            <span class="badge badge-warning">{bike.stock_quantity} " left"</span>
                                        </li>
                                    }
                                />
                            </ul>
                        </Show>
                    </div>
                </div>

                <div class="card bg-base-100 shadow-xl">
                    <div class="card-body">
                        <h3 class="card-title">"Pending Services"</h3>
                        <Show
                            when=move || !pending.with(Vec::is_empty)
                            fallback=|| view! { <p class="text-base-content/50">"No pending services."</p> }
                        >
                            <ul class="divide-y divide-base-200">
                                <For
                                    each=move || pending.get()
                                    key=|s| s.id.clone()
                                    children=|service| view! {
                                        <li class="flex justify-between py-2">
                                            <span>
                                                {service.service_type.clone()} " - "
                                                {service.customer_name.clone().unwrap_or_default()}
                                            </span>
                                            <span class="text-sm opacity-70">
                                                {format_date_input(&service.service_date)}
                                            </span>
                                        </li>
                                    }
                                />
                            </ul>
                        </Show>
                    </div>
                </div>
            </div>

            <div class="card bg-base-100 shadow-xl">
                <div class="card-body p-0">
                    <h3 class="card-title p-6 pb-2">"Recent Sales"</h3>
                    <div class="overflow-x-auto w-full">
                        <table class="table table-zebra w-full">
                            <thead>
                                <tr>
                                    <th>"Date"</th>
                                    <th>"Customer"</th>
                                    <th>"Bike"</th>
                                    <th class="text-right">"Amount"</th>
                                </tr>
                            </thead>
                            <tbody>
                                <Show when=move || recent_sales.with(Vec::is_empty) && !loading.get()>
                                    <tr>
                                        <td colspan="4" class="text-center py-8 text-base-content/50">
                                            "No sales yet."
                                        </td>
                                    </tr>
                                </Show>
                                <For
                                    each=move || recent_sales.get()
                                    key=|s| s.id.clone()
                                    children=|sale| view! {
                                        <tr>
                                            <td>{format_date_input(&sale.sale_date)}</td>
                                            <td>{sale.customer_name.clone().unwrap_or_default()}</td>
                                            <td>{sale.bike_name.clone().unwrap_or_default()}</td>
                                            <td class="text-right font-mono">
                                                {format!("${:.2}", sale.total_amount)}
                                            </td>
                                        </tr>
                                    }
                                />
                            </tbody>
                        </table>
                    </div>
                </div>
            </div>
        </AdminLayout>
    }
}
