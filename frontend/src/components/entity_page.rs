//! 通用实体页面
//!
//! 七个业务页面共用同一套列表、表单对话框与删除确认。
//! 页面差异全部来自 [`EntitySchema`]，状态流转全部交给 [`ListEditController`]；
//! 这里只负责渲染与发起异步请求。

use std::collections::HashMap;

use akr_shared::{Record, RecordId, ServiceStatus};
use leptos::html::Dialog;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::backend::use_backend;
use crate::components::layout::{AdminLayout, NoticeToast};
use crate::controller::ListEditController;
use crate::schema::{EntitySchema, FieldKind, FieldSpec};

type Controller<R> = RwSignal<ListEditController<R>>;
/// 按表名缓存的下拉选项
type Options = RwSignal<HashMap<&'static str, Vec<(RecordId, String)>>>;

/// 路由匹配使用的入口
pub fn entity_page<R: EntitySchema>() -> AnyView {
    view! {
        <AdminLayout>
            {entity_view::<R>()}
        </AdminLayout>
    }
    .into_any()
}

fn entity_view<R: EntitySchema>() -> impl IntoView {
    let backend = use_backend();
    let repo = StoredValue::new_local(backend.repository::<R>());
    let backend = StoredValue::new_local(backend);
    let ctl: Controller<R> = RwSignal::new(ListEditController::new());
    let options: Options = RwSignal::new(HashMap::new());

    let reload = move || {
        ctl.update(ListEditController::begin_load);
        let repo = repo.get_value();
        spawn_local(async move {
            let result = repo.list().await;
            ctl.update(|c| c.finish_load(result));
        });
    };

    // 引用字段的下拉选项
    let load_options = move || {
        let fields = R::reference_fields();
        if fields.is_empty() {
            return;
        }
        let backend = backend.get_value();
        spawn_local(async move {
            for field in fields {
                let FieldKind::Reference { collection } = field.kind else {
                    continue;
                };
                match backend.reference_options(collection).await {
                    Ok(list) => options.update(|m| {
                        m.insert(collection, list);
                    }),
                    Err(e) => log::warn!("[{}] Could not load {}: {}", R::TITLE, collection, e),
                }
            }
        });
    };

    // 对话框每次打开（新建或编辑）时刷新选项
    Effect::new(move |was_open: Option<bool>| {
        let open = ctl.with(ListEditController::is_dialog_open);
        if open && was_open != Some(true) {
            load_options();
        }
        open
    });

    let on_add = move |_| {
        ctl.update(|c| {
            c.open_create();
        });
    };

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        let Some(mutation) = ctl.try_update(|c| c.begin_submit()).flatten() else {
            return;
        };
        let repo = repo.get_value();
        spawn_local(async move {
            let result = mutation.apply(repo.as_ref()).await;
            if ctl.try_update(|c| c.finish_submit(result)).unwrap_or(false) {
                reload();
            }
        });
    };

    let on_confirm_delete = move |confirmed: bool| {
        let Some(id) = ctl.try_update(|c| c.resolve_delete(confirmed)).flatten() else {
            return;
        };
        let repo = repo.get_value();
        spawn_local(async move {
            let result = repo.delete(&id).await;
            if ctl.try_update(|c| c.finish_delete(result)).unwrap_or(false) {
                reload();
            }
        });
    };

    // 初始加载
    reload();

    let notice = Signal::derive(move || ctl.with(|c| c.notice().cloned()));

    view! {
        <NoticeToast notice=notice on_dismiss=move |_| ctl.update(ListEditController::dismiss_notice) />

        <div class="card bg-base-100 shadow-xl">
            <div class="card-body p-0">
                <div class="flex items-center justify-between p-6 pb-2">
                    <div>
                        <h3 class="card-title">{R::TITLE}</h3>
                        <p class="text-base-content/70 text-sm">
                            {move || format!("{} records", ctl.with(|c| c.records().len()))}
                        </p>
                    </div>
                    <div class="flex gap-2">
                        <button
                            on:click=move |_| reload()
                            disabled=move || ctl.with(ListEditController::is_loading)
                            class="btn btn-ghost btn-sm"
                        >
                            "Refresh"
                        </button>
                        <button on:click=on_add class="btn btn-primary btn-sm">
                            {format!("Add {}", R::LABEL)}
                        </button>
                    </div>
                </div>

                <div class="overflow-x-auto w-full">
                    <table class="table table-zebra w-full">
                        <thead>
                            <tr>
                                {R::COLUMNS.iter().map(|c| view! { <th>{*c}</th> }).collect_view()}
                                <th></th>
                            </tr>
                        </thead>
                        <tbody>
                            {move || table_body(ctl)}
                        </tbody>
                    </table>
                </div>
            </div>
        </div>

        <EditDialog ctl=ctl options=options on_submit=on_submit />
        <ConfirmDeleteDialog ctl=ctl on_confirm=on_confirm_delete />
    }
}

fn table_body<R: EntitySchema>(ctl: Controller<R>) -> AnyView {
    let colspan = (R::COLUMNS.len() + 1).to_string();
    let (records, loading) = ctl.with(|c| (c.records().to_vec(), c.is_loading()));

    if records.is_empty() {
        let message = if loading {
            "Loading...".to_string()
        } else {
            format!("No {} yet.", R::TITLE.to_lowercase())
        };
        return view! {
            <tr>
                <td colspan=colspan class="text-center py-8 text-base-content/50">{message}</td>
            </tr>
        }
        .into_any();
    }

    records
        .into_iter()
        .map(|record| table_row(ctl, record))
        .collect_view()
        .into_any()
}

fn table_row<R: EntitySchema>(ctl: Controller<R>, record: Record<R>) -> impl IntoView {
    let cells = R::table_row(&record)
        .into_iter()
        .map(|cell| view! { <td>{cell}</td> })
        .collect_view();
    let id = record.id.clone();
    let record = StoredValue::new(record);

    view! {
        <tr>
            {cells}
            <td class="text-right whitespace-nowrap">
                <button
                    class="btn btn-ghost btn-xs"
                    on:click=move |_| ctl.update(|c| {
                        c.open_edit(record.get_value());
                    })
                >
                    "Edit"
                </button>
                <button
                    class="btn btn-ghost btn-xs text-error"
                    on:click=move |_| ctl.update(|c| c.request_delete(id.clone()))
                >
                    "Delete"
                </button>
            </td>
        </tr>
    }
}

// =========================================================
// 对话框
// =========================================================

/// 打开/关闭原生 `<dialog>`
fn sync_dialog(dialog_ref: NodeRef<Dialog>, open: impl Fn() -> bool + 'static) {
    Effect::new(move |_| {
        let open = open();
        if let Some(dialog) = dialog_ref.get() {
            if open && !dialog.open() {
                let _ = dialog.show_modal();
            } else if !open && dialog.open() {
                dialog.close();
            }
        }
    });
}

#[component]
fn EditDialog<R: EntitySchema, F>(ctl: Controller<R>, options: Options, on_submit: F) -> impl IntoView
where
    F: Fn(leptos::web_sys::SubmitEvent) + 'static,
{
    let dialog_ref = NodeRef::<Dialog>::new();
    sync_dialog(dialog_ref, move || ctl.with(ListEditController::is_dialog_open));

    let submitting = move || ctl.with(ListEditController::is_submitting);
    let form_error = move || {
        ctl.with(|c| {
            c.form_errors()
                .for_field("non_field_errors")
                .map(str::to_string)
        })
    };

    view! {
        <dialog
            class="modal"
            node_ref=dialog_ref
            on:cancel=move |ev: leptos::ev::Event| {
                // 提交中不允许通过 Esc 关闭
                if submitting() {
                    ev.prevent_default();
                }
            }
            on:close=move |_| ctl.update(|c| {
                c.cancel();
            })
        >
            <div class="modal-box">
                <h3 class="font-bold text-lg">{move || ctl.with(ListEditController::dialog_title)}</h3>

                <form on:submit=on_submit class="space-y-4 mt-4" novalidate>
                    <Show when=move || form_error().is_some()>
                        <div role="alert" class="alert alert-error text-sm py-2">
                            <span>{move || form_error().unwrap_or_default()}</span>
                        </div>
                    </Show>

                    {R::FIELDS
                        .iter()
                        .map(|field| field_control(field, ctl, options))
                        .collect_view()}

                    <div class="modal-action">
                        <button
                            type="button"
                            class="btn btn-ghost"
                            disabled=submitting
                            on:click=move |_| ctl.update(|c| {
                                c.cancel();
                            })
                        >
                            "Cancel"
                        </button>
                        <button type="submit" disabled=submitting class="btn btn-primary">
                            {move || if submitting() {
                                view! { <span class="loading loading-spinner"></span> "Saving..." }.into_any()
                            } else {
                                "Save".into_any()
                            }}
                        </button>
                    </div>
                </form>
            </div>
        </dialog>
    }
}

#[component]
fn ConfirmDeleteDialog<R: EntitySchema, F>(ctl: Controller<R>, on_confirm: F) -> impl IntoView
where
    F: Fn(bool) + Copy + 'static,
{
    let dialog_ref = NodeRef::<Dialog>::new();
    sync_dialog(dialog_ref, move || ctl.with(|c| c.pending_delete().is_some()));

    view! {
        <dialog class="modal" node_ref=dialog_ref on:close=move |_| on_confirm(false)>
            <div class="modal-box">
                <h3 class="font-bold text-lg">{format!("Delete {}", R::LABEL)}</h3>
                <p class="py-4">
                    {format!(
                        "Are you sure you want to delete this {}? This cannot be undone.",
                        R::LABEL.to_lowercase()
                    )}
                </p>
                <div class="modal-action">
                    <button class="btn btn-ghost" on:click=move |_| on_confirm(false)>"Cancel"</button>
                    <button class="btn btn-error" on:click=move |_| on_confirm(true)>"Delete"</button>
                </div>
            </div>
        </dialog>
    }
}

// =========================================================
// 表单控件
// =========================================================

fn field_control<R: EntitySchema>(
    field: &'static FieldSpec,
    ctl: Controller<R>,
    options: Options,
) -> impl IntoView {
    let name = field.name;
    let value = move || ctl.with(|c| c.form().get(name).to_string());
    let error = move || ctl.with(|c| c.form_errors().for_field(name).map(str::to_string));
    let set = move |raw: String| ctl.update(|c| c.set_field(name, raw));

    let input = match field.kind {
        FieldKind::LongText => view! {
            <textarea
                id=name
                class="textarea textarea-bordered w-full"
                prop:value=value
                on:input=move |ev| set(event_target_value(&ev))
            ></textarea>
        }
        .into_any(),
        FieldKind::Status => view! {
            <select
                id=name
                class="select select-bordered w-full"
                on:change=move |ev| set(event_target_value(&ev))
            >
                {ServiceStatus::ALL
                    .into_iter()
                    .map(|status| view! {
                        <option value=status.as_str() selected=move || value() == status.as_str()>
                            {status.label()}
                        </option>
                    })
                    .collect_view()}
            </select>
        }
        .into_any(),
        FieldKind::Reference { collection } => {
            let placeholder = if field.required { "Select..." } else { "None" };
            view! {
                <select
                    id=name
                    class="select select-bordered w-full"
                    on:change=move |ev| set(event_target_value(&ev))
                >
                    <option value="" selected=move || value().is_empty()>{placeholder}</option>
                    {move || {
                        let choices = options.with(|m| m.get(collection).cloned().unwrap_or_default());
                        choices
                            .into_iter()
                            .map(|(id, label)| {
                                let id = id.to_string();
                                let current = id.clone();
                                view! {
                                    <option value=id selected=move || value() == current>{label}</option>
                                }
                            })
                            .collect_view()
                    }}
                </select>
            }
            .into_any()
        }
        kind => {
            let step = matches!(kind, FieldKind::Decimal).then_some("0.01");
            view! {
                <input
                    id=name
                    type=kind.input_type()
                    step=step
                    class=move || if error().is_some() {
                        "input input-bordered input-error w-full"
                    } else {
                        "input input-bordered w-full"
                    }
                    prop:value=value
                    on:input=move |ev| set(event_target_value(&ev))
                />
            }
            .into_any()
        }
    };

    view! {
        <div class="form-control">
            <label for=name class="label">
                <span class="label-text">
                    {field.label}
                    {(!field.required).then_some(" (optional)")}
                </span>
            </label>
            {input}
            <Show when=move || error().is_some()>
                <label class="label">
                    <span class="label-text-alt text-error">{move || error().unwrap_or_default()}</span>
                </label>
            </Show>
        </div>
    }
}
