// Copyright 2024 Jeremy Wall (Jeremy@marzhilsltudios.com)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use sycamore::{futures::spawn_local_scoped, prelude::*};
use tracing::{debug, error, instrument};

use client_api::{RecipeDetail, RecipeId};

use crate::controller::{DashboardController, Gate};
use crate::view_state::{ActiveView, Screen};

fn task_bar<'a, 'ctx: 'a, G: Html>(
    cx: Scope<'a>,
    controller: &'ctx DashboardController<'ctx>,
) -> View<G> {
    let user = controller
        .identity()
        .map(|identity| identity.display_name)
        .unwrap_or_default();
    let save_button = match controller.current_recipe() {
        Some(recipe) => {
            let id = recipe.id;
            let saved = controller.is_saved(id);
            let label = if saved { "Unsave" } else { "Save" };
            view! {cx,
                button(on:click=move |_| {
                    spawn_local_scoped(cx, async move {
                        if let Err(err) = controller.toggle_save(id, !saved).await {
                            error!(?err, "Save toggle failed");
                        }
                    });
                }) { (label) }
            }
        }
        None => View::empty(),
    };
    view! {cx,
        nav(class="taskbar") {
            span(class="user") { (user) }
            button(on:click=move |_| controller.new_recipe()) { "New" }
            button(on:click=move |_| controller.request_edit()) { "Edit" }
            button(on:click=move |_| controller.change_screen(ActiveView::Delete)) { "Delete" }
            button(on:click=move |_| controller.change_screen(ActiveView::Search)) { "Search" }
            (save_button)
        }
    }
}

fn failure_banner<'a, 'ctx: 'a, G: Html>(
    cx: Scope<'a>,
    controller: &'ctx DashboardController<'ctx>,
) -> View<G> {
    match controller.failure() {
        Some(failure) => {
            let msg = format!("{}", failure);
            view! {cx,
                div(class="error", role="alert") {
                    (msg)
                    button(on:click=move |_| controller.dismiss_failure()) { "Dismiss" }
                }
            }
        }
        None => View::empty(),
    }
}

fn loading<G: Html>(cx: Scope) -> View<G> {
    view! {cx,
        div(class="load-recipe-screen") {
            p { "Loading Recipe..." }
            div(class="loading-circle")
        }
    }
}

fn recipe_fields(recipe: &RecipeDetail) -> String {
    serde_json::to_string_pretty(&recipe.fields).unwrap_or_default()
}

fn main_area<'a, 'ctx: 'a, G: Html>(
    cx: Scope<'a>,
    controller: &'ctx DashboardController<'ctx>,
) -> View<G> {
    let screen = controller.screen();
    debug!(?screen, "Rendering main area");
    match screen {
        Screen::Add => view! {cx,
            div(class="recipe-editor") { h2 { "New Recipe" } }
        },
        Screen::Delete => view! {cx,
            div(class="delete-recipe") { h2 { "Delete Recipe" } }
        },
        Screen::Search => view! {cx,
            div(class="search-recipe") { h2 { "Search Recipes" } }
        },
        Screen::SelectPrompt(view) => {
            let msg = format!("Select a recipe to {}", view);
            view! {cx,
                div(class="load-recipe-screen") { p { (msg) } }
            }
        }
        Screen::Loading(_) => loading(cx),
        Screen::Failed { error, .. } => {
            let msg = format!("{}", error);
            view! {cx,
                div(class="load-recipe-screen") {
                    p { "Unable to load recipe: " (msg) }
                    button(on:click=move |_| { controller.retry_recipe(); }) { "Retry" }
                }
            }
        }
        Screen::Viewing(recipe) => {
            let fields = recipe_fields(&recipe);
            view! {cx,
                div(class="recipe-viewer") {
                    h1(class="recipe_title") { (recipe.title) }
                    pre { (fields) }
                }
            }
        }
        Screen::Editing(recipe) => {
            let fields = recipe_fields(&recipe);
            view! {cx,
                div(class="recipe-editor") {
                    h2 { "Editing " (recipe.title) }
                    textarea(rows=20) { (fields) }
                    button(on:click=move |_| controller.save_success()) { "Done" }
                }
            }
        }
    }
}

fn recipe_picker<'a, 'ctx: 'a, G: Html>(
    cx: Scope<'a>,
    controller: &'ctx DashboardController<'ctx>,
    selection: &'ctx Signal<String>,
) -> View<G> {
    view! {cx,
        div(class="dashboard-side-region") {
            input(type="number", bind:value=selection)
            button(on:click=move |_| {
                let id = selection.get_untracked().trim().parse::<RecipeId>().ok();
                controller.select(id);
            }) { "Open" }
        }
    }
}

#[derive(Props)]
pub struct DashboardProps<'ctx> {
    controller: &'ctx DashboardController<'ctx>,
}

#[instrument(skip_all)]
#[component]
pub fn Dashboard<'ctx, G: Html>(cx: Scope<'ctx>, props: DashboardProps<'ctx>) -> View<G> {
    let DashboardProps { controller } = props;
    let selection = controller.picker_text(cx);
    view! {cx,
        (match controller.gate() {
            Gate::Ready => view! {cx,
                main(class="dashboard") {
                    div(class="dashboard-main-region") {
                        (task_bar(cx, controller))
                        (failure_banner(cx, controller))
                        div(class="main-area") { (main_area(cx, controller)) }
                    }
                    (recipe_picker(cx, controller, selection))
                }
            },
            Gate::Verifying | Gate::Redirected => view! {cx,
                div(class="full-screen-loader") { "Verifying Access..." }
            },
        })
    }
}
