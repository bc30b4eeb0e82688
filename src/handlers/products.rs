// src/handlers/products.rs

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{Html, Response},
    Form,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{AppError, SharedError},
    config::AppState,
    handlers::{
        forms::{empty_as_none, finish_mutation, SearchParams},
        layout::{self, escape},
    },
    hooks::{use_products, HookState},
    middleware::{
        auth::CurrentSession,
        i18n::{Locale, Msg},
    },
    models::{
        auth::Session,
        inventory::{filter_products, NewProduct, Product, ProductChanges},
    },
};

#[derive(Debug, Deserialize)]
pub struct ProductForm {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub unit_price: Option<Decimal>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub stock_quantity: Option<Decimal>,
}

impl ProductForm {
    fn into_new(self) -> NewProduct {
        NewProduct {
            code: self.code.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            description: self.description,
            unit_price: self.unit_price.unwrap_or_default(),
            stock_quantity: self.stock_quantity.unwrap_or_default(),
        }
    }

    fn into_changes(self) -> ProductChanges {
        ProductChanges {
            code: self.code,
            name: self.name,
            description: self.description,
            unit_price: self.unit_price,
            stock_quantity: self.stock_quantity,
        }
    }
}

// GET /products
pub async fn products_page(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentSession(session): CurrentSession,
    Query(params): Query<SearchParams>,
) -> Html<String> {
    let state = use_products(&app_state, &session).load().await;
    render(&locale, &session, &state, &params.search)
}

// POST /products
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentSession(session): CurrentSession,
    Form(form): Form<ProductForm>,
) -> Response {
    let hook = use_products(&app_state, &session);
    let new = form.into_new();

    let result: Result<(), SharedError> = match new.validate() {
        Ok(()) => hook.create(new).await.map(|_| ()),
        Err(e) => Err(Arc::new(AppError::ValidationError(e))),
    };

    finish_mutation(&hook, result, "/products", |state| render(&locale, &session, state, "")).await
}

// POST /products/{id}
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Form(form): Form<ProductForm>,
) -> Response {
    let hook = use_products(&app_state, &session);
    let changes = form.into_changes();

    let result: Result<(), SharedError> = match changes.validate() {
        Ok(()) => hook.update(id, changes).await.map(|_| ()),
        Err(e) => Err(Arc::new(AppError::ValidationError(e))),
    };

    finish_mutation(&hook, result, "/products", |state| render(&locale, &session, state, "")).await
}

fn render(locale: &Locale, session: &Session, state: &HookState<Product>, search: &str) -> Html<String> {
    layout::render_page(locale, session, "/products", &products_content(locale, state, search))
}

pub fn products_content(locale: &Locale, state: &HookState<Product>, search: &str) -> String {
    let mut html = layout::page_header(locale.t(Msg::Products), locale.t(Msg::ProductsSubtitle));

    html.push_str(&format!(
        r#"<form method="post" action="/products" class="new">
<input name="code" placeholder="{code}" required>
<input name="name" placeholder="{name}" required>
<input name="description" placeholder="{description}">
<input name="unit_price" inputmode="decimal" placeholder="{price}">
<input name="stock_quantity" inputmode="decimal" placeholder="{stock}">
<button type="submit">{add}</button>
</form>
<form method="get" action="/products" class="search">
<input name="search" value="{search}" placeholder="{search_placeholder}">
<button type="submit">{search_label}</button>
</form>"#,
        code = locale.t(Msg::Code),
        name = locale.t(Msg::Name),
        description = locale.t(Msg::Description),
        price = locale.t(Msg::UnitPrice),
        stock = locale.t(Msg::StockQuantity),
        add = locale.t(Msg::AddProduct),
        search = escape(search),
        search_placeholder = locale.t(Msg::SearchProducts),
        search_label = locale.t(Msg::Search),
    ));

    if let Some(err) = &state.error {
        html.push_str(&format!(
            r#"<div class="error">{}: {}</div>"#,
            locale.t(Msg::ErrorLoadingProducts),
            escape(&err.public_message())
        ));
        return html;
    }

    let products = match (&state.data, state.is_loading) {
        (Some(products), false) => products,
        _ => {
            html.push_str(&format!(r#"<p class="loading">{}</p>"#, locale.t(Msg::LoadingProducts)));
            return html;
        }
    };

    html.push_str(r#"<div class="cards">"#);
    for product in filter_products(products, search) {
        html.push_str(&product_card(locale, product));
    }
    html.push_str("</div>");
    html
}

fn product_card(locale: &Locale, product: &Product) -> String {
    format!(
        r#"<div class="card"><h3>{name}</h3><small>{code}</small><p>{description}</p>
<p><strong>{price}</strong> · {in_stock}: {stock}</p>
<form method="post" action="/products/{id}">
<input name="name" value="{name}">
<input name="unit_price" value="{price}" inputmode="decimal">
<input name="stock_quantity" value="{stock}" inputmode="decimal">
<button type="submit">{save}</button></form></div>"#,
        id = product.id,
        name = escape(&product.name),
        code = escape(&product.code),
        description = escape(product.description.as_deref().unwrap_or("")),
        price = product.unit_price,
        in_stock = locale.t(Msg::InStock),
        stock = product.stock_quantity,
        save = locale.t(Msg::Save),
    )
}
