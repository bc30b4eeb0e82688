// src/handlers/customers.rs

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
    hooks::{use_customers, HookState},
    middleware::{
        auth::CurrentSession,
        i18n::{Locale, Msg},
    },
    models::{
        auth::Session,
        crm::{filter_customers, Customer, CustomerChanges, CustomerStatus, NewCustomer},
    },
};

// Campos do formulário de cliente; vazio = não informado.
#[derive(Debug, Deserialize)]
pub struct CustomerForm {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub tax_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub status: Option<CustomerStatus>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub account_balance: Option<Decimal>,
}

impl CustomerForm {
    fn into_new(self) -> NewCustomer {
        NewCustomer {
            name: self.name.unwrap_or_default(),
            tax_id: self.tax_id,
            email: self.email,
            phone: self.phone,
            address: self.address,
            status: self.status.unwrap_or_default(),
            account_balance: self.account_balance.unwrap_or_default(),
            salesperson_id: None,
        }
    }

    fn into_changes(self) -> CustomerChanges {
        CustomerChanges {
            name: self.name,
            tax_id: self.tax_id,
            email: self.email,
            phone: self.phone,
            address: self.address,
            status: self.status,
            account_balance: self.account_balance,
            salesperson_id: None,
        }
    }
}

// GET /customers
pub async fn customers_page(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentSession(session): CurrentSession,
    Query(params): Query<SearchParams>,
) -> Html<String> {
    let state = use_customers(&app_state, &session).load().await;
    render(&locale, &session, &state, &params.search)
}

// POST /customers
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentSession(session): CurrentSession,
    Form(form): Form<CustomerForm>,
) -> Response {
    let hook = use_customers(&app_state, &session);
    let new = form.into_new();

    let result: Result<(), SharedError> = match new.validate() {
        Ok(()) => hook.create(new).await.map(|_| ()),
        Err(e) => Err(Arc::new(AppError::ValidationError(e))),
    };

    finish_mutation(&hook, result, "/customers", |state| render(&locale, &session, state, "")).await
}

// POST /customers/{id}
pub async fn update_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Form(form): Form<CustomerForm>,
) -> Response {
    let hook = use_customers(&app_state, &session);
    let changes = form.into_changes();

    let result: Result<(), SharedError> = match changes.validate() {
        Ok(()) => hook.update(id, changes).await.map(|_| ()),
        Err(e) => Err(Arc::new(AppError::ValidationError(e))),
    };

    finish_mutation(&hook, result, "/customers", |state| render(&locale, &session, state, "")).await
}

fn render(locale: &Locale, session: &Session, state: &HookState<Customer>, search: &str) -> Html<String> {
    layout::render_page(locale, session, "/customers", &customers_content(locale, state, search))
}

pub fn customers_content(locale: &Locale, state: &HookState<Customer>, search: &str) -> String {
    let mut html = layout::page_header(locale.t(Msg::Customers), locale.t(Msg::CustomersSubtitle));

    html.push_str(&format!(
        r#"<form method="post" action="/customers" class="new">
<input name="name" placeholder="{name}" required>
<input name="email" type="email" placeholder="{email}">
<input name="phone" placeholder="{phone}">
<input name="tax_id" placeholder="{tax_id}">
<input name="address" placeholder="{address}">
<button type="submit">{add}</button>
</form>
<form method="get" action="/customers" class="search">
<input name="search" value="{search}" placeholder="{search_placeholder}">
<button type="submit">{search_label}</button>
</form>"#,
        name = locale.t(Msg::Name),
        email = locale.t(Msg::Email),
        phone = locale.t(Msg::Phone),
        tax_id = locale.t(Msg::TaxId),
        address = locale.t(Msg::Address),
        add = locale.t(Msg::AddCustomer),
        search = escape(search),
        search_placeholder = locale.t(Msg::SearchCustomers),
        search_label = locale.t(Msg::Search),
    ));

    // Com erro, só a mensagem: nada de tabela.
    if let Some(err) = &state.error {
        html.push_str(&format!(
            r#"<div class="error">{}: {}</div>"#,
            locale.t(Msg::ErrorLoadingCustomers),
            escape(&err.public_message())
        ));
        return html;
    }

    html.push_str(&format!(
        "<table><thead><tr><th>{}</th><th>{}</th><th>{}</th><th>{}</th><th>{}</th><th></th></tr></thead><tbody>",
        locale.t(Msg::Name),
        locale.t(Msg::Email),
        locale.t(Msg::Phone),
        locale.t(Msg::Status),
        locale.t(Msg::Balance),
    ));

    match (&state.data, state.is_loading) {
        (Some(customers), false) => {
            for customer in filter_customers(customers, search) {
                html.push_str(&customer_row(locale, customer));
            }
        }
        _ => html.push_str(&format!(
            r#"<tr><td colspan="6">{}</td></tr>"#,
            locale.t(Msg::LoadingCustomers)
        )),
    }

    html.push_str("</tbody></table>");
    html
}

fn customer_row(locale: &Locale, customer: &Customer) -> String {
    let status_options: String = [CustomerStatus::Active, CustomerStatus::Inactive]
        .iter()
        .map(|status| {
            let selected = if *status == customer.status { " selected" } else { "" };
            format!(r#"<option value="{0}"{1}>{0}</option>"#, status.as_str(), selected)
        })
        .collect();

    format!(
        r#"<tr><td>{name}</td><td>{email}</td><td>{phone}</td><td>{status}</td><td>{balance}</td>
<td><form method="post" action="/customers/{id}">
<input name="name" value="{name}"><input name="email" value="{email}">
<select name="status">{options}</select>
<button type="submit">{save}</button></form></td></tr>"#,
        id = customer.id,
        name = escape(&customer.name),
        email = escape(customer.email.as_deref().unwrap_or("")),
        phone = escape(customer.phone.as_deref().unwrap_or("")),
        status = customer.status.as_str(),
        balance = customer.account_balance,
        options = status_options,
        save = locale.t(Msg::Save),
    )
}
