// src/handlers/pages.rs
//
// Páginas estáticas: só texto, sem dados ligados.

use axum::response::Html;

use crate::{
    handlers::layout,
    middleware::{
        auth::CurrentSession,
        i18n::{Locale, Msg},
    },
};

fn static_page(locale: &Locale, session: CurrentSession, path: &str, title: Msg, subtitle: Msg) -> Html<String> {
    let CurrentSession(session) = session;
    let content = layout::page_header(locale.t(title), locale.t(subtitle));
    layout::render_page(locale, &session, path, &content)
}

// Indicadores fixos do painel.
const DASHBOARD_STATS: &[(&str, &str, Option<&str>)] = &[
    ("Total Revenue", "$54,239", Some("+12.5% from last month")),
    ("Active Customers", "1,429", Some("+4.3% from last month")),
    ("Products Sold", "2,834", Some("+8.1% from last month")),
    ("Pending Orders", "42", None),
];

// GET /
pub async fn dashboard(locale: Locale, CurrentSession(session): CurrentSession) -> Html<String> {
    let mut content = layout::page_header(locale.t(Msg::Dashboard), locale.t(Msg::DashboardSubtitle));

    content.push_str(r#"<div class="cards">"#);
    for (title, value, trend) in DASHBOARD_STATS {
        content.push_str(&format!(
            r#"<div class="card"><p>{}</p><h3>{}</h3>{}</div>"#,
            title,
            value,
            trend.map(|t| format!("<small>{}</small>", t)).unwrap_or_default()
        ));
    }
    content.push_str("</div>");

    layout::render_page(&locale, &session, "/", &content)
}

pub async fn inventory(locale: Locale, session: CurrentSession) -> Html<String> {
    static_page(&locale, session, "/inventory", Msg::Inventory, Msg::InventorySubtitle)
}

pub async fn sales(locale: Locale, session: CurrentSession) -> Html<String> {
    static_page(&locale, session, "/sales", Msg::Sales, Msg::SalesSubtitle)
}

pub async fn purchases(locale: Locale, session: CurrentSession) -> Html<String> {
    static_page(&locale, session, "/purchases", Msg::Purchases, Msg::PurchasesSubtitle)
}

pub async fn accounting(locale: Locale, session: CurrentSession) -> Html<String> {
    static_page(&locale, session, "/accounting", Msg::Accounting, Msg::AccountingSubtitle)
}

pub async fn payroll(locale: Locale, session: CurrentSession) -> Html<String> {
    static_page(&locale, session, "/payroll", Msg::Payroll, Msg::PayrollSubtitle)
}

pub async fn reports(locale: Locale, session: CurrentSession) -> Html<String> {
    static_page(&locale, session, "/reports", Msg::Reports, Msg::ReportsSubtitle)
}

pub async fn documents(locale: Locale, session: CurrentSession) -> Html<String> {
    static_page(&locale, session, "/documents", Msg::Documents, Msg::DocumentsSubtitle)
}

pub async fn settings(locale: Locale, session: CurrentSession) -> Html<String> {
    static_page(&locale, session, "/settings", Msg::Settings, Msg::SettingsSubtitle)
}
