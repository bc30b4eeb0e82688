// src/handlers/layout.rs
//
// Casca HTML das páginas: barra lateral, cabeçalho com o usuário e o conteúdo.

use axum::response::Html;

use crate::{
    middleware::i18n::{Locale, Msg},
    models::auth::Session,
};

pub struct NavItem {
    pub href: &'static str,
    pub label: Msg,
}

// Ordem da barra lateral.
pub const NAVIGATION: &[NavItem] = &[
    NavItem { href: "/", label: Msg::Dashboard },
    NavItem { href: "/customers", label: Msg::Customers },
    NavItem { href: "/products", label: Msg::Products },
    NavItem { href: "/inventory", label: Msg::Inventory },
    NavItem { href: "/sales", label: Msg::Sales },
    NavItem { href: "/purchases", label: Msg::Purchases },
    NavItem { href: "/accounting", label: Msg::Accounting },
    NavItem { href: "/payroll", label: Msg::Payroll },
    NavItem { href: "/reports", label: Msg::Reports },
    NavItem { href: "/documents", label: Msg::Documents },
    NavItem { href: "/settings", label: Msg::Settings },
];

const STYLE: &str = "body{margin:0;font-family:sans-serif;display:flex;min-height:100vh}\
nav{width:14rem;background:#1f2937;color:#fff;padding:1rem}\
nav a{display:block;color:#d1d5db;padding:.4rem .6rem;text-decoration:none;border-radius:.3rem}\
nav a.active{background:#374151;color:#fff}\
main{flex:1;padding:1.5rem}\
header{display:flex;justify-content:space-between;align-items:center;margin-bottom:1rem}\
table{width:100%;border-collapse:collapse}td,th{padding:.5rem;border-bottom:1px solid #e5e7eb;text-align:left}\
.error{color:#b91c1c;padding:.75rem;background:#fef2f2;border-radius:.3rem}\
.cards{display:grid;grid-template-columns:repeat(auto-fill,minmax(16rem,1fr));gap:1rem}\
.card{border:1px solid #e5e7eb;border-radius:.4rem;padding:1rem}";

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Página completa, com navegação. `current` marca o item ativo.
pub fn render_page(locale: &Locale, session: &Session, current: &str, content: &str) -> Html<String> {
    let nav: String = NAVIGATION
        .iter()
        .map(|item| {
            let class = if item.href == current { r#" class="active""# } else { "" };
            format!(r#"<a href="{}"{}>{}</a>"#, item.href, class, locale.t(item.label))
        })
        .collect();

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{app}</title><style>{style}</style></head>
<body>
<nav><h2>{app}</h2>{nav}</nav>
<main>
<header><span></span><div><span>{email}</span>
<form method="post" action="/logout" style="display:inline"><button type="submit">{sign_out}</button></form></div></header>
{content}
</main>
</body>
</html>"#,
        app = locale.t(Msg::AppName),
        style = STYLE,
        nav = nav,
        email = escape(&session.email),
        sign_out = locale.t(Msg::SignOut),
        content = content,
    ))
}

/// Página sem a casca (login, carregando).
pub fn render_bare(locale: &Locale, title: &str, content: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{app} | {title}</title><style>{style}</style></head>
<body><main>{content}</main></body>
</html>"#,
        app = locale.t(Msg::AppName),
        title = escape(title),
        style = STYLE,
        content = content,
    ))
}

pub fn page_header(title: &str, subtitle: &str) -> String {
    format!("<h1>{}</h1><p>{}</p>", escape(title), escape(subtitle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::i18n::Lang;
    use uuid::Uuid;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"<b>"Tom & Jerry's"</b>"#), "&lt;b&gt;&quot;Tom &amp; Jerry&#39;s&quot;&lt;/b&gt;");
    }

    #[test]
    fn marks_the_current_page_and_shows_user() {
        let session = Session { user_id: Uuid::new_v4(), company_id: Uuid::new_v4(), email: "ana@x.com".into() };
        let Html(html) = render_page(&Locale(Lang::En), &session, "/products", "<p>corpo</p>");

        assert!(html.contains(r#"<a href="/products" class="active">Products</a>"#));
        assert!(html.contains(r#"<a href="/customers">Customers</a>"#));
        assert!(html.contains("ana@x.com"));
        assert!(html.contains("<p>corpo</p>"));
    }
}
