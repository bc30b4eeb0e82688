// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    #[default]
    En,
    Pt,
}

// Nosso extrator de idioma
#[derive(Debug, Clone, Copy, Default)]
pub struct Locale(pub Lang);

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let lang = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .and_then(|header_str| {
                accept_language::parse(header_str)
                    .first()
                    // "pt-BR" -> "pt"
                    .map(|tag| tag.split('-').next().unwrap_or(tag).to_lowercase())
            })
            .map(|primary| if primary == "pt" { Lang::Pt } else { Lang::En })
            .unwrap_or_default();

        Ok(Locale(lang))
    }
}

/// Textos da interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    AppName,
    Loading,
    // navegação / títulos
    Dashboard,
    DashboardSubtitle,
    Customers,
    CustomersSubtitle,
    Products,
    ProductsSubtitle,
    Inventory,
    InventorySubtitle,
    Sales,
    SalesSubtitle,
    Purchases,
    PurchasesSubtitle,
    Accounting,
    AccountingSubtitle,
    Payroll,
    PayrollSubtitle,
    Reports,
    ReportsSubtitle,
    Documents,
    DocumentsSubtitle,
    Settings,
    SettingsSubtitle,
    // clientes
    SearchCustomers,
    AddCustomer,
    LoadingCustomers,
    ErrorLoadingCustomers,
    // produtos
    SearchProducts,
    AddProduct,
    LoadingProducts,
    ErrorLoadingProducts,
    InStock,
    // campos
    Name,
    Email,
    Phone,
    Status,
    Balance,
    TaxId,
    Address,
    Code,
    Description,
    UnitPrice,
    StockQuantity,
    Password,
    Search,
    Save,
    // sessão
    SignIn,
    SignOut,
}

impl Locale {
    pub fn t(&self, msg: Msg) -> &'static str {
        use Msg::*;
        match (self.0, msg) {
            (_, AppName) => "SynerCore",

            (Lang::Pt, Loading) => "Carregando...",
            (Lang::En, Loading) => "Loading...",

            (Lang::Pt, Dashboard) => "Painel",
            (Lang::En, Dashboard) => "Dashboard",
            (Lang::Pt, DashboardSubtitle) => "Bem-vindo ao SynerCore, sistema de gestão empresarial",
            (Lang::En, DashboardSubtitle) => "Welcome to SynerCore Enterprise Management System",
            (Lang::Pt, Customers) => "Clientes",
            (Lang::En, Customers) => "Customers",
            (Lang::Pt, CustomersSubtitle) => "Gerencie o relacionamento com seus clientes",
            (Lang::En, CustomersSubtitle) => "Manage your customer relationships",
            (Lang::Pt, Products) => "Produtos",
            (Lang::En, Products) => "Products",
            (Lang::Pt, ProductsSubtitle) => "Gerencie seu catálogo de produtos",
            (Lang::En, ProductsSubtitle) => "Manage your product catalog",
            (Lang::Pt, Inventory) => "Estoque",
            (Lang::En, Inventory) => "Inventory",
            (Lang::Pt, InventorySubtitle) => "Gerencie o estoque dos seus produtos aqui.",
            (Lang::En, InventorySubtitle) => "Manage your product inventory here.",
            (Lang::Pt, Sales) => "Vendas",
            (Lang::En, Sales) => "Sales",
            (Lang::Pt, SalesSubtitle) => "Acompanhe seus pedidos de venda aqui.",
            (Lang::En, SalesSubtitle) => "Track your sales orders here.",
            (Lang::Pt, Purchases) => "Compras",
            (Lang::En, Purchases) => "Purchases",
            (Lang::Pt, PurchasesSubtitle) => "Acompanhe seus pedidos de compra aqui.",
            (Lang::En, PurchasesSubtitle) => "Track your purchase orders here.",
            (Lang::Pt, Accounting) => "Contabilidade",
            (Lang::En, Accounting) => "Accounting",
            (Lang::Pt, AccountingSubtitle) => "Acompanhe seus registros financeiros e transações aqui.",
            (Lang::En, AccountingSubtitle) => "Track your financial records and transactions here.",
            (Lang::Pt, Payroll) => "Folha de Pagamento",
            (Lang::En, Payroll) => "Payroll",
            (Lang::Pt, PayrollSubtitle) => "Gerencie salários e pagamentos dos funcionários aqui.",
            (Lang::En, PayrollSubtitle) => "Manage employee salaries and payments here.",
            (Lang::Pt, Reports) => "Relatórios",
            (Lang::En, Reports) => "Reports",
            (Lang::Pt, ReportsSubtitle) => "Veja e analise os relatórios do seu negócio",
            (Lang::En, ReportsSubtitle) => "View and analyze your business reports",
            (Lang::Pt, Documents) => "Documentos",
            (Lang::En, Documents) => "Documents",
            (Lang::Pt, DocumentsSubtitle) => "Gerencie os documentos do seu negócio",
            (Lang::En, DocumentsSubtitle) => "Manage your business documents",
            (Lang::Pt, Settings) => "Configurações",
            (Lang::En, Settings) => "Settings",
            (Lang::Pt, SettingsSubtitle) => "Configure as preferências da aplicação aqui.",
            (Lang::En, SettingsSubtitle) => "Configure your application preferences here.",

            (Lang::Pt, SearchCustomers) => "Buscar clientes...",
            (Lang::En, SearchCustomers) => "Search customers...",
            (Lang::Pt, AddCustomer) => "Adicionar Cliente",
            (Lang::En, AddCustomer) => "Add Customer",
            (Lang::Pt, LoadingCustomers) => "Carregando clientes...",
            (Lang::En, LoadingCustomers) => "Loading customers...",
            (Lang::Pt, ErrorLoadingCustomers) => "Erro ao carregar clientes",
            (Lang::En, ErrorLoadingCustomers) => "Error loading customers",

            (Lang::Pt, SearchProducts) => "Buscar produtos...",
            (Lang::En, SearchProducts) => "Search products...",
            (Lang::Pt, AddProduct) => "Adicionar Produto",
            (Lang::En, AddProduct) => "Add Product",
            (Lang::Pt, LoadingProducts) => "Carregando produtos...",
            (Lang::En, LoadingProducts) => "Loading products...",
            (Lang::Pt, ErrorLoadingProducts) => "Erro ao carregar produtos",
            (Lang::En, ErrorLoadingProducts) => "Error loading products",
            (Lang::Pt, InStock) => "Em estoque",
            (Lang::En, InStock) => "In stock",

            (Lang::Pt, Name) => "Nome",
            (Lang::En, Name) => "Name",
            (_, Email) => "Email",
            (Lang::Pt, Phone) => "Telefone",
            (Lang::En, Phone) => "Phone",
            (Lang::Pt, Status) => "Situação",
            (Lang::En, Status) => "Status",
            (Lang::Pt, Balance) => "Saldo",
            (Lang::En, Balance) => "Balance",
            (Lang::Pt, TaxId) => "CPF/CNPJ",
            (Lang::En, TaxId) => "Tax ID",
            (Lang::Pt, Address) => "Endereço",
            (Lang::En, Address) => "Address",
            (Lang::Pt, Code) => "Código",
            (Lang::En, Code) => "Code",
            (Lang::Pt, Description) => "Descrição",
            (Lang::En, Description) => "Description",
            (Lang::Pt, UnitPrice) => "Preço unitário",
            (Lang::En, UnitPrice) => "Unit price",
            (Lang::Pt, StockQuantity) => "Quantidade em estoque",
            (Lang::En, StockQuantity) => "Stock quantity",
            (Lang::Pt, Password) => "Senha",
            (Lang::En, Password) => "Password",
            (Lang::Pt, Search) => "Buscar",
            (Lang::En, Search) => "Search",
            (Lang::Pt, Save) => "Salvar",
            (Lang::En, Save) => "Save",

            (Lang::Pt, SignIn) => "Entrar",
            (Lang::En, SignIn) => "Sign in",
            (Lang::Pt, SignOut) => "Sair",
            (Lang::En, SignOut) => "Sign out",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn locale_for(header: Option<&str>) -> Locale {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(header::ACCEPT_LANGUAGE, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Locale::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn picks_primary_language() {
        assert_eq!(locale_for(Some("pt-BR,pt;q=0.9,en;q=0.8")).await.0, Lang::Pt);
        assert_eq!(locale_for(Some("en-US")).await.0, Lang::En);
        assert_eq!(locale_for(Some("de")).await.0, Lang::En);
        assert_eq!(locale_for(None).await.0, Lang::En);
    }

    #[test]
    fn translates_page_chrome() {
        assert_eq!(Locale(Lang::Pt).t(Msg::Customers), "Clientes");
        assert_eq!(Locale(Lang::En).t(Msg::LoadingCustomers), "Loading customers...");
    }
}
