//! Permission catalog
//!
//! Every action a role can be granted, grouped into twelve fixed
//! categories. The catalog is static data shipped with each release; the
//! client never sends an action that is not listed here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed permission categories, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionCategory {
    Bank,
    Invoices,
    Bills,
    Expenses,
    Customers,
    Vendors,
    Ledger,
    Products,
    Tax,
    Reports,
    Companion,
    Settings,
}

impl PermissionCategory {
    pub const ALL: [PermissionCategory; 12] = [
        PermissionCategory::Bank,
        PermissionCategory::Invoices,
        PermissionCategory::Bills,
        PermissionCategory::Expenses,
        PermissionCategory::Customers,
        PermissionCategory::Vendors,
        PermissionCategory::Ledger,
        PermissionCategory::Products,
        PermissionCategory::Tax,
        PermissionCategory::Reports,
        PermissionCategory::Companion,
        PermissionCategory::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionCategory::Bank => "bank",
            PermissionCategory::Invoices => "invoices",
            PermissionCategory::Bills => "bills",
            PermissionCategory::Expenses => "expenses",
            PermissionCategory::Customers => "customers",
            PermissionCategory::Vendors => "vendors",
            PermissionCategory::Ledger => "ledger",
            PermissionCategory::Products => "products",
            PermissionCategory::Tax => "tax",
            PermissionCategory::Reports => "reports",
            PermissionCategory::Companion => "companion",
            PermissionCategory::Settings => "settings",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PermissionCategory::Bank => "Banking",
            PermissionCategory::Invoices => "Invoices",
            PermissionCategory::Bills => "Bills",
            PermissionCategory::Expenses => "Expenses",
            PermissionCategory::Customers => "Customers",
            PermissionCategory::Vendors => "Vendors",
            PermissionCategory::Ledger => "General ledger",
            PermissionCategory::Products => "Products & services",
            PermissionCategory::Tax => "Tax",
            PermissionCategory::Reports => "Reports",
            PermissionCategory::Companion => "AI Companion",
            PermissionCategory::Settings => "Workspace settings",
        }
    }
}

impl fmt::Display for PermissionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PermissionCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("Unknown permission category: {}", s))
    }
}

/// One grantable action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionSpec {
    /// Dot-namespaced unique id, e.g. "bank.reconcile"
    pub action: &'static str,
    pub category: PermissionCategory,
    pub label: &'static str,
    pub description: &'static str,
    /// Highlighted in the editor; usually part of a segregation-of-duties pair
    pub sensitive: bool,
}

const fn spec(
    action: &'static str,
    category: PermissionCategory,
    label: &'static str,
    description: &'static str,
    sensitive: bool,
) -> PermissionSpec {
    PermissionSpec {
        action,
        category,
        label,
        description,
        sensitive,
    }
}

use PermissionCategory as C;

#[rustfmt::skip]
pub static PERMISSIONS: &[PermissionSpec] = &[
    // Banking
    spec("bank.view", C::Bank, "View bank accounts", "See bank feeds, balances and transactions.", false),
    spec("bank.import", C::Bank, "Import statements", "Upload statements and connect bank feeds.", false),
    spec("bank.categorize", C::Bank, "Categorize transactions", "Match and categorize bank transactions.", false),
    spec("bank.reconcile", C::Bank, "Reconcile accounts", "Complete and reopen bank reconciliations.", true),
    spec("bank.accounts.manage", C::Bank, "Manage bank accounts", "Add, edit or archive bank accounts.", true),
    // Invoices
    spec("invoices.view", C::Invoices, "View invoices", "See customer invoices and their status.", false),
    spec("invoices.create", C::Invoices, "Create invoices", "Draft and edit customer invoices.", false),
    spec("invoices.send", C::Invoices, "Send invoices", "Email invoices and reminders to customers.", false),
    spec("invoices.approve", C::Invoices, "Approve invoices", "Approve invoices before they are posted.", true),
    spec("invoices.void", C::Invoices, "Void invoices", "Void or write off posted invoices.", true),
    // Bills
    spec("bills.view", C::Bills, "View bills", "See vendor bills and their status.", false),
    spec("bills.create", C::Bills, "Create bills", "Enter and edit vendor bills.", false),
    spec("bills.approve", C::Bills, "Approve bills", "Approve bills for payment.", true),
    spec("bills.pay", C::Bills, "Pay bills", "Schedule and record bill payments.", true),
    // Expenses
    spec("expenses.view", C::Expenses, "View expenses", "See expense claims and receipts.", false),
    spec("expenses.create", C::Expenses, "Submit expenses", "Create expense claims and upload receipts.", false),
    spec("expenses.approve", C::Expenses, "Approve expenses", "Approve or reject expense claims.", true),
    // Customers
    spec("customers.view", C::Customers, "View customers", "See customer records and statements.", false),
    spec("customers.manage", C::Customers, "Manage customers", "Create, edit and merge customers.", false),
    spec("customers.credit", C::Customers, "Issue credit notes", "Issue credit notes and refunds.", true),
    // Vendors
    spec("vendors.view", C::Vendors, "View vendors", "See vendor records and balances.", false),
    spec("vendors.manage", C::Vendors, "Manage vendors", "Create and edit vendors.", false),
    spec("vendors.bank_details", C::Vendors, "Change vendor bank details", "Edit the bank details payments are sent to.", true),
    // General ledger
    spec("ledger.view", C::Ledger, "View ledger", "See the chart of accounts and journal.", false),
    spec("ledger.journal.post", C::Ledger, "Post journal entries", "Create and post manual journal entries.", true),
    spec("ledger.accounts.manage", C::Ledger, "Manage chart of accounts", "Add, rename or archive ledger accounts.", false),
    spec("ledger.period.close", C::Ledger, "Close periods", "Lock and reopen accounting periods.", true),
    // Products & services
    spec("products.view", C::Products, "View products", "See products, services and prices.", false),
    spec("products.manage", C::Products, "Manage products", "Create and edit products and price lists.", false),
    // Tax
    spec("tax.view", C::Tax, "View tax", "See tax rates, returns and Tax Guardian findings.", false),
    spec("tax.settings", C::Tax, "Manage tax settings", "Edit tax rates and registrations.", false),
    spec("tax.file", C::Tax, "File returns", "Submit tax returns to the authority.", true),
    // Reports
    spec("reports.view", C::Reports, "View reports", "Run financial and management reports.", false),
    spec("reports.export", C::Reports, "Export reports", "Download reports and raw ledger exports.", false),
    // AI Companion
    spec("companion.view", C::Companion, "View suggestions", "See AI Companion suggestions and anomalies.", false),
    spec("companion.apply", C::Companion, "Apply suggestions", "Accept companion suggestions that change the books.", true),
    spec("companion.close", C::Companion, "Run close assistant", "Use the close assistant to prepare period close.", false),
    // Workspace settings
    spec("settings.company", C::Settings, "Company profile", "Edit company details and branding.", false),
    spec("settings.users.manage", C::Settings, "Manage users", "Invite, deactivate and assign roles to users.", true),
    spec("settings.roles.manage", C::Settings, "Manage roles", "Create and edit roles and their permissions.", true),
    spec("settings.billing", C::Settings, "Manage billing", "Change the subscription and payment method.", true),
];

/// Specs in `category`, in declaration order
pub fn permissions_by_category(category: PermissionCategory) -> Vec<&'static PermissionSpec> {
    PERMISSIONS
        .iter()
        .filter(|p| p.category == category)
        .collect()
}

/// Specs for a category given by name; an unknown name yields no specs
pub fn permissions_by_category_name(name: &str) -> Vec<&'static PermissionSpec> {
    name.parse()
        .map(permissions_by_category)
        .unwrap_or_default()
}

/// Look up a spec by action id
pub fn find_permission(action: &str) -> Option<&'static PermissionSpec> {
    PERMISSIONS.iter().find(|p| p.action == action)
}

pub fn is_known_action(action: &str) -> bool {
    find_permission(action).is_some()
}

/// Actions flagged as sensitive, in declaration order
pub fn sensitive_actions() -> impl Iterator<Item = &'static str> {
    PERMISSIONS.iter().filter(|p| p.sensitive).map(|p| p.action)
}
