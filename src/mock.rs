//! Deterministic blueprint derived purely from the request. Used whenever no
//! provider produced a usable answer.

use crate::models::{
    ArchitectureBlueprint, Column, DatabaseTable, FolderStructure, GenerateRequest, Monetization, RoleSpec, TenantType,
};

pub const SOURCE: &str = "mock";

const BASE_MVP_FEATURES: [&str; 5] = [
    "User authentication and authorization",
    "Core feature based on your idea",
    "Dashboard for users",
    "Basic CRUD operations",
    "Responsive UI design",
];

const FUTURE_FEATURES: [&str; 5] = [
    "Advanced analytics and reporting",
    "Third-party integrations",
    "Mobile application",
    "API for external developers",
    "Advanced customization options",
];

const ADMIN_PERMISSIONS: [&str; 5] = ["create", "read", "update", "delete", "manage_users"];
const MEMBER_PERMISSIONS: [&str; 2] = ["read", "update"];

pub fn mock_blueprint(req: &GenerateRequest) -> ArchitectureBlueprint {
    let mut mvp_features = strings(&BASE_MVP_FEATURES);
    mvp_features.extend(strings(monetization_features(req.monetization)));

    ArchitectureBlueprint {
        project_summary: summary(req),
        mvp_features,
        future_features: strings(&FUTURE_FEATURES),
        roles: req.roles.iter().map(|r| role(r)).collect(),
        database_schema: database_schema(req),
        folder_structure: folder_structure(req.monetization),
    }
}

fn summary(req: &GenerateRequest) -> String {
    let tenancy = match req.tenant_type {
        TenantType::Single => "single-tenant",
        TenantType::Multi => "multi-tenant",
    };
    let stack = if req.tech_stack.is_empty() { "modern technologies".to_string() } else { req.tech_stack.join(", ") };
    format!("A {} {tenancy} SaaS application built with {stack}. {}", req.monetization, req.idea)
}

pub fn monetization_features(m: Monetization) -> &'static [&'static str] {
    match m {
        Monetization::Subscription => &[
            "Recurring billing with plan management",
            "Payment webhook handling for subscription lifecycle events",
            "Plan upgrade and downgrade flows",
        ],
        Monetization::OneTime => &[
            "One-time checkout and payment processing",
            "License key generation and delivery",
        ],
        Monetization::Freemium => &[
            "Usage tracking against free-tier limits",
            "Upgrade prompts and paywall for premium features",
        ],
        Monetization::Marketplace => &[
            "Vendor onboarding and profile management",
            "Escrow payments and vendor payouts",
            "Commission calculation per transaction",
        ],
        Monetization::InternalTool => &[
            "Single sign-on (SSO) integration",
            "Audit logging of user actions",
            "Admin panel for access management",
        ],
    }
}

fn role(name: &str) -> RoleSpec {
    let permissions: &[&str] =
        if name.to_lowercase().contains("admin") { &ADMIN_PERMISSIONS } else { &MEMBER_PERMISSIONS };
    RoleSpec {
        name: name.to_string(),
        description: format!("{name} role with appropriate permissions"),
        permissions: strings(permissions),
    }
}

fn database_schema(req: &GenerateRequest) -> Vec<DatabaseTable> {
    let mut tables = vec![table("users", &[
        ("id", "UUID PRIMARY KEY", "Unique user identifier"),
        ("email", "VARCHAR(255) UNIQUE", "User email address"),
        ("password_hash", "VARCHAR(255)", "Hashed password"),
        ("role", "VARCHAR(50)", "User role"),
        ("created_at", "TIMESTAMP", "Account creation date"),
    ])];

    if req.tenant_type == TenantType::Multi {
        tables.push(table("tenants", &[
            ("id", "UUID PRIMARY KEY", "Unique tenant identifier"),
            ("name", "VARCHAR(255)", "Tenant name"),
            ("subdomain", "VARCHAR(100) UNIQUE", "Tenant subdomain"),
            ("created_at", "TIMESTAMP", "Creation date"),
        ]));
    }

    match req.monetization {
        Monetization::Subscription => {
            tables.push(table("subscription_plans", &[
                ("id", "UUID PRIMARY KEY", "Unique plan identifier"),
                ("name", "VARCHAR(100)", "Plan name"),
                ("price_cents", "INTEGER", "Price per billing period"),
                ("interval", "VARCHAR(20)", "Billing interval (month, year)"),
            ]));
            tables.push(table("subscriptions", &[
                ("id", "UUID PRIMARY KEY", "Unique subscription identifier"),
                ("owner_id", "UUID", "Subscribing user or tenant"),
                ("plan_id", "UUID", "Reference to subscription plan"),
                ("status", "VARCHAR(20)", "Subscription status"),
                ("current_period_end", "TIMESTAMP", "End of the paid period"),
                ("created_at", "TIMESTAMP", "Subscription start date"),
            ]));
        }
        Monetization::OneTime => {
            tables.push(table("orders", &[
                ("id", "UUID PRIMARY KEY", "Unique order identifier"),
                ("user_id", "UUID", "Purchasing user"),
                ("amount_cents", "INTEGER", "Amount paid"),
                ("status", "VARCHAR(20)", "Payment status"),
                ("created_at", "TIMESTAMP", "Purchase date"),
            ]));
            tables.push(table("license_keys", &[
                ("id", "UUID PRIMARY KEY", "Unique license identifier"),
                ("order_id", "UUID", "Order that issued the key"),
                ("key", "VARCHAR(64) UNIQUE", "License key"),
                ("activated_at", "TIMESTAMP", "First activation date"),
            ]));
        }
        Monetization::Freemium => {
            tables.push(table("usage_limits", &[
                ("id", "UUID PRIMARY KEY", "Unique limit identifier"),
                ("user_id", "UUID", "User the limit applies to"),
                ("metric", "VARCHAR(50)", "Metered resource"),
                ("used", "INTEGER", "Units consumed this period"),
                ("quota", "INTEGER", "Units allowed this period"),
                ("resets_at", "TIMESTAMP", "Next quota reset"),
            ]));
        }
        Monetization::Marketplace => {
            tables.push(table("vendors", &[
                ("id", "UUID PRIMARY KEY", "Unique vendor identifier"),
                ("user_id", "UUID", "Owning user"),
                ("display_name", "VARCHAR(255)", "Public vendor name"),
                ("payout_account", "VARCHAR(255)", "Payout account reference"),
                ("verified", "BOOLEAN", "Onboarding completed"),
            ]));
            tables.push(table("transactions", &[
                ("id", "UUID PRIMARY KEY", "Unique transaction identifier"),
                ("vendor_id", "UUID", "Selling vendor"),
                ("buyer_id", "UUID", "Purchasing user"),
                ("amount_cents", "INTEGER", "Gross amount"),
                ("commission_cents", "INTEGER", "Platform commission"),
                ("escrow_status", "VARCHAR(20)", "held, released or refunded"),
                ("created_at", "TIMESTAMP", "Transaction date"),
            ]));
        }
        Monetization::InternalTool => {}
    }

    tables
}

fn table(name: &str, columns: &[(&str, &str, &str)]) -> DatabaseTable {
    DatabaseTable {
        table_name: name.to_string(),
        columns: columns
            .iter()
            .map(|(n, t, d)| Column { name: n.to_string(), column_type: t.to_string(), description: d.to_string() })
            .collect(),
    }
}

fn billing_dir(m: Monetization) -> &'static str {
    match m {
        Monetization::Subscription => "├── subscriptions/",
        Monetization::OneTime => "├── orders/",
        Monetization::Freemium => "├── usage/",
        Monetization::Marketplace => "├── payouts/",
        Monetization::InternalTool => "├── admin/",
    }
}

fn folder_structure(m: Monetization) -> FolderStructure {
    FolderStructure {
        frontend: strings(&[
            "src/",
            "├── app/",
            "│   ├── (auth)/",
            "│   ├── (dashboard)/",
            "│   ├── api/",
            "│   ├── layout.tsx",
            "│   └── page.tsx",
            "├── components/",
            "├── lib/",
            "└── styles/",
        ]),
        backend: strings(&[
            "src/",
            "├── auth/",
            "├── users/",
            "├── tenants/",
            billing_dir(m),
            "├── common/",
            "├── app.module.ts",
            "└── main.ts",
        ]),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
