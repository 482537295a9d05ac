use std::path::Path;

use acctperm_application::{
    CreateRoleTemplateInput, PermissionAdminRepository, SaveAccountOverrideInput,
    SaveRoleTemplateInput,
};
use acctperm_core::{AppError, AppResult, NonEmptyString};
use acctperm_domain::{ModuleRegistry, PermissionTree, UserId, parse_permission_keys};
use acctperm_infrastructure::InMemoryPermissionAdminRepository;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

/// Backend contents loaded at startup.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedDocument {
    pub permission_tree: PermissionTree,
    #[serde(default)]
    pub module_registry: ModuleRegistry,
    #[serde(default)]
    pub role_templates: Vec<SeedRoleTemplate>,
    #[serde(default)]
    pub accounts: Vec<SeedAccount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedRoleTemplate {
    pub key: String,
    pub label: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permission_keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedAccount {
    pub user_id: i64,
    #[serde(default)]
    pub role_template_key: Option<String>,
    #[serde(default)]
    pub add_keys: Vec<String>,
    #[serde(default)]
    pub remove_keys: Vec<String>,
}

fn enabled_by_default() -> bool {
    true
}

/// Reads a seed document from disk, or returns the built-in demo seed.
pub fn load_seed_document(seed_file: Option<&Path>) -> AppResult<SeedDocument> {
    let value = match seed_file {
        Some(path) => {
            let contents = std::fs::read_to_string(path).map_err(|error| {
                AppError::Internal(format!(
                    "failed to read seed file '{}': {error}",
                    path.display()
                ))
            })?;
            serde_json::from_str::<Value>(&contents).map_err(|error| {
                AppError::Validation(format!(
                    "seed file '{}' is not valid JSON: {error}",
                    path.display()
                ))
            })?
        }
        None => demo_seed(),
    };

    serde_json::from_value(value)
        .map_err(|error| AppError::Validation(format!("invalid seed document: {error}")))
}

/// Builds the in-memory backend described by a seed document.
pub async fn build_repository(
    seed: SeedDocument,
) -> AppResult<(InMemoryPermissionAdminRepository, ModuleRegistry)> {
    let repository = InMemoryPermissionAdminRepository::new(seed.permission_tree);

    let mut seeded_templates = Vec::with_capacity(seed.role_templates.len());
    for role in seed.role_templates {
        let label = NonEmptyString::new(role.label)?;
        let template = repository
            .create_role_template(CreateRoleTemplateInput {
                key: Some(role.key),
                label: label.clone(),
                enabled: true,
                description: role.description.clone(),
            })
            .await?;
        repository
            .save_role_template(
                template.id(),
                SaveRoleTemplateInput {
                    label,
                    enabled: true,
                    permission_keys: parse_permission_keys(&role.permission_keys)?,
                    description: role.description,
                },
            )
            .await?;
        seeded_templates.push((template, role.enabled));
    }

    for account in &seed.accounts {
        let user_id = UserId::new(account.user_id);
        repository.register_account(user_id).await;
        let role_template_id = account
            .role_template_key
            .as_deref()
            .map(|key| {
                seeded_templates
                    .iter()
                    .find(|(template, _)| template.key() == key)
                    .map(|(template, _)| template.id())
                    .ok_or_else(|| {
                        AppError::Validation(format!(
                            "seed account {user_id} references unknown role template '{key}'"
                        ))
                    })
            })
            .transpose()?;

        repository
            .save_account_override(
                user_id,
                SaveAccountOverrideInput {
                    role_template_id,
                    add_keys: parse_permission_keys(&account.add_keys)?,
                    remove_keys: parse_permission_keys(&account.remove_keys)?,
                },
            )
            .await?;
    }

    // Templates are assigned above while enabled; disable the ones seeded as disabled last.
    for (template, enabled) in &seeded_templates {
        if !enabled {
            let permission_keys = repository.fetch_role_template_keys(template.id()).await?;
            repository
                .save_role_template(
                    template.id(),
                    SaveRoleTemplateInput {
                        label: NonEmptyString::new(template.label())?,
                        enabled: false,
                        permission_keys,
                        description: template.description().map(ToOwned::to_owned),
                    },
                )
                .await?;
        }
    }

    info!(
        role_templates = seeded_templates.len(),
        accounts = seed.accounts.len(),
        "seeded in-memory permission backend"
    );
    Ok((repository, seed.module_registry))
}

fn demo_seed() -> Value {
    json!({
        "permissionTree": {
            "modules": [
                {
                    "key": "sales",
                    "label": "Sales",
                    "actions": ["VIEW"],
                    "children": [
                        {
                            "key": "orders",
                            "label": "Orders",
                            "actions": ["VIEW", "CREATE", "EDIT", "SUBMIT", "APPROVE", "DELETE", "EXPORT"]
                        },
                        {
                            "key": "quotes",
                            "label": "Quotes",
                            "actions": ["VIEW", "CREATE", "EDIT", "SUBMIT", "CLOSE"]
                        }
                    ]
                },
                {
                    "key": "customers",
                    "label": "Customers",
                    "actions": ["VIEW", "CREATE", "EDIT", "ASSIGN", "DELETE"]
                },
                {
                    "key": "reports",
                    "label": "Reports",
                    "actions": ["VIEW", "EXPORT"]
                }
            ]
        },
        "moduleRegistry": {
            "groups": [
                {
                    "id": "crm",
                    "label": "CRM",
                    "modules": [
                        { "id": "customers", "label": "Customers", "routePrefixes": ["/customers"] },
                        { "id": "quotes", "label": "Quotes", "routePrefixes": ["/sales/quotes"] },
                        { "id": "orders", "label": "Orders", "routePrefixes": ["/sales/orders"] }
                    ]
                },
                {
                    "id": "insights",
                    "label": "Insights",
                    "modules": [
                        { "id": "reports", "label": "Reports", "routePrefixes": ["/reports"] }
                    ]
                }
            ],
            "dependencies": {
                "orders": ["quotes"],
                "quotes": ["customers"],
                "reports": ["orders"]
            }
        },
        "roleTemplates": [
            {
                "key": "sales_rep",
                "label": "Sales representative",
                "description": "Creates quotes and orders",
                "permissionKeys": [
                    "sales:VIEW", "orders:VIEW", "orders:CREATE", "orders:EDIT",
                    "quotes:VIEW", "quotes:CREATE", "quotes:EDIT", "customers:VIEW"
                ]
            },
            {
                "key": "auditor",
                "label": "Auditor",
                "permissionKeys": ["sales:VIEW", "orders:VIEW", "quotes:VIEW", "reports:VIEW", "reports:EXPORT"]
            },
            {
                "key": "legacy_admin",
                "label": "Legacy admin",
                "enabled": false,
                "permissionKeys": ["customers:DELETE", "orders:DELETE"]
            }
        ],
        "accounts": [
            {
                "userId": 1001,
                "roleTemplateKey": "sales_rep",
                "addKeys": ["reports:VIEW"],
                "removeKeys": ["orders:EDIT"]
            },
            { "userId": 1002, "roleTemplateKey": "auditor" },
            { "userId": 1003 }
        ]
    })
}
