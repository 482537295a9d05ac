use std::sync::Arc;

use acctperm_application::{
    CreateRoleTemplateInput, PermissionAdminRepository, PermissionAdminService,
    SaveAccountOverrideInput, SaveRoleTemplateInput,
};
use acctperm_core::{AppError, NonEmptyString};
use acctperm_domain::{
    ActionDefinition, ActionKey, ModuleNode, ModuleRegistry, PermissionKeySet, PermissionTree,
    RoleTemplate, RoleTemplateId, UserId, parse_permission_keys,
};

use super::{InMemoryPermissionAdminRepository, is_generated_role_key};
use crate::InMemoryAuditLogRepository;

fn keys(values: &[&str]) -> PermissionKeySet {
    parse_permission_keys(values).unwrap_or_else(|_| unreachable!())
}

fn tree() -> PermissionTree {
    let orders = ModuleNode::leaf(
        "orders",
        "Orders",
        vec![ActionKey::VIEW, ActionKey::EDIT, ActionKey::DELETE],
    )
    .unwrap_or_else(|_| unreachable!());
    PermissionTree::new(ActionDefinition::default_catalog(), vec![orders])
        .unwrap_or_else(|_| unreachable!())
}

fn label(value: &str) -> NonEmptyString {
    NonEmptyString::new(value).unwrap_or_else(|_| unreachable!())
}

async fn create(
    repository: &InMemoryPermissionAdminRepository,
    key: Option<&str>,
    enabled: bool,
) -> RoleTemplate {
    repository
        .create_role_template(CreateRoleTemplateInput {
            key: key.map(str::to_owned),
            label: label("Sales"),
            enabled,
            description: Some("  Field sales  ".to_owned()),
        })
        .await
        .unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn create_generates_role_key_when_omitted() {
    let repository = InMemoryPermissionAdminRepository::new(tree());

    let created = create(&repository, None, true).await;

    assert!(is_generated_role_key(created.key()));
    assert_eq!(created.description(), Some("Field sales"));
    assert_eq!(created.id(), RoleTemplateId::new(1));
}

#[tokio::test]
async fn duplicate_role_key_conflicts() {
    let repository = InMemoryPermissionAdminRepository::new(tree());
    create(&repository, Some("sales"), true).await;

    let result = repository
        .create_role_template(CreateRoleTemplateInput {
            key: Some(" sales ".to_owned()),
            label: label("Other"),
            enabled: true,
            description: None,
        })
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn save_role_template_validates_keys_against_tree() {
    let repository = InMemoryPermissionAdminRepository::new(tree());
    let created = create(&repository, Some("sales"), true).await;

    let unknown_action = repository
        .save_role_template(
            created.id(),
            SaveRoleTemplateInput {
                label: label("Sales"),
                enabled: true,
                permission_keys: keys(&["orders:FLY"]),
                description: None,
            },
        )
        .await;
    assert!(matches!(unknown_action, Err(AppError::Validation(_))));

    let saved = repository
        .save_role_template(
            created.id(),
            SaveRoleTemplateInput {
                label: label("Sales desk"),
                enabled: false,
                permission_keys: keys(&["orders:VIEW", "orders:EDIT"]),
                description: None,
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(saved.template.key(), "sales");
    assert_eq!(saved.template.label(), "Sales desk");
    assert_eq!(
        repository
            .fetch_role_template_keys(created.id())
            .await
            .unwrap_or_default(),
        keys(&["orders:VIEW", "orders:EDIT"])
    );
}

#[tokio::test]
async fn clone_copies_keys_disabled_with_new_key() {
    let repository = InMemoryPermissionAdminRepository::new(tree());
    let created = create(&repository, Some("sales"), true).await;
    repository
        .save_role_template(
            created.id(),
            SaveRoleTemplateInput {
                label: label("Sales"),
                enabled: true,
                permission_keys: keys(&["orders:VIEW"]),
                description: Some("desk".to_owned()),
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    let copy = repository
        .clone_role_template(created.id())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(copy.label(), "Sales-copy");
    assert!(!copy.enabled());
    assert_eq!(copy.description(), Some("desk"));
    assert!(is_generated_role_key(copy.key()));
    assert_eq!(
        repository
            .fetch_role_template_keys(copy.id())
            .await
            .unwrap_or_default(),
        keys(&["orders:VIEW"])
    );
}

#[tokio::test]
async fn unknown_account_is_not_found_and_known_account_starts_empty() {
    let repository = InMemoryPermissionAdminRepository::new(tree());
    repository.register_account(UserId::new(5)).await;

    let missing = repository.fetch_account_override(UserId::new(6)).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let empty = repository
        .fetch_account_override(UserId::new(5))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(empty.role_template_id(), None);
    assert!(empty.delta().is_empty());
}

#[tokio::test]
async fn override_requires_enabled_template() {
    let repository = InMemoryPermissionAdminRepository::new(tree());
    repository.register_account(UserId::new(5)).await;
    let disabled = create(&repository, Some("archived"), false).await;

    let disabled_result = repository
        .save_account_override(
            UserId::new(5),
            SaveAccountOverrideInput {
                role_template_id: Some(disabled.id()),
                add_keys: PermissionKeySet::new(),
                remove_keys: PermissionKeySet::new(),
            },
        )
        .await;
    assert!(matches!(disabled_result, Err(AppError::Validation(_))));

    let missing_result = repository
        .save_account_override(
            UserId::new(5),
            SaveAccountOverrideInput {
                role_template_id: Some(RoleTemplateId::new(99)),
                add_keys: PermissionKeySet::new(),
                remove_keys: PermissionKeySet::new(),
            },
        )
        .await;
    assert!(matches!(missing_result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn override_save_replaces_delta_and_delete_unassigns_template() {
    let repository = InMemoryPermissionAdminRepository::new(tree());
    repository.register_account(UserId::new(5)).await;
    let created = create(&repository, Some("sales"), true).await;

    let saved = repository
        .save_account_override(
            UserId::new(5),
            SaveAccountOverrideInput {
                role_template_id: Some(created.id()),
                add_keys: keys(&["orders:EDIT"]),
                remove_keys: keys(&["orders:DELETE"]),
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(saved.delta().add_keys(), &keys(&["orders:EDIT"]));

    repository
        .delete_role_template(created.id())
        .await
        .unwrap_or_else(|_| unreachable!());

    let after_delete = repository
        .fetch_account_override(UserId::new(5))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(after_delete.role_template_id(), None);
    assert_eq!(after_delete.delta().remove_keys(), &keys(&["orders:DELETE"]));

    let missing = repository.delete_role_template(created.id()).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[test]
fn generated_key_shape_is_checked() {
    assert!(is_generated_role_key("acctperm_20240131_a1b2c3d4"));
    assert!(!is_generated_role_key("acctperm_2024013_a1b2c3d4"));
    assert!(!is_generated_role_key("acctperm_20240131_A1B2C3D4"));
    assert!(!is_generated_role_key("sales"));
}

#[tokio::test]
async fn replaced_tree_is_served_after_service_refresh() {
    let repository = Arc::new(InMemoryPermissionAdminRepository::new(tree()));
    let service = PermissionAdminService::new(
        Arc::clone(&repository) as Arc<dyn PermissionAdminRepository>,
        Arc::new(InMemoryAuditLogRepository::new()),
        ModuleRegistry::default(),
    );
    let before = service.permission_tree().await.unwrap_or_else(|_| unreachable!());
    assert!(before.find_module("invoices").is_none());

    let invoices = ModuleNode::leaf("invoices", "Invoices", vec![ActionKey::VIEW])
        .unwrap_or_else(|_| unreachable!());
    repository
        .replace_tree(
            PermissionTree::new(ActionDefinition::default_catalog(), vec![invoices])
                .unwrap_or_else(|_| unreachable!()),
        )
        .await;

    let cached = service.permission_tree().await.unwrap_or_else(|_| unreachable!());
    assert!(Arc::ptr_eq(&before, &cached));

    let refreshed = service
        .refresh_permission_tree()
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(refreshed.find_module("invoices").is_some());
    assert!(refreshed.find_module("orders").is_none());

    let created = create(&repository, Some("billing"), true).await;
    let result = repository
        .save_role_template(
            created.id(),
            SaveRoleTemplateInput {
                label: label("Billing"),
                enabled: true,
                permission_keys: keys(&["orders:VIEW"]),
                description: None,
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}
