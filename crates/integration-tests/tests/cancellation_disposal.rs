//! Entry checks (cancellation, disposal) and mid-flight cancellation.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use docstore_identity::{
    DocumentRoleStore, DocumentUserStore, RoleRecord, RoleStore, StoreError, UserEmailStore,
    UserPasswordStore, UserRecord, UserRoleStore, UserStore,
};
use docstore_identity_core::{
    Document, DocumentCollection, DocumentDatabase, Filter, GatewayError,
};
use docstore_identity_integration_tests::{ApplicationUser, TestContext, cancelled};

fn assert_cancelled<T: std::fmt::Debug>(result: Result<T, StoreError>) {
    assert!(
        matches!(result, Err(StoreError::OperationCancelled)),
        "expected OperationCancelled, got {result:?}"
    );
}

fn assert_disposed<T: std::fmt::Debug>(result: Result<T, StoreError>) {
    assert!(
        matches!(result, Err(StoreError::ObjectDisposed(_))),
        "expected ObjectDisposed, got {result:?}"
    );
}

/// Seed one role and one user holding it; returns the user and role.
async fn seeded() -> (TestContext, ApplicationUser, RoleRecord) {
    let ctx = TestContext::new();
    let role = ctx.create_role("Admin").await.unwrap();
    let user = ctx.create_user("alice", "alice@example.com").await.unwrap();
    ctx.users().add_to_role(&user, "ADMIN", &ctx.cancel).await.unwrap();
    (ctx, user, role)
}

async fn run_user_operations(
    users: &DocumentUserStore<ApplicationUser, RoleRecord>,
    user: &mut ApplicationUser,
    cancel: &CancellationToken,
    check: fn(Result<(), StoreError>),
) {
    let id = user.identity.id().unwrap().to_string();

    check(users.user_id(user, cancel).map(drop));
    check(users.user_name(user, cancel).map(drop));
    check(users.set_user_name(user, "alice2", cancel));
    check(users.normalized_user_name(user, cancel).map(drop));
    check(users.set_normalized_user_name(user, "ALICE2", cancel));
    check(users.create(&mut ApplicationUser::new("bob", "bob@example.com"), cancel).await);
    check(users.update(user, cancel).await);
    check(users.delete(user, cancel).await);
    check(users.find_by_id(&id, cancel).await.map(drop));
    check(users.find_by_name("ALICE", cancel).await.map(drop));

    check(users.set_password_hash(user, "hash", cancel));
    check(users.password_hash(user, cancel).map(drop));
    check(users.has_password(user, cancel).map(drop));

    check(users.set_email(user, "a@b.com", cancel));
    check(users.email(user, cancel).map(drop));
    check(users.email_confirmed(user, cancel).map(drop));
    check(users.set_email_confirmed(user, true, cancel));
    check(users.normalized_email(user, cancel).map(drop));
    check(users.set_normalized_email(user, Some("A@B.COM"), cancel));
    check(users.find_by_email("ALICE@EXAMPLE.COM", cancel).await.map(drop));

    check(users.add_to_role(user, "ADMIN", cancel).await);
    check(users.remove_from_role(user, "ADMIN", cancel).await);
    check(users.roles(user, cancel).await.map(drop));
    check(users.is_in_role(user, "ADMIN", cancel).await.map(drop));
    check(users.users_in_role("ADMIN", cancel).await.map(drop));
}

async fn run_role_operations(
    roles: &DocumentRoleStore<RoleRecord>,
    role: &mut RoleRecord,
    cancel: &CancellationToken,
    check: fn(Result<(), StoreError>),
) {
    let id = role.id().unwrap().to_string();

    check(roles.create(&mut RoleRecord::new("Editor"), cancel).await);
    check(roles.update(role, cancel).await);
    check(roles.delete(role, cancel).await);
    check(roles.role_id(role, cancel).map(drop));
    check(roles.role_name(role, cancel).map(drop));
    check(roles.set_role_name(role, "Administrator", cancel));
    check(roles.normalized_role_name(role, cancel).map(drop));
    check(roles.set_normalized_role_name(role, "ADMINISTRATOR", cancel));
    check(roles.find_by_id(&id, cancel).await.map(drop));
    check(roles.find_by_name("ADMIN", cancel).await.map(drop));
}

#[tokio::test]
async fn test_cancelled_user_operations_make_no_gateway_calls() {
    let (ctx, mut user, _) = seeded().await;
    let before = ctx.total_calls();
    let snapshot = user.clone();

    run_user_operations(&ctx.users(), &mut user, &cancelled(), assert_cancelled).await;

    assert_eq!(ctx.total_calls(), before);
    assert_eq!(user, snapshot);
}

#[tokio::test]
async fn test_cancelled_role_operations_make_no_gateway_calls() {
    let (ctx, _, mut role) = seeded().await;
    let before = ctx.total_calls();
    let snapshot = role.clone();

    run_role_operations(&ctx.roles(), &mut role, &cancelled(), assert_cancelled).await;

    assert_eq!(ctx.total_calls(), before);
    assert_eq!(role, snapshot);
}

#[tokio::test]
async fn test_disposed_user_store_makes_no_gateway_calls() {
    let (ctx, mut user, _) = seeded().await;
    let users = ctx.users();
    users.dispose();
    let before = ctx.total_calls();

    run_user_operations(&users, &mut user, &ctx.cancel, assert_disposed).await;

    assert_eq!(ctx.total_calls(), before);
}

#[tokio::test]
async fn test_disposed_role_store_makes_no_gateway_calls() {
    let (ctx, _, mut role) = seeded().await;
    let roles = ctx.roles();
    roles.dispose();
    let before = ctx.total_calls();

    run_role_operations(&roles, &mut role, &ctx.cancel, assert_disposed).await;

    assert_eq!(ctx.total_calls(), before);
}

#[tokio::test]
async fn test_cancellation_is_checked_before_disposal() {
    let (ctx, user, role) = seeded().await;
    let users = ctx.users();
    let roles = ctx.roles();
    users.dispose();
    roles.dispose();

    assert_cancelled(users.roles(&user, &cancelled()).await);
    assert_cancelled(roles.find_by_name("ADMIN", &cancelled()).await);
    assert_disposed(users.roles(&user, &ctx.cancel).await);
    assert_disposed(roles.role_id(&role, &ctx.cancel));
}

#[tokio::test]
async fn test_disposal_is_idempotent_and_irreversible() {
    let ctx = TestContext::new();
    let roles = ctx.roles();
    roles.dispose();
    roles.dispose();

    assert_disposed(roles.find_by_name("ADMIN", &ctx.cancel).await);
    let err = roles.find_by_name("ADMIN", &ctx.cancel).await.unwrap_err();
    assert_eq!(err.to_string(), "cannot access a disposed object: DocumentRoleStore");

    // A fresh store from the same registration is active.
    assert!(ctx.roles().find_by_name("ADMIN", &ctx.cancel).await.is_ok());
}

// =============================================================================
// Mid-flight cancellation
// =============================================================================

/// A database whose collections never answer.
#[derive(Default)]
struct StalledDatabase {
    started: Arc<AtomicUsize>,
}

struct StalledCollection {
    name: String,
    started: Arc<AtomicUsize>,
}

impl StalledCollection {
    async fn stall<T>(&self) -> Result<T, GatewayError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

#[async_trait]
impl DocumentCollection for StalledCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert_one(&self, _document: Document) -> Result<(), GatewayError> {
        self.stall().await
    }

    async fn replace_one(&self, _filter: &Filter, _document: Document) -> Result<u64, GatewayError> {
        self.stall().await
    }

    async fn delete_one(&self, _filter: &Filter) -> Result<u64, GatewayError> {
        self.stall().await
    }

    async fn find(&self, _filter: &Filter) -> Result<Vec<Document>, GatewayError> {
        self.stall().await
    }

    async fn count_documents(&self, _filter: &Filter) -> Result<u64, GatewayError> {
        self.stall().await
    }
}

impl DocumentDatabase for StalledDatabase {
    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection> {
        Arc::new(StalledCollection {
            name: name.to_owned(),
            started: Arc::clone(&self.started),
        })
    }
}

#[tokio::test]
async fn test_cancellation_while_request_is_pending() {
    let database = StalledDatabase::default();
    let started = Arc::clone(&database.started);
    let users: DocumentUserStore<UserRecord, RoleRecord> = DocumentUserStore::new(&database);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let watcher = Arc::clone(&started);
    tokio::spawn(async move {
        while watcher.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        trigger.cancel();
    });

    assert_cancelled(users.find_by_name("ALICE", &cancel).await);
    assert_eq!(started.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancellation_while_insert_is_pending() {
    let database = StalledDatabase::default();
    let roles: DocumentRoleStore<RoleRecord> = DocumentRoleStore::new(&database);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::task::yield_now().await;
        trigger.cancel();
    });

    let mut role = RoleRecord::new("Admin");
    assert_cancelled(roles.create(&mut role, &cancel).await);
    // The id is only assigned once the insert has completed.
    assert!(role.id().is_none());
}
