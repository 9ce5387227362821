use std::collections::HashSet;
use std::sync::Arc;

use quorum_core::{AppError, ContainerId, DraftKey, MemberId, PermissionId, RoleId, UserId};
use quorum_domain::{ContainerRef, DraftMember, LoadedMemberState, PermissionDiff};

use crate::MemberDraftSession;
use crate::member_ports::{CreateMemberPermissionsInput, UpdateMemberPermissionsInput};
use crate::test_support::{Call, FakeBackend, grant_rows, permission_set};

use super::{PermissionWrite, ReconciliationService};

const ROLE: RoleId = RoleId::new(7);

fn container() -> ContainerRef {
    ContainerRef::committee(ContainerId::new(3))
}

fn backend() -> FakeBackend {
    FakeBackend {
        role_grants: grant_rows(ROLE, &[(1, true), (3, true), (5, true)]),
        ..FakeBackend::default()
    }
}

fn service(backend: &Arc<FakeBackend>) -> ReconciliationService {
    ReconciliationService::new(backend.clone(), backend.clone())
}

async fn new_draft(session: &mut MemberDraftSession, user: &str) -> DraftKey {
    let key = session.add_member();
    assert!(session.set_user(key, Some(UserId::new(user))).is_ok());
    assert!(session.set_role(key, Some(ROLE)).await.is_ok());
    key
}

async fn load(backend: &Arc<FakeBackend>) -> MemberDraftSession {
    let session = MemberDraftSession::load_existing(
        backend.clone(),
        backend.as_ref(),
        backend.as_ref(),
        container(),
    )
    .await;
    let Ok(session) = session else {
        panic!("loading existing members should succeed");
    };
    session
}

#[tokio::test]
async fn revoking_default_on_existing_member_issues_single_update() {
    let backend = Arc::new(backend());
    backend.seed_member(11, 3, "42", 7, &[1, 3, 5]).await;
    let mut session = load(&backend).await;
    let key = session.members()[0].key();

    assert!(matches!(
        session.toggle_permission(key, PermissionId::new(3)),
        Ok(false)
    ));

    let result = service(&backend)
        .reconcile(container(), &session.into_drafts())
        .await;

    let Ok(report) = result else {
        panic!("reconciliation should succeed");
    };
    assert_eq!(
        report.permission_writes,
        vec![PermissionWrite::Updated {
            member_id: MemberId::new(11),
            role_id: ROLE,
            diff: PermissionDiff {
                added: Vec::new(),
                deleted: vec![PermissionId::new(3)],
            },
        }]
    );
    assert_eq!(
        backend.permission_writes().await,
        vec![Call::UpdateMemberPermissions(UpdateMemberPermissionsInput {
            member_id: MemberId::new(11),
            role_id: ROLE,
            added: None,
            deleted: Some(vec![PermissionId::new(3)]),
        })]
    );
}

#[tokio::test]
async fn new_member_gets_single_create_with_defaults() {
    let backend = Arc::new(backend());
    let mut session = MemberDraftSession::new(backend.clone());
    new_draft(&mut session, "7").await;

    let result = service(&backend)
        .reconcile(container(), &session.into_drafts())
        .await;

    let Ok(report) = result else {
        panic!("reconciliation should succeed");
    };
    assert_eq!(report.created_members.len(), 1);

    let calls = backend.recorded_calls().await;
    assert!(
        !calls
            .iter()
            .any(|call| matches!(call, Call::ListMemberPermissions(..)))
    );
    assert_eq!(
        backend.permission_writes().await,
        vec![Call::CreateMemberPermissions(CreateMemberPermissionsInput {
            member_id: report.created_members[0],
            role_id: ROLE,
            permission_ids: vec![
                PermissionId::new(1),
                PermissionId::new(3),
                PermissionId::new(5),
            ],
        })]
    );
}

#[tokio::test]
async fn draft_without_role_is_excluded_entirely() {
    let backend = Arc::new(backend());
    let mut session = MemberDraftSession::new(backend.clone());
    let key = session.add_member();
    assert!(session.set_user(key, Some(UserId::new("42"))).is_ok());

    let result = service(&backend)
        .reconcile(container(), &session.into_drafts())
        .await;

    let Ok(report) = result else {
        panic!("reconciliation should succeed");
    };
    assert_eq!(report.skipped_incomplete, vec![key]);
    assert!(backend.recorded_calls().await.is_empty());
}

#[tokio::test]
async fn resubmitting_unchanged_drafts_writes_nothing() {
    let backend = Arc::new(backend());
    backend.seed_member(11, 3, "42", 7, &[1, 3]).await;
    let mut session = load(&backend).await;
    let key = session.members()[0].key();
    assert!(session.toggle_permission(key, PermissionId::new(9)).is_ok());
    let drafts = session.into_drafts();
    let service = service(&backend);

    assert!(service.reconcile(container(), &drafts).await.is_ok());
    assert_eq!(backend.permission_writes().await.len(), 1);

    let second = service.reconcile(container(), &drafts).await;

    let Ok(report) = second else {
        panic!("second reconciliation should succeed");
    };
    assert_eq!(report.unchanged, vec![MemberId::new(11)]);
    assert_eq!(backend.permission_writes().await.len(), 1);
}

#[tokio::test]
async fn members_are_created_and_refetched_before_permission_writes() {
    let backend = Arc::new(backend());
    backend.seed_member(11, 3, "40", 7, &[1]).await;
    let mut session = load(&backend).await;
    let existing = session.members()[0].key();
    assert!(session.toggle_permission(existing, PermissionId::new(5)).is_ok());
    new_draft(&mut session, "41").await;
    new_draft(&mut session, "42").await;

    let result = service(&backend)
        .reconcile(container(), &session.into_drafts())
        .await;
    assert!(result.is_ok());

    let calls = backend.recorded_calls().await;
    let Some(first_write) = calls.iter().position(Call::is_permission_write) else {
        panic!("permission writes should be issued");
    };
    let add = calls
        .iter()
        .position(|call| matches!(call, Call::AddMembers(_)));
    let refetch = calls
        .iter()
        .rposition(|call| matches!(call, Call::ListMembers(_)));
    assert!(add.is_some_and(|add| refetch.is_some_and(|refetch| add < refetch)));
    assert!(refetch.is_some_and(|refetch| refetch < first_write));

    let batches: Vec<_> = calls
        .iter()
        .filter_map(|call| match call {
            Call::AddMembers(inputs) => Some(inputs.len()),
            _ => None,
        })
        .collect();
    assert_eq!(batches, vec![2]);
}

#[tokio::test]
async fn permission_writes_follow_draft_order() {
    let backend = Arc::new(backend());
    backend.seed_member(11, 3, "40", 7, &[1]).await;
    let mut session = MemberDraftSession::new(backend.clone());
    new_draft(&mut session, "41").await;
    let drafts_before: Vec<DraftMember> = session.into_drafts();
    let mut loaded = load(&backend).await;
    let existing = loaded.members()[0].key();
    assert!(loaded.toggle_permission(existing, PermissionId::new(5)).is_ok());
    let mut drafts = drafts_before;
    drafts.extend(loaded.into_drafts());

    let result = service(&backend).reconcile(container(), &drafts).await;

    let Ok(report) = result else {
        panic!("reconciliation should succeed");
    };
    let order: Vec<MemberId> = report
        .permission_writes
        .iter()
        .map(PermissionWrite::member_id)
        .collect();
    assert_eq!(order, vec![report.created_members[0], MemberId::new(11)]);
}

#[tokio::test]
async fn member_batch_failure_aborts_without_permission_writes() {
    let backend = Arc::new(FakeBackend {
        fail_add_members: true,
        ..backend()
    });
    backend.seed_member(11, 3, "40", 7, &[1]).await;
    let mut session = load(&backend).await;
    let existing = session.members()[0].key();
    assert!(session.toggle_permission(existing, PermissionId::new(5)).is_ok());
    new_draft(&mut session, "41").await;

    let result = service(&backend)
        .reconcile(container(), &session.into_drafts())
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert!(backend.permission_writes().await.is_empty());
}

#[tokio::test]
async fn unresolved_new_member_is_skipped_with_others_saved() {
    let backend = Arc::new(FakeBackend {
        silently_dropped_users: HashSet::from([UserId::new("41")]),
        ..backend()
    });
    let mut session = MemberDraftSession::new(backend.clone());
    new_draft(&mut session, "41").await;
    new_draft(&mut session, "42").await;

    let result = service(&backend)
        .reconcile(container(), &session.into_drafts())
        .await;

    let Ok(report) = result else {
        panic!("reconciliation should succeed");
    };
    assert_eq!(report.skipped_unresolved, vec![UserId::new("41")]);
    assert_eq!(report.permission_writes.len(), 1);
}

#[tokio::test]
async fn failed_permission_write_does_not_stop_later_members() {
    let backend = Arc::new(FakeBackend {
        failing_permission_members: HashSet::from([MemberId::new(11)]),
        ..backend()
    });
    backend.seed_member(11, 3, "40", 7, &[1]).await;
    backend.seed_member(12, 3, "41", 7, &[1]).await;
    let mut session = load(&backend).await;
    let keys: Vec<_> = session.members().iter().map(DraftMember::key).collect();
    for key in keys {
        assert!(session.toggle_permission(key, PermissionId::new(5)).is_ok());
    }

    let result = service(&backend)
        .reconcile(container(), &session.into_drafts())
        .await;

    let Err(AppError::PartialFailure(message)) = result else {
        panic!("reconciliation should report a partial failure");
    };
    assert!(message.contains("members 11"));
    assert_eq!(backend.permission_writes().await.len(), 2);
    assert_eq!(
        backend
            .persisted
            .lock()
            .await
            .get(&(MemberId::new(12), ROLE))
            .cloned(),
        Some(permission_set(&[1, 5]))
    );
}

#[tokio::test]
async fn draft_with_no_granted_permissions_is_skipped() {
    let backend = Arc::new(FakeBackend::default());
    let mut session = MemberDraftSession::new(backend.clone());
    let key = new_draft(&mut session, "42").await;

    let result = service(&backend)
        .reconcile(container(), &session.into_drafts())
        .await;

    let Ok(report) = result else {
        panic!("reconciliation should succeed");
    };
    assert_eq!(report.skipped_empty, vec![key]);
    assert_eq!(report.created_members.len(), 1);
    assert!(backend.permission_writes().await.is_empty());
}

#[tokio::test]
async fn re_added_user_does_not_claim_existing_member_row() {
    let backend = Arc::new(backend());
    backend.seed_member(11, 3, "42", 7, &[1]).await;
    let mut session = load(&backend).await;
    new_draft(&mut session, "42").await;

    let result = service(&backend)
        .reconcile(container(), &session.into_drafts())
        .await;

    let Ok(report) = result else {
        panic!("reconciliation should succeed");
    };
    assert_eq!(report.created_members.len(), 1);
    assert_ne!(report.created_members[0], MemberId::new(11));
}

#[tokio::test]
async fn member_refetch_failure_aborts_without_permission_writes() {
    let backend = Arc::new(FakeBackend {
        fail_list_members_after_add: true,
        ..backend()
    });
    backend.seed_member(11, 3, "40", 7, &[1]).await;
    let mut session = load(&backend).await;
    let existing = session.members()[0].key();
    assert!(session.toggle_permission(existing, PermissionId::new(5)).is_ok());
    new_draft(&mut session, "41").await;

    let result = service(&backend)
        .reconcile(container(), &session.into_drafts())
        .await;

    assert!(matches!(result, Err(AppError::Transport(_))));
    assert!(
        backend
            .recorded_calls()
            .await
            .iter()
            .any(|call| matches!(call, Call::AddMembers(_)))
    );
    assert!(backend.permission_writes().await.is_empty());
}

fn persisted_draft(member_id: i64, user: &str, granted: &[i64]) -> DraftMember {
    DraftMember::from_persisted(
        DraftKey::new(),
        LoadedMemberState {
            member_id: MemberId::new(member_id),
            user_id: UserId::new(user),
            role_id: Some(ROLE),
            granted: permission_set(granted),
            permissions_loaded: true,
        },
    )
}

#[tokio::test]
async fn failed_grant_read_is_reported_without_stopping_later_members() {
    let backend = Arc::new(FakeBackend {
        failing_grant_reads: HashSet::from([MemberId::new(11)]),
        ..backend()
    });
    backend.seed_member(11, 3, "40", 7, &[1]).await;
    backend.seed_member(12, 3, "41", 7, &[1]).await;
    let drafts = vec![
        persisted_draft(11, "40", &[1, 5]),
        persisted_draft(12, "41", &[1, 5]),
    ];

    let result = service(&backend).reconcile(container(), &drafts).await;

    let Err(AppError::PartialFailure(message)) = result else {
        panic!("reconciliation should report a partial failure");
    };
    assert!(message.contains("1 of 2"));
    assert!(message.contains("members 11"));
    assert_eq!(
        backend.permission_writes().await,
        vec![Call::UpdateMemberPermissions(UpdateMemberPermissionsInput {
            member_id: MemberId::new(12),
            role_id: ROLE,
            added: Some(vec![PermissionId::new(5)]),
            deleted: None,
        })]
    );
}

#[tokio::test]
async fn failed_create_for_new_member_does_not_stop_later_members() {
    let backend = Arc::new(FakeBackend {
        failing_permission_members: HashSet::from([MemberId::new(101)]),
        ..backend()
    });
    let mut session = MemberDraftSession::new(backend.clone());
    new_draft(&mut session, "41").await;
    new_draft(&mut session, "42").await;

    let result = service(&backend)
        .reconcile(container(), &session.into_drafts())
        .await;

    let Err(AppError::PartialFailure(message)) = result else {
        panic!("reconciliation should report a partial failure");
    };
    assert!(message.contains("members 101"));
    assert_eq!(backend.permission_writes().await.len(), 2);
    assert_eq!(
        backend
            .persisted
            .lock()
            .await
            .get(&(MemberId::new(102), ROLE))
            .cloned(),
        Some(permission_set(&[1, 3, 5]))
    );
}
