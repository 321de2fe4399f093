use fypmatch::application_impl::fake_user_id;
use fypmatch::application_port::*;
use fypmatch::domain_model::*;
use fypmatch::server::*;

fn seed(username: &str, semester: u8) -> SeedStudent {
    SeedStudent {
        username: username.to_string(),
        name: username.to_uppercase(),
        semester,
        availability: Availability::Available,
        account_status: AccountStatus::Active,
    }
}

async fn setup(policy: GroupPolicy) -> (Services, [StudentId; 4]) {
    let services = Services::in_memory(policy);
    let seeded = seed_students(
        &services,
        vec![seed("a", 6), seed("b", 7), seed("c", 6), seed("d", 5)],
    )
    .await
    .unwrap();
    assert_eq!(seeded, 4);

    let mut ids = Vec::new();
    for name in ["a", "b", "c", "d"] {
        ids.push(
            services
                .identity_service
                .resolve(fake_user_id(name))
                .await
                .unwrap(),
        );
    }
    (services, [ids[0], ids[1], ids[2], ids[3]])
}

async fn partner(services: &Services, from: StudentId, to: StudentId) -> Result<ConnectionRequest, RelationError> {
    let request = services
        .request_service
        .send(SendRequestInput {
            kind: RequestKind::Partner,
            from,
            to,
            reason: None,
        })
        .await?;
    services.request_service.accept(request.request_id, to).await
}

#[tokio::test]
async fn three_partners_fill_and_lock_the_group() {
    let (services, [a, b, c, d]) = setup(GroupPolicy::default()).await;

    partner(&services, a, b).await.unwrap();
    let group = services.group_service.my_group(a).await.unwrap().unwrap();
    assert_eq!(group.member_count(), 2);
    assert!(!group.is_locked);

    // b is already grouped, c joins a's group through a
    partner(&services, a, c).await.unwrap();
    let group = services.group_service.my_group(c).await.unwrap().unwrap();
    assert_eq!(group.member_count(), 3);
    assert!(group.is_locked);
    assert!(group.has_member(a) && group.has_member(b) && group.has_member(c));

    let err = services
        .request_service
        .send(SendRequestInput {
            kind: RequestKind::Partner,
            from: b,
            to: d,
            reason: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(services.group_service.my_group(d).await.unwrap().is_none());

    // groupmates may message each other, d may message no one
    for (x, y) in [(a, b), (b, c), (c, a)] {
        assert!(services.permission_oracle.can_message(x, y).await.unwrap());
    }
    for x in [a, b, c] {
        assert!(!services.permission_oracle.can_message(d, x).await.unwrap());
    }
}

#[tokio::test]
async fn removal_unlocks_and_revokes_messaging() {
    let (services, [a, b, c, d]) = setup(GroupPolicy::default()).await;
    partner(&services, a, b).await.unwrap();
    partner(&services, b, c).await.unwrap();

    services
        .conversation_service
        .send_message(c, a, MessageId(uuid::Uuid::new_v4()), "see you at the lab")
        .await
        .unwrap();

    let group = services.group_service.remove_member(a, c).await.unwrap().unwrap();
    assert!(!group.is_locked);
    assert_eq!(group.member_count(), 2);

    assert!(!services.permission_oracle.can_message(a, c).await.unwrap());
    let err = services
        .conversation_service
        .send_message(c, a, MessageId(uuid::Uuid::new_v4()), "hello?")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::NotPermitted));

    // the freed slot can be filled again
    partner(&services, d, a).await.unwrap();
    let group = services.group_service.my_group(d).await.unwrap().unwrap();
    assert!(group.is_locked);
}

#[tokio::test]
async fn message_request_opens_a_conversation() {
    let (services, [a, _, _, d]) = setup(GroupPolicy::default()).await;

    let err = services
        .conversation_service
        .send_message(a, d, MessageId(uuid::Uuid::new_v4()), "hi")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::NotPermitted));

    let request = services
        .request_service
        .send(SendRequestInput {
            kind: RequestKind::Message,
            from: a,
            to: d,
            reason: Some("Your proposal on sensor fusion".to_string()),
        })
        .await
        .unwrap();
    let accepted = services.request_service.accept(request.request_id, d).await.unwrap();
    assert_eq!(accepted.status, RequestStatus::Accepted);
    assert!(accepted.resolved_at.is_some());

    for (i, (from, to)) in [(a, d), (d, a), (a, d)].into_iter().enumerate() {
        let message = services
            .conversation_service
            .send_message(from, to, MessageId(uuid::Uuid::new_v4()), "ping")
            .await
            .unwrap();
        assert_eq!(message.message_offset, MessageOffset(i as u64 + 1));
    }

    let conversations = services
        .conversation_service
        .list_conversations(d, PageSize::default(), None)
        .await
        .unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].other_student, a);
    assert_eq!(conversations[0].last_msg_off, MessageOffset(3));

    // messaging permission never creates a group
    assert!(services.group_service.my_group(a).await.unwrap().is_none());
}

#[tokio::test]
async fn two_member_policy_locks_on_first_pair() {
    let policy = GroupPolicy {
        max_members: 2,
        unlock_on_removal: false,
    };
    let (services, [a, b, c, _]) = setup(policy).await;

    partner(&services, a, b).await.unwrap();
    let group = services.group_service.my_group(b).await.unwrap().unwrap();
    assert!(group.is_locked);

    let err = partner(&services, c, a).await.unwrap_err();
    assert!(matches!(err, RelationError::GroupLocked));

    let group = services.group_service.remove_member(b, a).await.unwrap().unwrap();
    assert_eq!(group.member_count(), 1);
    assert!(group.is_locked);
}
