/// Walks the matching workflow on the in-memory backend:
/// messaging, partnering into a full group, locking and removal.
///
/// $ cargo run --bin workflow_demo
use fypmatch::application_impl::fake_user_id;
use fypmatch::application_port::*;
use fypmatch::domain_model::*;
use fypmatch::server::*;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

fn seed(username: &str, name: &str) -> SeedStudent {
    SeedStudent {
        username: username.to_string(),
        name: name.to_string(),
        semester: 7,
        availability: Availability::Available,
        account_status: AccountStatus::Active,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::new("workflow_demo=debug,fypmatch=debug"))
        .with(fmt::layer())
        .init();

    let services = Services::in_memory(GroupPolicy::default());
    seed_students(
        &services,
        vec![
            seed("ayesha", "Ayesha"),
            seed("bilal", "Bilal"),
            seed("chen", "Chen"),
            seed("dina", "Dina"),
        ],
    )
    .await?;

    let resolve = |username: &str| {
        let identity = services.identity_service.clone();
        let user_id = fake_user_id(username);
        async move { identity.resolve(user_id).await }
    };
    let a = resolve("ayesha").await?;
    let b = resolve("bilal").await?;
    let c = resolve("chen").await?;
    let d = resolve("dina").await?;

    let found = services
        .discovery_service
        .discover(a, None, PageSize::default(), None)
        .await?;
    println!("ayesha discovers {} students", found.len());

    // message request, then a first message
    let request = services
        .request_service
        .send(SendRequestInput {
            kind: RequestKind::Message,
            from: a,
            to: d,
            reason: Some("Interested in your compilers idea".to_string()),
        })
        .await?;
    services.request_service.accept(request.request_id, d).await?;
    let message = services
        .conversation_service
        .send_message(a, d, MessageId(uuid::Uuid::new_v4()), "Hi Dina!")
        .await?;
    println!("ayesha -> dina at offset {}", message.message_offset.0);

    // two partner acceptances fill a three-person group
    for (from, to) in [(a, b), (a, c)] {
        let request = services
            .request_service
            .send(SendRequestInput {
                kind: RequestKind::Partner,
                from,
                to,
                reason: None,
            })
            .await?;
        services.request_service.accept(request.request_id, to).await?;
    }
    if let Some(group) = services.group_service.my_group(a).await? {
        println!(
            "group {} has {} members, locked={}",
            group.group_id,
            group.member_count(),
            group.is_locked
        );
    }

    let late = services
        .request_service
        .send(SendRequestInput {
            kind: RequestKind::Partner,
            from: d,
            to: a,
            reason: None,
        })
        .await;
    println!("dina asks to join: {:?}", late.err());

    let after = services.group_service.remove_member(a, c).await?;
    println!(
        "chen removed, locked={:?}, b<->c can message: {}",
        after.map(|g| g.is_locked),
        services.permission_oracle.can_message(b, c).await?
    );

    Ok(())
}
