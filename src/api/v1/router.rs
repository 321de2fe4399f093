use super::error::*;
use super::handler;
use crate::application_port::*;
use crate::domain_model::StudentId;
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let student = with_student(server.token_verifier.clone(), server.identity_service.clone());

    let send_request = warp::post()
        .and(warp::path!("requests" / "send"))
        .and(warp::body::json())
        .and(student.clone())
        .and(with(server.request_service.clone()))
        .and_then(handler::send_request);

    let accept_request = warp::post()
        .and(warp::path!("requests" / "accept"))
        .and(warp::body::json())
        .and(student.clone())
        .and(with(server.request_service.clone()))
        .and_then(handler::accept_request);

    let reject_request = warp::post()
        .and(warp::path!("requests" / "reject"))
        .and(warp::body::json())
        .and(student.clone())
        .and(with(server.request_service.clone()))
        .and_then(handler::reject_request);

    let sent_requests = warp::get()
        .and(warp::path!("requests" / "sent"))
        .and(warp::query::<handler::RequestListQuery>())
        .and(student.clone())
        .and(with(server.request_service.clone()))
        .and_then(handler::list_sent_requests);

    let received_requests = warp::get()
        .and(warp::path!("requests" / "received"))
        .and(warp::query::<handler::RequestListQuery>())
        .and(student.clone())
        .and(with(server.request_service.clone()))
        .and_then(handler::list_received_requests);

    let can_message = warp::get()
        .and(warp::path("can_message"))
        .and(warp::path::end())
        .and(warp::query::<handler::CanMessageQuery>())
        .and(student.clone())
        .and(with(server.permission_oracle.clone()))
        .and_then(handler::can_message);

    let discover = warp::get()
        .and(warp::path!("students" / "discover"))
        .and(warp::query::<handler::DiscoverQuery>())
        .and(student.clone())
        .and(with(server.discovery_service.clone()))
        .and_then(handler::discover_students);

    let my_group = warp::get()
        .and(warp::path("group"))
        .and(warp::path::end())
        .and(student.clone())
        .and(with(server.group_service.clone()))
        .and_then(handler::my_group);

    let lock_group = warp::post()
        .and(warp::path!("group" / "lock"))
        .and(student.clone())
        .and(with(server.group_service.clone()))
        .and_then(handler::lock_group);

    let remove_member = warp::post()
        .and(warp::path!("group" / "remove_member"))
        .and(warp::body::json())
        .and(student.clone())
        .and(with(server.group_service.clone()))
        .and_then(handler::remove_group_member);

    let update_project = warp::post()
        .and(warp::path!("group" / "project"))
        .and(warp::body::json())
        .and(student.clone())
        .and(with(server.group_service.clone()))
        .and_then(handler::update_group_project);

    let update_visibility = warp::post()
        .and(warp::path!("group" / "visibility"))
        .and(warp::body::json())
        .and(student.clone())
        .and(with(server.group_service.clone()))
        .and_then(handler::update_group_visibility);

    let send_message = warp::post()
        .and(warp::path!("messages" / "send"))
        .and(warp::body::json())
        .and(student.clone())
        .and(with(server.conversation_service.clone()))
        .and_then(handler::send_message);

    let history = warp::get()
        .and(warp::path("conversation_history"))
        .and(warp::path::end())
        .and(warp::query::<handler::ConversationHistoryQuery>())
        .and(student.clone())
        .and(with(server.conversation_service.clone()))
        .and_then(handler::conversation_history);

    let conversations = warp::get()
        .and(warp::path("conversations"))
        .and(warp::path::end())
        .and(warp::query::<handler::ConversationListQuery>())
        .and(student)
        .and(with(server.conversation_service.clone()))
        .and_then(handler::list_conversations);

    let requests = send_request
        .or(accept_request)
        .or(reject_request)
        .or(sent_requests)
        .or(received_requests)
        .or(can_message);
    let groups = my_group
        .or(lock_group)
        .or(remove_member)
        .or(update_project)
        .or(update_visibility);
    let messaging = send_message.or(history).or(conversations);

    requests.or(discover).or(groups).or(messaging)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_verification(
    token_verifier: Arc<dyn TokenVerifier>,
) -> impl Filter<Extract = (crate::domain_model::UserId,), Error = warp::Rejection> + Clone {
    warp::header::<String>(http::header::AUTHORIZATION.as_ref()).and_then(move |token: String| {
        let token_verifier = token_verifier.clone();
        async move {
            if let Some(token) = token.strip_prefix("Bearer ") {
                let user_id = token_verifier
                    .verify_access_token(token)
                    .await
                    .map_err(ApiRejection::from)
                    .map_err(reject::custom)?;
                Ok(user_id)
            } else {
                Err(reject::custom(ApiRejection::from(AuthError::TokenInvalid)))
            }
        }
    })
}

/// Verified principal resolved to the acting student.
fn with_student(
    token_verifier: Arc<dyn TokenVerifier>,
    identity_service: Arc<dyn IdentityService>,
) -> impl Filter<Extract = (StudentId,), Error = warp::Rejection> + Clone {
    with_verification(token_verifier).and_then(move |user_id| {
        let identity_service = identity_service.clone();
        async move {
            identity_service
                .resolve(user_id)
                .await
                .map_err(ApiRejection::from)
                .map_err(reject::custom)
        }
    })
}
