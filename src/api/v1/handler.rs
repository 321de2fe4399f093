use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// A page of results plus the cursor for the next one, absent on the last page.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    fn new(items: Vec<T>, page_size: PageSize, cursor_of: impl Fn(&T) -> String) -> Self {
        let next_cursor = if items.len() >= page_size.limit() {
            items.last().map(cursor_of)
        } else {
            None
        };
        Page { items, next_cursor }
    }
}

fn parse_cursor<C>(raw: Option<String>) -> Result<Option<C>, warp::Rejection>
where
    C: FromStr<Err = String>,
{
    raw.map(|s| s.parse::<C>())
        .transpose()
        .map_err(ApiRejection::bad_request)
        .map_err(reject::custom)
}

// requests

#[derive(Debug, Deserialize)]
pub struct SendRequestBody {
    pub kind: RequestKind,
    pub to: StudentId,
    pub reason: Option<String>,
}

pub async fn send_request(
    body: SendRequestBody,
    student: StudentId,
    request_service: Arc<dyn RequestService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let input = SendRequestInput {
        kind: body.kind,
        from: student,
        to: body.to,
        reason: body.reason,
    };
    let request = request_service
        .send(input)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(request)))
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequestBody {
    pub request_id: RequestId,
}

pub async fn accept_request(
    body: ResolveRequestBody,
    student: StudentId,
    request_service: Arc<dyn RequestService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let request = request_service
        .accept(body.request_id, student)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(request)))
}

pub async fn reject_request(
    body: ResolveRequestBody,
    student: StudentId,
    request_service: Arc<dyn RequestService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let request = request_service
        .reject(body.request_id, student)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(request)))
}

#[derive(Debug, Deserialize)]
pub struct RequestListQuery {
    pub page_size: Option<PageSize>,
    pub before: Option<String>,
}

pub async fn list_sent_requests(
    query: RequestListQuery,
    student: StudentId,
    request_service: Arc<dyn RequestService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let page_size = query.page_size.unwrap_or_default();
    let before = parse_cursor::<RequestCursor>(query.before)?;

    let requests = request_service
        .list_sent(student, page_size, before)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    let page = Page::new(requests, page_size, |r| RequestCursor::of(r).to_string());
    Ok(warp::reply::json(&ApiResponse::ok(page)))
}

pub async fn list_received_requests(
    query: RequestListQuery,
    student: StudentId,
    request_service: Arc<dyn RequestService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let page_size = query.page_size.unwrap_or_default();
    let before = parse_cursor::<RequestCursor>(query.before)?;

    let requests = request_service
        .list_received(student, page_size, before)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    let page = Page::new(requests, page_size, |r| RequestCursor::of(r).to_string());
    Ok(warp::reply::json(&ApiResponse::ok(page)))
}

#[derive(Debug, Deserialize)]
pub struct CanMessageQuery {
    pub other: StudentId,
}

#[derive(Debug, Serialize)]
pub struct CanMessageResponse {
    pub other: StudentId,
    pub can_message: bool,
}

pub async fn can_message(
    query: CanMessageQuery,
    student: StudentId,
    permission_oracle: Arc<dyn PermissionOracle>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let can_message = permission_oracle
        .can_message(student, query.other)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    let response = CanMessageResponse {
        other: query.other,
        can_message,
    };
    Ok(warp::reply::json(&ApiResponse::ok(response)))
}

// discovery

#[derive(Debug, Deserialize)]
pub struct DiscoverQuery {
    pub availability: Option<Availability>,
    pub page_size: Option<PageSize>,
    pub after: Option<String>,
}

pub async fn discover_students(
    query: DiscoverQuery,
    student: StudentId,
    discovery_service: Arc<dyn DiscoveryService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let page_size = query.page_size.unwrap_or_default();
    let after = parse_cursor::<StudentCursor>(query.after)?;

    let students = discovery_service
        .discover(student, query.availability, page_size, after)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    let page = Page::new(students, page_size, |s| {
        StudentCursor {
            name: s.name.clone(),
            student_id: s.student_id,
        }
        .to_string()
    });
    Ok(warp::reply::json(&ApiResponse::ok(page)))
}

// groups

pub async fn my_group(
    student: StudentId,
    group_service: Arc<dyn GroupService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let group = group_service
        .my_group(student)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(group)))
}

pub async fn lock_group(
    student: StudentId,
    group_service: Arc<dyn GroupService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let group = group_service
        .lock_group(student)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(group)))
}

#[derive(Debug, Deserialize)]
pub struct RemoveMemberBody {
    pub student_id: StudentId,
}

pub async fn remove_group_member(
    body: RemoveMemberBody,
    student: StudentId,
    group_service: Arc<dyn GroupService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    // null data: the group was emptied and deleted
    let group = group_service
        .remove_member(student, body.student_id)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(group)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectBody {
    pub project_name: String,
    pub description: Option<String>,
}

pub async fn update_group_project(
    body: UpdateProjectBody,
    student: StudentId,
    group_service: Arc<dyn GroupService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let group = group_service
        .update_project(student, &body.project_name, body.description.as_deref())
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(group)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateVisibilityBody {
    pub show_on_profile: bool,
}

pub async fn update_group_visibility(
    body: UpdateVisibilityBody,
    student: StudentId,
    group_service: Arc<dyn GroupService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let member = group_service
        .update_visibility(student, body.show_on_profile)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(member)))
}

// messaging

#[derive(Debug, Deserialize)]
pub struct SendMessageBody {
    pub to: StudentId,
    pub message_id: MessageId,
    pub content: String,
}

pub async fn send_message(
    body: SendMessageBody,
    student: StudentId,
    conversation_service: Arc<dyn ConversationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let message = conversation_service
        .send_message(student, body.to, body.message_id, &body.content)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(message)))
}

#[derive(Debug, Deserialize)]
pub struct ConversationHistoryQuery {
    pub conversation_id: ConversationId,
    pub page_size: Option<PageSize>,
    pub before: Option<String>,
}

pub async fn conversation_history(
    query: ConversationHistoryQuery,
    student: StudentId,
    conversation_service: Arc<dyn ConversationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let page_size = query.page_size.unwrap_or_default();
    let before = parse_cursor::<OffsetCursor>(query.before)?;

    let history = conversation_service
        .get_history(student, query.conversation_id, page_size, before)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    let page = Page::new(history, page_size, |m| OffsetCursor::of(m).to_string());
    Ok(warp::reply::json(&ApiResponse::ok(page)))
}

#[derive(Debug, Deserialize)]
pub struct ConversationListQuery {
    pub page_size: Option<PageSize>,
    pub before: Option<String>,
}

pub async fn list_conversations(
    query: ConversationListQuery,
    student: StudentId,
    conversation_service: Arc<dyn ConversationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let page_size = query.page_size.unwrap_or_default();
    let before = parse_cursor::<ConversationCursor>(query.before)?;

    let conversations = conversation_service
        .list_conversations(student, page_size, before)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    let page = Page::new(conversations, page_size, |c| {
        ConversationCursor::of_summary(c).to_string()
    });
    Ok(warp::reply::json(&ApiResponse::ok(page)))
}
