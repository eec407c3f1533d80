//! # REST API for Members and Memberships

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;

use crate::domain::models::MemberValidationError;
use crate::io::rest::error_response;
use crate::io::rest::mappers::MemberMapper;
use crate::AppState;
use shared::{BulkImportRequest, CreateMemberRequest, CreateMembershipRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_members).post(create_member))
        .route("/bulk", post(bulk_import_members))
        .route("/:id", get(get_member))
}

pub fn membership_router() -> Router<AppState> {
    Router::new().route("/", get(list_memberships).post(create_membership))
}

#[derive(Deserialize, Debug)]
pub struct MembershipQuery {
    pub chit_group_id: Option<String>,
}

pub async fn list_members(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/members");
    Json(state.ledger.members())
}

pub async fn get_member(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("GET /api/members/{}", id);

    match state.ledger.member(&id) {
        Some(member) => Json(member).into_response(),
        None => error_response("Member lookup", MemberValidationError::NotFound(id).into()),
    }
}

/// Create a member; the response carries the membership too when a group
/// was named in the request.
pub async fn create_member(
    State(state): State<AppState>,
    Json(request): Json<CreateMemberRequest>,
) -> impl IntoResponse {
    info!("POST /api/members - request: {:?}", request);

    match state.ledger.create_member(MemberMapper::to_create_command(request)) {
        Ok(result) => (StatusCode::CREATED, Json(result.member)).into_response(),
        Err(e) => error_response("Failed to create member", e),
    }
}

pub async fn bulk_import_members(
    State(state): State<AppState>,
    Json(request): Json<BulkImportRequest>,
) -> impl IntoResponse {
    info!("POST /api/members/bulk - {} bytes of CSV", request.csv.len());

    let group_id = request.chit_group_id.as_deref().filter(|g| !g.is_empty());
    match state.ledger.import_members_csv(&request.csv, group_id) {
        Ok(result) => (StatusCode::CREATED, Json(MemberMapper::to_bulk_import_response(result))).into_response(),
        Err(e) => error_response("Failed to import members", e),
    }
}

pub async fn list_memberships(
    State(state): State<AppState>,
    Query(query): Query<MembershipQuery>,
) -> impl IntoResponse {
    info!("GET /api/memberships - query: {:?}", query);
    Json(state.ledger.memberships(query.chit_group_id.as_deref()))
}

/// `201` for a new membership, `200` when the member already belonged to
/// the group.
pub async fn create_membership(
    State(state): State<AppState>,
    Json(request): Json<CreateMembershipRequest>,
) -> impl IntoResponse {
    info!("POST /api/memberships - request: {:?}", request);

    match state.ledger.add_membership(MemberMapper::to_membership_command(request)) {
        Ok(outcome) => {
            let status = if outcome.is_created() { StatusCode::CREATED } else { StatusCode::OK };
            (status, Json(MemberMapper::to_membership_response(outcome))).into_response()
        }
        Err(e) => error_response("Failed to add membership", e),
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::commands::chit::CreateChitGroupCommand;
    use crate::io::rest::test_support::{get_json, post_json, test_app, test_state};
    use axum::http::StatusCode;
    use chrono::NaiveDate;
    use shared::{
        BulkImportRequest, BulkImportResponse, ChitGroup, CreateMemberRequest,
        CreateMembershipRequest, GroupMembership, InstallmentSchedule, Member, MembershipResponse,
    };

    fn group(state: &crate::AppState) -> ChitGroup {
        state
            .ledger
            .create_chit_group(CreateChitGroupCommand {
                name: "Weekly".to_string(),
                chit_value: 6000.0,
                total_months: 6,
                installment_regular: 1000.0,
                installment_allotted: 1150.0,
                start_month: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
                upi_id: String::new(),
            })
            .unwrap()
    }

    fn member_request(mobile: &str, chit_group_id: Option<String>) -> CreateMemberRequest {
        CreateMemberRequest {
            name: "Selvi".to_string(),
            mobile: mobile.to_string(),
            address: "Anna Nagar".to_string(),
            id_proof_type: Some("PAN".to_string()),
            id_proof_number: "ABCDE1234F".to_string(),
            chit_group_id,
        }
    }

    #[tokio::test]
    async fn test_create_member_joins_group() {
        let state = test_state(None);
        let app = test_app(&state);
        let group = group(&state);

        let (status, member) =
            post_json::<_, Member>(&app, "/api/members", &member_request("+91 90000 11111", Some(group.id.clone())))
                .await;
        assert_eq!(status, StatusCode::CREATED);
        let member = member.unwrap();
        assert_eq!(member.mobile, "9000011111");

        let (_, memberships) =
            get_json::<Vec<GroupMembership>>(&app, &format!("/api/memberships?chit_group_id={}", group.id)).await;
        assert_eq!(memberships.unwrap().len(), 1);

        let (status, schedule) = get_json::<Vec<InstallmentSchedule>>(
            &app,
            &format!("/api/schedules?chit_group_id={}&member_id={}", group.id, member.id),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let schedule = schedule.unwrap();
        assert_eq!(schedule.len(), 6);
        assert_eq!(schedule[1].due_date, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }

    #[tokio::test]
    async fn test_short_mobile_is_bad_request() {
        let state = test_state(None);
        let app = test_app(&state);

        let (status, _) = post_json::<_, Member>(&app, "/api/members", &member_request("12345", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(state.ledger.members().is_empty());
    }

    #[tokio::test]
    async fn test_membership_is_created_once() {
        let state = test_state(None);
        let app = test_app(&state);
        let group = group(&state);
        let (_, member) = post_json::<_, Member>(&app, "/api/members", &member_request("9000011111", None)).await;
        let request = CreateMembershipRequest {
            chit_group_id: group.id.clone(),
            member_id: member.unwrap().id,
            joined_on: None,
        };

        let (first, created) = post_json::<_, MembershipResponse>(&app, "/api/memberships", &request).await;
        let (second, again) = post_json::<_, MembershipResponse>(&app, "/api/memberships", &request).await;

        assert_eq!(first, StatusCode::CREATED);
        assert_eq!(second, StatusCode::OK);
        assert!(created.unwrap().created);
        assert!(!again.unwrap().created);
        assert_eq!(state.ledger.installments().len(), 6);
    }

    #[tokio::test]
    async fn test_membership_for_unknown_member_is_not_found() {
        let state = test_state(None);
        let app = test_app(&state);
        let group = group(&state);

        let (status, _) = post_json::<_, MembershipResponse>(
            &app,
            "/api/memberships",
            &CreateMembershipRequest {
                chit_group_id: group.id,
                member_id: "member::ghost".to_string(),
                joined_on: None,
            },
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bulk_import() {
        let state = test_state(None);
        let app = test_app(&state);
        let group = group(&state);

        let (status, response) = post_json::<_, BulkImportResponse>(
            &app,
            "/api/members/bulk",
            &BulkImportRequest {
                csv: "Name,Mobile,Address\nMeena,9123456789,Salem\nRaj,98-76\n".to_string(),
                chit_group_id: Some(group.id.clone()),
            },
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        let response = response.unwrap();
        assert_eq!(response.imported.len(), 2);
        assert_eq!(response.memberships_created, 2);
        assert_eq!(response.imported[1].mobile, "9876");
        assert_eq!(state.ledger.memberships(Some(&group.id))[1].token_no, 2);
    }
}
