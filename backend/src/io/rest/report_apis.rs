//! # REST API for Reports and Notifications
//!
//! Every figure here is recomputed from the installment amounts on each
//! request; stored statuses are never read.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;

use crate::domain::models::ChitGroupValidationError;
use crate::io::rest::error_response;
use crate::AppState;
use shared::{NotificationRequest, NotificationResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(get_installment_status))
        .route("/outstanding/:chit_id", get(get_outstanding_report))
        .route("/ledger/:chit_id/:member_id", get(get_member_ledger))
        .route("/dashboard", get(get_dashboard_summary))
        .route("/remind", post(send_reminder))
        .route("/receipt", post(send_receipt))
}

#[derive(Deserialize, Debug)]
pub struct StatusQuery {
    pub chit_group_id: String,
    pub member_id: String,
    pub month_no: u32,
}

#[derive(Deserialize, Debug)]
pub struct DashboardQuery {
    pub chit_group_id: Option<String>,
    pub month_no: Option<u32>,
}

pub async fn get_installment_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> impl IntoResponse {
    info!("GET /api/reports/status - query: {:?}", query);
    Json(
        state
            .ledger
            .resolve_status(&query.chit_group_id, &query.member_id, query.month_no),
    )
}

pub async fn get_outstanding_report(
    State(state): State<AppState>,
    Path(chit_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/reports/outstanding/{}", chit_id);

    if state.ledger.chit_group(&chit_id).is_none() {
        return error_response("Outstanding report", ChitGroupValidationError::NotFound(chit_id).into());
    }
    Json(state.ledger.outstanding_report(&chit_id)).into_response()
}

pub async fn get_member_ledger(
    State(state): State<AppState>,
    Path((chit_id, member_id)): Path<(String, String)>,
) -> impl IntoResponse {
    info!("GET /api/reports/ledger/{}/{}", chit_id, member_id);

    if state.ledger.chit_group(&chit_id).is_none() {
        return error_response("Member ledger", ChitGroupValidationError::NotFound(chit_id).into());
    }
    Json(state.ledger.member_ledger(&chit_id, &member_id)).into_response()
}

pub async fn get_dashboard_summary(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> impl IntoResponse {
    info!("GET /api/reports/dashboard - query: {:?}", query);
    Json(
        state
            .ledger
            .dashboard_summary(query.chit_group_id.as_deref(), query.month_no),
    )
}

/// Send a payment link for the unpaid balance of an installment.
pub async fn send_reminder(
    State(state): State<AppState>,
    Json(request): Json<NotificationRequest>,
) -> impl IntoResponse {
    info!("POST /api/reports/remind - request: {:?}", request);

    match state.notification_service.send_reminder(
        &state.ledger,
        &request.chit_group_id,
        &request.member_id,
        request.month_no,
    ) {
        Ok(amount) => Json(NotificationResponse {
            sent: true,
            amount,
            success_message: format!("Payment link for {:.2} sent", amount),
        })
        .into_response(),
        Err(e) => error_response("Failed to send reminder", e.into()),
    }
}

/// Send a receipt for what has been paid on an installment.
pub async fn send_receipt(
    State(state): State<AppState>,
    Json(request): Json<NotificationRequest>,
) -> impl IntoResponse {
    info!("POST /api/reports/receipt - request: {:?}", request);

    match state.notification_service.send_receipt(
        &state.ledger,
        &request.chit_group_id,
        &request.member_id,
        request.month_no,
    ) {
        Ok(amount) => Json(NotificationResponse {
            sent: true,
            amount,
            success_message: format!("Receipt for {:.2} sent", amount),
        })
        .into_response(),
        Err(e) => error_response("Failed to send receipt", e.into()),
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::commands::chit::CreateChitGroupCommand;
    use crate::domain::commands::member::CreateMemberCommand;
    use crate::domain::commands::payment::RecordPaymentCommand;
    use crate::io::rest::test_support::{get_json, post_json, test_app, test_state};
    use crate::AppState;
    use axum::http::StatusCode;
    use chrono::NaiveDate;
    use shared::{
        DashboardSummary, InstallmentStatus, MemberLedgerResponse, NotificationRequest,
        NotificationResponse, OutstandingRow, PaymentStatus,
    };

    /// Three-month group, one member who paid 1000 for month 1 and 300 for month 2
    fn setup(state: &AppState) -> (String, String) {
        let group = state
            .ledger
            .create_chit_group(CreateChitGroupCommand {
                name: "Report Chit".to_string(),
                chit_value: 3000.0,
                total_months: 3,
                installment_regular: 1000.0,
                installment_allotted: 1200.0,
                start_month: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                upi_id: "report@upi".to_string(),
            })
            .unwrap();
        let member = state
            .ledger
            .create_member(CreateMemberCommand {
                name: "Devi".to_string(),
                mobile: "9444455555".to_string(),
                address: String::new(),
                id_proof_type: None,
                id_proof_number: String::new(),
                chit_group_id: Some(group.id.clone()),
            })
            .unwrap()
            .member;
        for (month_no, amount) in [(1, 1000.0), (2, 300.0)] {
            state
                .ledger
                .record_payment(RecordPaymentCommand {
                    chit_group_id: group.id.clone(),
                    member_id: member.id.clone(),
                    month_no,
                    paid_amount: amount,
                    payment_date: None,
                })
                .unwrap();
        }
        (group.id, member.id)
    }

    #[tokio::test]
    async fn test_status_and_reports() {
        let state = test_state(None);
        let app = test_app(&state);
        let (group_id, member_id) = setup(&state);

        let (status, resolved) = get_json::<InstallmentStatus>(
            &app,
            &format!("/api/reports/status?chit_group_id={}&member_id={}&month_no=2", group_id, member_id),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let resolved = resolved.unwrap();
        assert_eq!(resolved.status, PaymentStatus::Partial);
        assert_eq!(resolved.balance, 700.0);

        let (_, rows) =
            get_json::<Vec<OutstandingRow>>(&app, &format!("/api/reports/outstanding/{}", group_id)).await;
        let rows = rows.unwrap();
        assert_eq!(rows[0].outstanding, 1700.0);
        assert_eq!(rows[0].total_paid, 1300.0);

        let (_, ledger) = get_json::<MemberLedgerResponse>(
            &app,
            &format!("/api/reports/ledger/{}/{}", group_id, member_id),
        )
        .await;
        let ledger = ledger.unwrap();
        assert_eq!(ledger.rows.len(), 3);
        assert_eq!(ledger.rows[0].status, PaymentStatus::Paid);

        let (_, summary) =
            get_json::<DashboardSummary>(&app, &format!("/api/reports/dashboard?chit_group_id={}&month_no=1", group_id))
                .await;
        let summary = summary.unwrap();
        assert_eq!(summary.total_collected, 1000.0);
        assert_eq!(summary.total_outstanding, 0.0);
        assert_eq!(summary.active_groups, 1);
    }

    #[tokio::test]
    async fn test_split_payment_clears_reminder() {
        let state = test_state(None);
        let app = test_app(&state);
        let (group_id, member_id) = setup(&state);
        for amount in [845.14, 120.00, 34.86] {
            state
                .ledger
                .record_payment(RecordPaymentCommand {
                    chit_group_id: group_id.clone(),
                    member_id: member_id.clone(),
                    month_no: 3,
                    paid_amount: amount,
                    payment_date: None,
                })
                .unwrap();
        }

        let resolved = state.ledger.resolve_status(&group_id, &member_id, 3);
        assert_eq!(resolved.status, PaymentStatus::Paid);
        assert_eq!(resolved.balance, 0.0);

        let (status, _) = post_json::<_, NotificationResponse>(
            &app,
            "/api/reports/remind",
            &NotificationRequest {
                chit_group_id: group_id.clone(),
                member_id: member_id.clone(),
                month_no: 3,
            },
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, rows) =
            get_json::<Vec<OutstandingRow>>(&app, &format!("/api/reports/outstanding/{}", group_id)).await;
        assert_eq!(rows.unwrap()[0].outstanding, 700.0);
    }

    #[tokio::test]
    async fn test_reports_for_unknown_group() {
        let state = test_state(None);
        let app = test_app(&state);

        let (status, _) = get_json::<Vec<OutstandingRow>>(&app, "/api/reports/outstanding/chit::nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, resolved) = get_json::<InstallmentStatus>(
            &app,
            "/api/reports/status?chit_group_id=chit::nope&member_id=m&month_no=1",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resolved.unwrap(), InstallmentStatus::default());
    }

    #[tokio::test]
    async fn test_remind_and_receipt() {
        let state = test_state(None);
        let app = test_app(&state);
        let (group_id, member_id) = setup(&state);
        let request = |month_no| NotificationRequest {
            chit_group_id: group_id.clone(),
            member_id: member_id.clone(),
            month_no,
        };

        let (status, reminder) =
            post_json::<_, NotificationResponse>(&app, "/api/reports/remind", &request(2)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reminder.unwrap().amount, 700.0);

        let (status, _) = post_json::<_, NotificationResponse>(&app, "/api/reports/remind", &request(1)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, receipt) =
            post_json::<_, NotificationResponse>(&app, "/api/reports/receipt", &request(1)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(receipt.unwrap().amount, 1000.0);

        let (status, _) = post_json::<_, NotificationResponse>(&app, "/api/reports/receipt", &request(3)).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
