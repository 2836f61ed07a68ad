#[cfg(test)]
mod integration_tests {
    use crate::handlers::households::CreateHouseholdRequest;
    use crate::schemas::{ApiResponse, ErrorResponse};
    use crate::test_utils::test_utils::{setup_test_app, setup_test_app_with_token};
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use chrono::NaiveDate;
    use common::{
        AccountDto, GenerationLogPage, GenerationReportDto, RecurringPatternDto, TransactionDto,
        UpcomingOccurrencesDto,
    };
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::Database;
    use serde_json::{json, Value};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    async fn test_server() -> TestServer {
        let app = setup_test_app().await;
        TestServer::new(app).unwrap()
    }

    async fn create_household(server: &TestServer, name: &str) -> i32 {
        let response = server
            .post("/api/v1/households")
            .json(&CreateHouseholdRequest {
                name: name.to_string(),
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        body.data["id"].as_i64().unwrap() as i32
    }

    async fn create_account(server: &TestServer, household_id: i32, name: &str) -> i32 {
        let response = server
            .post(&format!("/api/v1/households/{}/accounts", household_id))
            .json(&json!({ "name": name, "currency_code": "USD" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<AccountDto> = response.json();
        body.data.id
    }

    /// Household with one USD account.
    async fn setup_household(server: &TestServer) -> (i32, i32) {
        let household_id = create_household(server, "Smith family").await;
        let account_id = create_account(server, household_id, "Checking").await;
        (household_id, account_id)
    }

    async fn create_pattern(server: &TestServer, household_id: i32, body: Value) -> RecurringPatternDto {
        let response = server
            .post(&format!("/api/v1/households/{}/recurring-patterns", household_id))
            .json(&body)
            .await;
        if response.status_code() != StatusCode::CREATED {
            println!("Error response: {}", response.text());
            panic!("Expected 201 Created, got {}", response.status_code());
        }
        let body: ApiResponse<RecurringPatternDto> = response.json();
        assert!(body.success);
        body.data
    }

    fn rent_body(account_id: i32) -> Value {
        json!({
            "name": "Rent",
            "description": "Monthly rent",
            "account_id": account_id,
            "frequency": "MONTHLY",
            "transaction_type": "DEBIT",
            "amount": "1200.00",
            "start_date": "2024-01-01",
            "day_of_month": 1
        })
    }

    async fn get_pattern(server: &TestServer, pattern_id: i32) -> RecurringPatternDto {
        let response = server
            .get(&format!("/api/v1/recurring-patterns/{}", pattern_id))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<RecurringPatternDto> = response.json();
        body.data
    }

    async fn run_generation(server: &TestServer, as_of: &str) -> GenerationReportDto {
        let response = server
            .post("/api/v1/recurring-patterns/generate")
            .json(&json!({ "as_of": as_of }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<GenerationReportDto> = response.json();
        body.data
    }

    async fn get_logs(server: &TestServer, pattern_id: i32, query: &str) -> GenerationLogPage {
        let response = server
            .get(&format!("/api/v1/recurring-patterns/{}/logs{}", pattern_id, query))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<GenerationLogPage> = response.json();
        body.data
    }

    async fn get_upcoming(server: &TestServer, pattern_id: i32, count: usize) -> Vec<NaiveDate> {
        let response = server
            .get(&format!(
                "/api/v1/recurring-patterns/{}/upcoming?count={}",
                pattern_id, count
            ))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<UpcomingOccurrencesDto> = response.json();
        body.data.dates
    }

    async fn get_transactions(server: &TestServer, account_id: i32) -> Vec<TransactionDto> {
        let response = server
            .get(&format!("/api/v1/accounts/{}/transactions", account_id))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<TransactionDto>> = response.json();
        body.data
    }

    async fn toggle(server: &TestServer, pattern_id: i32, body: Option<Value>) -> RecurringPatternDto {
        let request = server.post(&format!("/api/v1/recurring-patterns/{}/toggle", pattern_id));
        let response = match body {
            Some(body) => request.json(&body).await,
            None => request.await,
        };
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<RecurringPatternDto> = response.json();
        body.data
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = test_server().await;

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn test_prometheus_metrics_endpoint() {
        let server = test_server().await;

        // Metrics are only mounted by the serve command
        let response = server.get("/metrics").await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let server = test_server().await;

        let response = server.get("/api-docs/openapi.json").await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["info"]["title"], "Hearth API");
        assert!(body["paths"]["/api/v1/recurring-patterns/generate"]["post"].is_object());
    }

    #[tokio::test]
    async fn test_migrations_apply_and_revert_on_sqlite() {
        let db = Database::connect("sqlite::memory:").await.unwrap();

        Migrator::up(&db, None).await.unwrap();
        Migrator::down(&db, None).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        assert!(Migrator::get_pending_migrations(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_and_get_household() {
        let server = test_server().await;

        let household_id = create_household(&server, "  Smith family ").await;

        let response = server
            .get(&format!("/api/v1/households/{}", household_id))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["name"], "Smith family");
        assert_eq!(body.message, "Household retrieved successfully");
    }

    #[tokio::test]
    async fn test_get_household_not_found() {
        let server = test_server().await;

        let response = server.get("/api/v1/households/999").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let error: ErrorResponse = response.json();
        assert_eq!(error.code, "HOUSEHOLD_NOT_FOUND");
        assert!(!error.success);
    }

    #[tokio::test]
    async fn test_create_household_with_empty_name() {
        let server = test_server().await;

        let response = server
            .post("/api/v1/households")
            .json(&json!({ "name": "" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = response.json();
        assert_eq!(error.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_account_currency_is_normalized() {
        let server = test_server().await;
        let household_id = create_household(&server, "Dupont").await;

        let response = server
            .post(&format!("/api/v1/households/{}/accounts", household_id))
            .json(&json!({ "name": "Livret", "currency_code": " eur " }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<AccountDto> = response.json();
        assert_eq!(body.data.currency_code, "EUR");
        assert!(!body.data.is_closed);

        let response = server
            .post(&format!("/api/v1/households/{}/accounts", household_id))
            .json(&json!({ "name": "Fake", "currency_code": "XYZ" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = response.json();
        assert_eq!(error.code, "INVALID_CURRENCY_CODE");

        let response = server
            .get(&format!("/api/v1/households/{}/accounts", household_id))
            .await;
        let body: ApiResponse<Vec<AccountDto>> = response.json();
        assert_eq!(body.data.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_category_is_rejected() {
        let server = test_server().await;
        let household_id = create_household(&server, "Smith family").await;
        let path = format!("/api/v1/households/{}/categories", household_id);

        server
            .post(&path)
            .json(&json!({ "name": "Housing" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.post(&path).json(&json!({ "name": "Housing" })).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = response.json();
        assert_eq!(error.code, "VALIDATION_ERROR");

        let response = server.get(&path).await;
        let body: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(body.data.len(), 1);
    }

    #[tokio::test]
    async fn test_create_recurring_pattern() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;

        let pattern = create_pattern(&server, household_id, rent_body(account_id)).await;

        assert!(pattern.id > 0);
        assert_eq!(pattern.household_id, household_id);
        assert_eq!(pattern.frequency, "MONTHLY");
        assert_eq!(pattern.transaction_type, "DEBIT");
        assert_eq!(pattern.amount, Decimal::new(120000, 2));
        assert_eq!(pattern.next_generation_date, date(2024, 1, 1));
        assert_eq!(pattern.last_generated_date, None);
        assert_eq!(pattern.status, "ACTIVE");
        assert!(pattern.is_active);
        assert!(!pattern.is_paused);
    }

    #[tokio::test]
    async fn test_amount_accepts_numbers_and_is_emitted_as_string() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;

        let mut body = rent_body(account_id);
        body["amount"] = json!(15);
        let pattern = create_pattern(&server, household_id, body).await;

        let response = server
            .get(&format!("/api/v1/recurring-patterns/{}", pattern.id))
            .await;
        let raw: Value = response.json();
        assert_eq!(raw["data"]["amount"], "15");
    }

    #[tokio::test]
    async fn test_create_pattern_validation_errors() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;
        let path = format!("/api/v1/households/{}/recurring-patterns", household_id);

        let cases = vec![
            ("frequency", json!("FORTNIGHTLY"), "VALIDATION_ERROR"),
            ("transaction_type", json!("TRANSFER"), "VALIDATION_ERROR"),
            ("amount", json!("0"), "VALIDATION_ERROR"),
            ("amount", json!("-5.00"), "VALIDATION_ERROR"),
            ("day_of_month", json!(32), "VALIDATION_ERROR"),
            ("end_date", json!("2023-12-31"), "VALIDATION_ERROR"),
            ("account_id", json!(999), "INVALID_ACCOUNT_ID"),
            ("category_id", json!(999), "INVALID_CATEGORY_ID"),
        ];

        for (field, value, code) in cases {
            let mut body = rent_body(account_id);
            body[field] = value;
            let response = server.post(&path).json(&body).await;
            response.assert_status(StatusCode::BAD_REQUEST);
            let error: ErrorResponse = response.json();
            assert_eq!(error.code, code, "field {}", field);
        }

        // Weekly without its anchor
        let mut body = rent_body(account_id);
        body["frequency"] = json!("WEEKLY");
        let response = server.post(&path).json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .get(&format!("/api/v1/households/{}/recurring-patterns", household_id))
            .await;
        let body: ApiResponse<Vec<RecurringPatternDto>> = response.json();
        assert!(body.data.is_empty());
    }

    #[tokio::test]
    async fn test_create_pattern_without_occurrence_before_end_date() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;

        let mut body = rent_body(account_id);
        body["start_date"] = json!("2024-01-21");
        body["day_of_month"] = json!(20);
        body["end_date"] = json!("2024-02-10");

        let response = server
            .post(&format!("/api/v1/households/{}/recurring-patterns", household_id))
            .json(&body)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = response.json();
        assert_eq!(error.code, "NO_OCCURRENCE");
    }

    #[tokio::test]
    async fn test_pattern_rejects_account_of_other_household() {
        let server = test_server().await;
        let (household_id, _) = setup_household(&server).await;
        let (_, foreign_account) = setup_household(&server).await;

        let response = server
            .post(&format!("/api/v1/households/{}/recurring-patterns", household_id))
            .json(&rent_body(foreign_account))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = response.json();
        assert_eq!(error.code, "INVALID_ACCOUNT_ID");
        assert!(error.error.contains(&format!("Account with id {}", foreign_account)));
    }

    #[tokio::test]
    async fn test_upcoming_month_end_is_clamped() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;

        let mut body = rent_body(account_id);
        body["start_date"] = json!("2024-01-31");
        body["day_of_month"] = json!(31);
        let pattern = create_pattern(&server, household_id, body).await;

        let dates = get_upcoming(&server, pattern.id, 4).await;
        assert_eq!(
            dates,
            vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 31), date(2024, 4, 30)]
        );
    }

    #[tokio::test]
    async fn test_upcoming_weekly_and_yearly() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;

        let weekly = create_pattern(
            &server,
            household_id,
            json!({
                "name": "Cleaner",
                "account_id": account_id,
                "frequency": "WEEKLY",
                "transaction_type": "DEBIT",
                "amount": "40.00",
                "start_date": "2024-01-01",
                "day_of_week": 1
            }),
        )
        .await;
        assert_eq!(
            get_upcoming(&server, weekly.id, 5).await,
            vec![
                date(2024, 1, 1),
                date(2024, 1, 8),
                date(2024, 1, 15),
                date(2024, 1, 22),
                date(2024, 1, 29)
            ]
        );

        let yearly = create_pattern(
            &server,
            household_id,
            json!({
                "name": "Insurance",
                "account_id": account_id,
                "frequency": "YEARLY",
                "transaction_type": "DEBIT",
                "amount": "480.00",
                "start_date": "2024-02-29"
            }),
        )
        .await;
        assert_eq!(
            get_upcoming(&server, yearly.id, 3).await,
            vec![date(2024, 2, 29), date(2025, 2, 28), date(2026, 2, 28)]
        );
    }

    #[tokio::test]
    async fn test_upcoming_stops_at_end_date() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;

        let mut body = rent_body(account_id);
        body["end_date"] = json!("2024-03-15");
        let pattern = create_pattern(&server, household_id, body).await;

        let dates = get_upcoming(&server, pattern.id, 10).await;
        assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 2, 1), date(2024, 3, 1)]);
    }

    #[tokio::test]
    async fn test_generation_books_transaction_and_advances() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;
        let pattern = create_pattern(&server, household_id, rent_body(account_id)).await;

        let report = run_generation(&server, "2024-01-01").await;
        assert_eq!(report.as_of, date(2024, 1, 1));
        assert_eq!(report.processed, 1);
        assert_eq!(report.generated, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(report.runs[0].outcome, "GENERATED");
        assert_eq!(report.runs[0].next_generation_date, Some(date(2024, 2, 1)));

        let transactions = get_transactions(&server, account_id).await;
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].recurring_pattern_id, Some(pattern.id));
        assert_eq!(transactions[0].amount, Decimal::new(120000, 2));
        assert_eq!(transactions[0].date, date(2024, 1, 1));
        assert_eq!(transactions[0].description.as_deref(), Some("Monthly rent"));
        assert_eq!(Some(transactions[0].id), report.runs[0].transaction_id);

        let updated = get_pattern(&server, pattern.id).await;
        assert_eq!(updated.next_generation_date, date(2024, 2, 1));
        assert_eq!(updated.last_generated_date, Some(date(2024, 1, 1)));

        // Nothing is due any more on the same day
        let report = run_generation(&server, "2024-01-01").await;
        assert_eq!(report.processed, 0);
        assert_eq!(get_transactions(&server, account_id).await.len(), 1);

        let logs = get_logs(&server, pattern.id, "").await;
        assert_eq!(logs.total, 1);
        assert_eq!(logs.logs[0].status, "SUCCESS");
        assert_eq!(logs.logs[0].generated_date, date(2024, 1, 1));
    }

    #[tokio::test]
    async fn test_overdue_pattern_fires_once() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;
        let pattern = create_pattern(&server, household_id, rent_body(account_id)).await;

        let report = run_generation(&server, "2024-04-15").await;

        assert_eq!(report.generated, 1);
        assert_eq!(get_transactions(&server, account_id).await.len(), 1);
        let updated = get_pattern(&server, pattern.id).await;
        assert_eq!(updated.next_generation_date, date(2024, 5, 1));
    }

    #[tokio::test]
    async fn test_generation_failure_is_logged_and_advances() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;
        let pattern = create_pattern(&server, household_id, rent_body(account_id)).await;

        server
            .post(&format!("/api/v1/accounts/{}/close", account_id))
            .await
            .assert_status(StatusCode::OK);

        let report = run_generation(&server, "2024-01-01").await;
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.runs[0].outcome, "FAILED");
        assert_eq!(
            report.runs[0].error.as_deref(),
            Some(format!("Account {} is closed", account_id).as_str())
        );

        let updated = get_pattern(&server, pattern.id).await;
        assert_eq!(updated.next_generation_date, date(2024, 2, 1));
        assert_eq!(updated.last_generated_date, None);
        assert_eq!(updated.status, "ACTIVE");

        let logs = get_logs(&server, pattern.id, "").await;
        assert_eq!(logs.logs[0].status, "FAILED");
        assert_eq!(logs.logs[0].transaction_id, None);
        assert!(get_transactions(&server, account_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_deleted_account_fails_generation() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;
        let pattern = create_pattern(&server, household_id, rent_body(account_id)).await;

        server
            .delete(&format!("/api/v1/accounts/{}", account_id))
            .await
            .assert_status(StatusCode::OK);

        let report = run_generation(&server, "2024-01-01").await;
        assert_eq!(report.failed, 1);

        let logs = get_logs(&server, pattern.id, "").await;
        assert_eq!(
            logs.logs[0].error_message.as_deref(),
            Some(format!("Account {} not found", account_id).as_str())
        );
    }

    #[tokio::test]
    async fn test_pattern_expires_after_end_date() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;
        let mut body = rent_body(account_id);
        body["end_date"] = json!("2024-02-15");
        let pattern = create_pattern(&server, household_id, body).await;

        run_generation(&server, "2024-01-01").await;
        assert_eq!(get_pattern(&server, pattern.id).await.status, "ACTIVE");

        let report = run_generation(&server, "2024-02-01").await;
        assert_eq!(report.generated, 1);
        assert!(report.runs[0].deactivated);

        let expired = get_pattern(&server, pattern.id).await;
        assert_eq!(expired.status, "INACTIVE");
        assert!(!expired.is_active);
        assert!(get_upcoming(&server, pattern.id, 5).await.is_empty());

        let report = run_generation(&server, "2024-03-01").await;
        assert_eq!(report.processed, 0);
        assert_eq!(get_transactions(&server, account_id).await.len(), 2);
    }

    #[tokio::test]
    async fn test_pause_and_resume() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;
        let pattern = create_pattern(&server, household_id, rent_body(account_id)).await;

        let paused = toggle(&server, pattern.id, None).await;
        assert_eq!(paused.status, "PAUSED");
        assert!(paused.is_paused);
        assert!(paused.is_active);

        // Pausing twice is a no-op
        let paused = toggle(&server, pattern.id, Some(json!({ "paused": true }))).await;
        assert_eq!(paused.status, "PAUSED");

        let report = run_generation(&server, "2024-01-01").await;
        assert_eq!(report.processed, 0);

        let resumed = toggle(&server, pattern.id, Some(json!({ "paused": false }))).await;
        assert_eq!(resumed.status, "ACTIVE");
        assert_eq!(resumed.next_generation_date, pattern.next_generation_date);

        let report = run_generation(&server, "2024-01-01").await;
        assert_eq!(report.generated, 1);
    }

    #[tokio::test]
    async fn test_malformed_toggle_body_is_rejected() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;
        let pattern = create_pattern(&server, household_id, rent_body(account_id)).await;

        let response = server
            .post(&format!("/api/v1/recurring-patterns/{}/toggle", pattern.id))
            .text("{\"paused\": tru")
            .content_type("application/json")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = response.json();
        assert_eq!(error.code, "VALIDATION_ERROR");

        let response = server
            .post(&format!("/api/v1/recurring-patterns/{}/toggle", pattern.id))
            .json(&json!({ "paused": "yes" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        assert_eq!(get_pattern(&server, pattern.id).await.status, "ACTIVE");
    }

    #[tokio::test]
    async fn test_deactivated_pattern_cannot_be_resumed() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;
        let pattern = create_pattern(&server, household_id, rent_body(account_id)).await;

        let response = server
            .post(&format!("/api/v1/recurring-patterns/{}/deactivate", pattern.id))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<RecurringPatternDto> = response.json();
        assert_eq!(body.data.status, "INACTIVE");

        let response = server
            .post(&format!("/api/v1/recurring-patterns/{}/toggle", pattern.id))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let error: ErrorResponse = response.json();
        assert_eq!(error.code, "INVALID_STATE_TRANSITION");

        // Editing does not revive it
        let response = server
            .put(&format!("/api/v1/recurring-patterns/{}", pattern.id))
            .json(&json!({ "day_of_month": 15 }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<RecurringPatternDto> = response.json();
        assert_eq!(body.data.status, "INACTIVE");
        assert_eq!(body.data.day_of_month, Some(15));

        let response = server
            .get(&format!(
                "/api/v1/households/{}/recurring-patterns?active_only=true",
                household_id
            ))
            .await;
        let body: ApiResponse<Vec<RecurringPatternDto>> = response.json();
        assert!(body.data.is_empty());

        let response = server
            .get(&format!("/api/v1/households/{}/recurring-patterns", household_id))
            .await;
        let body: ApiResponse<Vec<RecurringPatternDto>> = response.json();
        assert_eq!(body.data.len(), 1);
    }

    #[tokio::test]
    async fn test_update_reschedules_without_regenerating() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;
        let mut body = rent_body(account_id);
        body["day_of_month"] = json!(20);
        let pattern = create_pattern(&server, household_id, body).await;
        assert_eq!(pattern.next_generation_date, date(2024, 1, 20));

        run_generation(&server, "2024-01-20").await;
        assert_eq!(get_pattern(&server, pattern.id).await.next_generation_date, date(2024, 2, 20));

        let response = server
            .put(&format!("/api/v1/recurring-patterns/{}", pattern.id))
            .json(&json!({ "day_of_month": 5, "amount": "1250.00" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<RecurringPatternDto> = response.json();
        assert_eq!(body.data.next_generation_date, date(2024, 3, 5));
        assert_eq!(body.data.amount, Decimal::new(125000, 2));
        assert_eq!(body.data.name, "Rent");
    }

    #[tokio::test]
    async fn test_repeated_updates_never_regenerate_occurrence() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;
        let pattern = create_pattern(&server, household_id, rent_body(account_id)).await;

        let report = run_generation(&server, "2024-01-01").await;
        assert_eq!(report.generated, 1);

        for start_date in ["2024-02-01", "2024-01-01"] {
            let response = server
                .put(&format!("/api/v1/recurring-patterns/{}", pattern.id))
                .json(&json!({ "start_date": start_date }))
                .await;
            response.assert_status(StatusCode::OK);
            let body: ApiResponse<RecurringPatternDto> = response.json();
            assert_eq!(body.data.next_generation_date, date(2024, 2, 1));
        }

        let report = run_generation(&server, "2024-01-01").await;
        assert_eq!(report.processed, 0);
        assert_eq!(get_transactions(&server, account_id).await.len(), 1);
        assert_eq!(get_logs(&server, pattern.id, "").await.total, 1);
    }

    #[tokio::test]
    async fn test_update_before_first_generation_uses_start_date() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;
        let mut body = rent_body(account_id);
        body["day_of_month"] = json!(20);
        let pattern = create_pattern(&server, household_id, body).await;

        let response = server
            .put(&format!("/api/v1/recurring-patterns/{}", pattern.id))
            .json(&json!({ "day_of_month": 5 }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<RecurringPatternDto> = response.json();
        assert_eq!(body.data.next_generation_date, date(2024, 1, 5));
    }

    #[tokio::test]
    async fn test_update_switches_frequency_and_clears_anchor() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;
        let pattern = create_pattern(&server, household_id, rent_body(account_id)).await;

        // Keeping day_of_month with WEEKLY is rejected
        let response = server
            .put(&format!("/api/v1/recurring-patterns/{}", pattern.id))
            .json(&json!({ "frequency": "WEEKLY", "day_of_week": 3 }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .put(&format!("/api/v1/recurring-patterns/{}", pattern.id))
            .json(&json!({ "frequency": "WEEKLY", "day_of_week": 3, "day_of_month": null }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<RecurringPatternDto> = response.json();
        assert_eq!(body.data.frequency, "WEEKLY");
        assert_eq!(body.data.day_of_month, None);
        assert_eq!(body.data.day_of_week, Some(3));
        assert_eq!(body.data.next_generation_date, date(2024, 1, 3));

        let response = server
            .put(&format!("/api/v1/recurring-patterns/{}", pattern.id))
            .json(&json!({ "end_date": "2023-06-01" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = response.json();
        assert_eq!(error.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_upcoming_reflects_updates() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;
        let pattern = create_pattern(&server, household_id, rent_body(account_id)).await;

        assert_eq!(
            get_upcoming(&server, pattern.id, 2).await,
            vec![date(2024, 1, 1), date(2024, 2, 1)]
        );

        server
            .put(&format!("/api/v1/recurring-patterns/{}", pattern.id))
            .json(&json!({ "day_of_month": 10 }))
            .await
            .assert_status(StatusCode::OK);

        assert_eq!(
            get_upcoming(&server, pattern.id, 2).await,
            vec![date(2024, 1, 10), date(2024, 2, 10)]
        );
    }

    #[tokio::test]
    async fn test_logs_survive_pattern_deletion() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;
        let pattern = create_pattern(&server, household_id, rent_body(account_id)).await;

        for as_of in ["2024-01-01", "2024-02-01", "2024-03-01"] {
            assert_eq!(run_generation(&server, as_of).await.generated, 1);
        }

        let response = server
            .delete(&format!("/api/v1/recurring-patterns/{}", pattern.id))
            .await;
        response.assert_status(StatusCode::OK);

        server
            .get(&format!("/api/v1/recurring-patterns/{}", pattern.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let logs = get_logs(&server, pattern.id, "").await;
        assert_eq!(logs.total, 3);
        assert!(logs.logs.iter().all(|log| log.status == "SUCCESS"));

        // Generated transactions stay on the ledger, detached from the pattern
        let transactions = get_transactions(&server, account_id).await;
        assert_eq!(transactions.len(), 3);
        assert!(transactions.iter().all(|t| t.recurring_pattern_id.is_none()));

        server
            .delete(&format!("/api/v1/recurring-patterns/{}", pattern.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_logs_are_paginated_newest_first() {
        let server = test_server().await;
        let (household_id, account_id) = setup_household(&server).await;
        let pattern = create_pattern(&server, household_id, rent_body(account_id)).await;

        for as_of in ["2024-01-01", "2024-02-01", "2024-03-01"] {
            run_generation(&server, as_of).await;
        }

        let first = get_logs(&server, pattern.id, "?page=1&limit=2").await;
        assert_eq!(first.total, 3);
        assert_eq!(first.limit, 2);
        assert_eq!(
            first.logs.iter().map(|log| log.generated_date).collect::<Vec<_>>(),
            vec![date(2024, 3, 1), date(2024, 2, 1)]
        );

        let second = get_logs(&server, pattern.id, "?page=2&limit=2").await;
        assert_eq!(second.logs.len(), 1);
        assert_eq!(second.logs[0].generated_date, date(2024, 1, 1));

        let response = server
            .get(&format!("/api/v1/recurring-patterns/{}/logs?limit=101", pattern.id))
            .await;
        assert!(response.status_code().is_client_error());
    }

    #[tokio::test]
    async fn test_generation_token_is_enforced() {
        let app = setup_test_app_with_token("s3cret").await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/v1/recurring-patterns/generate")
            .json(&json!({ "as_of": "2024-01-01" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let error: ErrorResponse = response.json();
        assert_eq!(error.code, "UNAUTHORIZED");

        let response = server
            .post("/api/v1/recurring-patterns/generate")
            .add_header(
                HeaderName::from_static("x-generation-token"),
                HeaderValue::from_static("wrong"),
            )
            .json(&json!({ "as_of": "2024-01-01" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .post("/api/v1/recurring-patterns/generate")
            .add_header(
                HeaderName::from_static("x-generation-token"),
                HeaderValue::from_static("s3cret"),
            )
            .json(&json!({ "as_of": "2024-01-01" }))
            .await;
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_generation_without_body_uses_today() {
        let server = test_server().await;

        let response = server.post("/api/v1/recurring-patterns/generate").await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<GenerationReportDto> = response.json();
        assert_eq!(body.data.as_of, chrono::Utc::now().date_naive());
        assert_eq!(body.data.processed, 0);
    }

    #[tokio::test]
    async fn test_get_recurring_pattern_not_found() {
        let server = test_server().await;

        let response = server.get("/api/v1/recurring-patterns/424242").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let error: ErrorResponse = response.json();
        assert_eq!(error.code, "RECURRING_PATTERN_NOT_FOUND");
        assert_eq!(error.error, "Recurring pattern with id 424242 does not exist");
    }
}
