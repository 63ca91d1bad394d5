use std::collections::{BTreeSet, HashSet};
use std::net::SocketAddr;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task;
use tracing::{error, info};

use crate::model::{
    Customer, Employee, EmployeeSkill, Id, NewCustomer, NewEmployee, NewPet, NewSchedule, Pet,
    Schedule, weekdays,
};
use crate::persistence::{StoreError, StoreResult};
use crate::service::DaycareService;

#[derive(Clone)]
pub struct AppState {
    service: DaycareService,
}

impl AppState {
    pub fn new(service: DaycareService) -> Self {
        Self { service }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Unavailable(String),
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { .. } => ApiError::NotFound(value.to_string()),
            StoreError::Unavailable(_) => ApiError::Unavailable(value.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                let body = Json(ErrorBody {
                    error: "not_found",
                    message,
                });
                (StatusCode::NOT_FOUND, body).into_response()
            }
            ApiError::Unavailable(message) => {
                error!(%message, "store failure while handling request");
                let body = Json(ErrorBody {
                    error: "store_unavailable",
                    message,
                });
                (StatusCode::SERVICE_UNAVAILABLE, body).into_response()
            }
        }
    }
}

/// Body of the availability query.
#[derive(Debug, Deserialize)]
struct EmployeeRequest {
    #[serde(default)]
    skills: BTreeSet<EmployeeSkill>,
    date: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct DaysPayload(#[serde(with = "weekdays")] HashSet<Weekday>);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/user/customer", get(all_customers).post(save_customer))
        .route("/user/customer/pet/:pet_id", get(owner_by_pet))
        .route("/user/employee", post(save_employee))
        .route(
            "/user/employee/availability",
            get(find_employees_for_service).post(find_employees_for_service),
        )
        .route(
            "/user/employee/:employee_id",
            get(get_employee).post(get_employee).put(set_availability),
        )
        .route("/user/employee/:employee_id/skills", put(set_skills))
        .route("/pet", get(all_pets).post(save_pet))
        .route("/pet/:pet_id", get(get_pet))
        .route("/pet/owner/:owner_id", get(pets_by_owner))
        .route("/schedule", get(all_schedules).post(create_schedule))
        .route("/schedule/employee/:employee_id", get(schedules_for_employee))
        .route("/schedule/pet/:pet_id", get(schedules_for_pet))
        .route("/schedule/customer/:customer_id", get(schedules_for_customer))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, service: DaycareService) -> std::io::Result<()> {
    let app = router(AppState::new(service));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "critter HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Runs a store call on tokio's blocking pool; SQLite I/O and the store
/// locks never run on an async worker.
async fn blocking<T, F>(state: &AppState, work: F) -> Result<T, ApiError>
where
    F: FnOnce(DaycareService) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let service = state.service.clone();
    task::spawn_blocking(move || work(service))
        .await
        .map_err(|err| ApiError::Unavailable(format!("store task failed: {err}")))?
        .map_err(ApiError::from)
}

async fn save_customer(
    State(state): State<AppState>,
    Json(customer): Json<NewCustomer>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let saved = blocking(&state, move |service| service.save_customer(customer)).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn all_customers(State(state): State<AppState>) -> Result<Json<Vec<Customer>>, ApiError> {
    Ok(Json(blocking(&state, |service| service.all_customers()).await?))
}

async fn owner_by_pet(
    State(state): State<AppState>,
    Path(pet_id): Path<Id>,
) -> Result<Json<Customer>, ApiError> {
    Ok(Json(blocking(&state, move |service| service.owner_of_pet(pet_id)).await?))
}

async fn save_employee(
    State(state): State<AppState>,
    Json(employee): Json<NewEmployee>,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    let saved = blocking(&state, move |service| service.save_employee(employee)).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn get_employee(
    State(state): State<AppState>,
    Path(employee_id): Path<Id>,
) -> Result<Json<Employee>, ApiError> {
    Ok(Json(blocking(&state, move |service| service.employee(employee_id)).await?))
}

async fn set_availability(
    State(state): State<AppState>,
    Path(employee_id): Path<Id>,
    Json(DaysPayload(days)): Json<DaysPayload>,
) -> Result<Json<Employee>, ApiError> {
    let updated = blocking(&state, move |service| {
        service.set_availability(employee_id, days)
    })
    .await?;
    Ok(Json(updated))
}

async fn set_skills(
    State(state): State<AppState>,
    Path(employee_id): Path<Id>,
    Json(skills): Json<BTreeSet<EmployeeSkill>>,
) -> Result<Json<Employee>, ApiError> {
    let updated = blocking(&state, move |service| service.set_skills(employee_id, skills)).await?;
    Ok(Json(updated))
}

async fn find_employees_for_service(
    State(state): State<AppState>,
    Json(request): Json<EmployeeRequest>,
) -> Result<Json<Vec<Employee>>, ApiError> {
    let employees = blocking(&state, move |service| {
        service.find_qualified_employees(&request.skills, request.date)
    })
    .await?;
    Ok(Json(employees))
}

async fn save_pet(
    State(state): State<AppState>,
    Json(pet): Json<NewPet>,
) -> Result<(StatusCode, Json<Pet>), ApiError> {
    let saved = blocking(&state, move |service| service.save_pet(pet)).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn all_pets(State(state): State<AppState>) -> Result<Json<Vec<Pet>>, ApiError> {
    Ok(Json(blocking(&state, |service| service.all_pets()).await?))
}

async fn get_pet(
    State(state): State<AppState>,
    Path(pet_id): Path<Id>,
) -> Result<Json<Pet>, ApiError> {
    Ok(Json(blocking(&state, move |service| service.pet(pet_id)).await?))
}

async fn pets_by_owner(
    State(state): State<AppState>,
    Path(owner_id): Path<Id>,
) -> Result<Json<Vec<Pet>>, ApiError> {
    Ok(Json(blocking(&state, move |service| service.pets_by_owner(owner_id)).await?))
}

async fn create_schedule(
    State(state): State<AppState>,
    Json(schedule): Json<NewSchedule>,
) -> Result<(StatusCode, Json<Schedule>), ApiError> {
    let NewSchedule {
        employee_ids,
        pet_ids,
        date,
        activities,
    } = schedule;
    let created = blocking(&state, move |service| {
        service.create_schedule(pet_ids, employee_ids, date, activities)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn all_schedules(State(state): State<AppState>) -> Result<Json<Vec<Schedule>>, ApiError> {
    Ok(Json(blocking(&state, |service| service.all_schedules()).await?))
}

async fn schedules_for_employee(
    State(state): State<AppState>,
    Path(employee_id): Path<Id>,
) -> Result<Json<Vec<Schedule>>, ApiError> {
    let schedules = blocking(&state, move |service| {
        service.schedules_for_employee(employee_id)
    })
    .await?;
    Ok(Json(schedules))
}

async fn schedules_for_pet(
    State(state): State<AppState>,
    Path(pet_id): Path<Id>,
) -> Result<Json<Vec<Schedule>>, ApiError> {
    Ok(Json(blocking(&state, move |service| service.schedules_for_pet(pet_id)).await?))
}

async fn schedules_for_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Id>,
) -> Result<Json<Vec<Schedule>>, ApiError> {
    let schedules = blocking(&state, move |service| {
        service.schedules_for_customer(customer_id)
    })
    .await?;
    Ok(Json(schedules))
}
