use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;

use anycrawl_core::models::webhook::{Owner, WebhookScope};
use anycrawl_core::webhooks::{
    self, create_delivery, create_subscription, dispatch_one, list_deliveries, list_subscriptions,
    replay, set_active, update_subscription, NewSubscriptionInput, SubscriptionPatch,
};

use crate::dto::{
    CreateWebhookRequest, ListDeliveriesQuery, PatchWebhookRequest, WebhookDeliveryResponse,
    WebhookSubscriptionCreatedResponse, WebhookSubscriptionResponse,
};
use crate::error::ApiError;
use crate::extractors::ApiKeyId;
use crate::state::AppState;

const DEFAULT_DELIVERY_LIMIT: i64 = 50;

#[utoipa::path(
    post,
    path = "/v1/webhooks",
    tag = "webhooks",
    request_body = CreateWebhookRequest,
    responses(
        (status = 201, description = "Subscription created", body = WebhookSubscriptionCreatedResponse),
        (status = 400, description = "Validation error"),
    )
)]
pub async fn create(
    State(state): State<AppState>,
    ApiKeyId(api_key_id): ApiKeyId,
    Json(body): Json<CreateWebhookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.url.trim().is_empty() {
        return Err(ApiError::Validation("url must not be empty".to_string()));
    }
    if body.event_types.is_empty() {
        return Err(ApiError::Validation(
            "event_types must not be empty".to_string(),
        ));
    }
    let scope = match body.scope.as_deref() {
        None => WebhookScope::All,
        Some(s) => WebhookScope::from_str(s)
            .ok_or_else(|| ApiError::Validation(format!("unknown scope {s}")))?,
    };

    let input = NewSubscriptionInput {
        owner: Owner::ApiKey(api_key_id),
        url: body.url,
        scope,
        event_types: body.event_types,
        specific_task_ids: body.specific_task_ids,
        custom_headers: body.custom_headers,
        timeout_ms: body.timeout_ms.unwrap_or(5_000),
        max_retries: body.max_retries.unwrap_or(5),
        backoff_multiplier: body.backoff_multiplier.unwrap_or(2.0),
        tags: body.tags,
        metadata: body.metadata,
    };
    let subscription = create_subscription(&state.ctx.pool, input).await?;
    let secret = subscription.secret.clone();
    Ok((
        axum::http::StatusCode::CREATED,
        Json(WebhookSubscriptionCreatedResponse {
            subscription: WebhookSubscriptionResponse::from(&subscription),
            secret,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/webhooks",
    tag = "webhooks",
    responses((status = 200, description = "Subscriptions for this api key", body = [WebhookSubscriptionResponse]))
)]
pub async fn list(
    State(state): State<AppState>,
    ApiKeyId(api_key_id): ApiKeyId,
) -> Result<impl IntoResponse, ApiError> {
    let owner = Owner::ApiKey(api_key_id);
    let subscriptions = list_subscriptions(&state.ctx.pool, &owner).await?;
    let body: Vec<WebhookSubscriptionResponse> =
        subscriptions.iter().map(WebhookSubscriptionResponse::from).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/v1/webhooks/{id}",
    tag = "webhooks",
    params(("id" = String, Path)),
    responses(
        (status = 200, description = "Subscription", body = WebhookSubscriptionResponse),
        (status = 404, description = "Not found"),
    )
)]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = webhooks::subscriptions::get_subscription_or_404(&state.ctx.pool, &id).await?;
    Ok(Json(WebhookSubscriptionResponse::from(&subscription)))
}

#[utoipa::path(
    patch,
    path = "/v1/webhooks/{id}",
    tag = "webhooks",
    params(("id" = String, Path)),
    request_body = PatchWebhookRequest,
    responses(
        (status = 200, description = "Updated subscription", body = WebhookSubscriptionResponse),
        (status = 404, description = "Not found"),
    )
)]
pub async fn patch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PatchWebhookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = SubscriptionPatch {
        url: body.url,
        event_types: body.event_types,
        is_active: body.is_active,
        max_retries: body.max_retries,
        timeout_ms: body.timeout_ms,
    };
    let subscription = update_subscription(&state.ctx.pool, &id, patch).await?;
    Ok(Json(WebhookSubscriptionResponse::from(&subscription)))
}

#[utoipa::path(
    delete,
    path = "/v1/webhooks/{id}",
    tag = "webhooks",
    params(("id" = String, Path)),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not found"),
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    webhooks::delete_subscription(&state.ctx.pool, &id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

#[utoipa::path(
    post,
    path = "/v1/webhooks/{id}/activate",
    tag = "webhooks",
    params(("id" = String, Path)),
    responses(
        (status = 200, description = "Activated", body = WebhookSubscriptionResponse),
        (status = 404, description = "Not found"),
    )
)]
pub async fn activate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = set_active(&state.ctx.pool, &id, true).await?;
    Ok(Json(WebhookSubscriptionResponse::from(&subscription)))
}

#[utoipa::path(
    post,
    path = "/v1/webhooks/{id}/deactivate",
    tag = "webhooks",
    params(("id" = String, Path)),
    responses(
        (status = 200, description = "Deactivated", body = WebhookSubscriptionResponse),
        (status = 404, description = "Not found"),
    )
)]
pub async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = set_active(&state.ctx.pool, &id, false).await?;
    Ok(Json(WebhookSubscriptionResponse::from(&subscription)))
}

/// Fire an immediate, synchronous `webhook.test` delivery against the
/// subscription's URL, bypassing the usual queue/delay so the caller gets
/// a pass/fail answer in the response.
#[utoipa::path(
    post,
    path = "/v1/webhooks/{id}/test",
    tag = "webhooks",
    params(("id" = String, Path)),
    responses(
        (status = 200, description = "Test delivery attempted"),
        (status = 404, description = "Not found"),
    )
)]
pub async fn test(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = webhooks::subscriptions::get_subscription_or_404(&state.ctx.pool, &id).await?;
    let payload = serde_json::json!({ "subscription_id": subscription.id, "event": "webhook.test" });
    let delivery = create_delivery(&state.ctx.pool, &subscription.id, "webhook.test", &payload, 0).await?;
    let client = reqwest::Client::new();
    let delivered = dispatch_one(
        &state.ctx.pool,
        &client,
        &delivery,
        &subscription,
        state.ctx.settings.webhook_initial_delay_secs as i64,
    )
    .await?;
    Ok(Json(serde_json::json!({ "success": true, "delivered": delivered })))
}

#[utoipa::path(
    get,
    path = "/v1/webhooks/{id}/deliveries",
    tag = "webhooks",
    params(
        ("id" = String, Path),
        ("status" = Option<String>, Query),
        ("limit" = Option<i64>, Query),
    ),
    responses(
        (status = 200, description = "Delivery history", body = [WebhookDeliveryResponse]),
        (status = 404, description = "Not found"),
    )
)]
pub async fn deliveries(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ListDeliveriesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    webhooks::subscriptions::get_subscription_or_404(&state.ctx.pool, &id).await?;
    let limit = query.limit.unwrap_or(DEFAULT_DELIVERY_LIMIT);
    let rows = list_deliveries(&state.ctx.pool, &id, query.status.as_deref(), limit).await?;
    let body: Vec<WebhookDeliveryResponse> = rows.iter().map(WebhookDeliveryResponse::from).collect();
    Ok(Json(body))
}

#[utoipa::path(
    post,
    path = "/v1/webhooks/{id}/deliveries/{delivery_id}/replay",
    tag = "webhooks",
    params(("id" = String, Path), ("delivery_id" = String, Path)),
    responses(
        (status = 200, description = "Delivery requeued", body = WebhookDeliveryResponse),
        (status = 404, description = "Not found"),
    )
)]
pub async fn replay_delivery(
    State(state): State<AppState>,
    Path((id, delivery_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    webhooks::subscriptions::get_subscription_or_404(&state.ctx.pool, &id).await?;
    let delivery = replay(&state.ctx.pool, &delivery_id).await?;
    Ok(Json(WebhookDeliveryResponse::from(&delivery)))
}
