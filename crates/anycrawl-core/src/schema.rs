// Diesel schema definitions, hand-maintained to match the migrations under
// `migrations/` (see m0001_initial.rs). Kept in sync manually rather than
// regenerated, the same convention the teacher uses.

diesel::table! {
    api_keys (id) {
        id -> Text,
        credits -> BigInt,
        last_used_at -> Nullable<Text>,
    }
}

diesel::table! {
    jobs (id) {
        id -> Text,
        kind -> Text,
        queue_name -> Text,
        api_key_id -> Text,
        input_url -> Text,
        created_at -> Text,
        updated_at -> Text,
        status -> Text,
        total_count -> Integer,
        completed_count -> Integer,
        failed_count -> Integer,
        credits_used -> BigInt,
        deducted_at -> Nullable<Text>,
        cache_hits -> Integer,
        result_blob -> Nullable<Text>,
        failure_message -> Nullable<Text>,
    }
}

diesel::table! {
    billing_ledger (id) {
        id -> Text,
        idempotency_key -> Text,
        job_id -> Text,
        api_key_id -> Text,
        mode -> Text,
        reason -> Text,
        charged -> BigInt,
        before_used -> BigInt,
        after_used -> BigInt,
        before_credits -> Nullable<BigInt>,
        after_credits -> Nullable<BigInt>,
        details_json -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    webhook_subscriptions (id) {
        id -> Text,
        owner_api_key_id -> Nullable<Text>,
        owner_user_id -> Nullable<Text>,
        url -> Text,
        secret -> Text,
        scope -> Text,
        event_types -> Text,
        specific_task_ids -> Nullable<Text>,
        custom_headers -> Text,
        timeout_ms -> Integer,
        max_retries -> Integer,
        backoff_multiplier -> Double,
        is_active -> Bool,
        consecutive_failures -> Integer,
        tags -> Text,
        metadata -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    webhook_deliveries (id) {
        id -> Text,
        subscription_id -> Text,
        event_type -> Text,
        payload -> Text,
        status -> Text,
        attempt_number -> Integer,
        next_retry_at -> Nullable<Text>,
        error_message -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    scheduled_tasks (id) {
        id -> Text,
        job_id -> Text,
        kind -> Text,
        total_executions -> Integer,
        failed_executions -> Integer,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    task_executions (id) {
        id -> Text,
        scheduled_task_id -> Text,
        job_id -> Text,
        status -> Text,
        started_at -> Text,
        finished_at -> Nullable<Text>,
        reason -> Nullable<Text>,
    }
}

diesel::table! {
    queue_messages (id) {
        id -> Text,
        queue_name -> Text,
        job_id -> Text,
        payload -> Text,
        status -> Text,
        leased_until -> Nullable<Text>,
        visible_at -> Text,
        created_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    api_keys,
    jobs,
    billing_ledger,
    webhook_subscriptions,
    webhook_deliveries,
    scheduled_tasks,
    task_executions,
    queue_messages,
);
