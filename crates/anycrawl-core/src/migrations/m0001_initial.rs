use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0001_initial_schema")
        .operation(
            CreateTable::new("api_keys")
                .add_field(Field::new("id", FieldType::Text).primary_key())
                .add_field(Field::new("credits", FieldType::BigInt).not_null().default("0"))
                .add_field(Field::new("last_used_at", FieldType::Text)),
        )
        .operation(
            CreateTable::new("jobs")
                .add_field(Field::new("id", FieldType::Text).primary_key())
                .add_field(Field::new("kind", FieldType::Text).not_null())
                .add_field(Field::new("queue_name", FieldType::Text).not_null())
                .add_field(Field::new("api_key_id", FieldType::Text).not_null())
                .add_field(Field::new("input_url", FieldType::Text).not_null())
                .add_field(Field::new("created_at", FieldType::Text).not_null())
                .add_field(Field::new("updated_at", FieldType::Text).not_null())
                .add_field(Field::new("status", FieldType::Text).not_null())
                .add_field(Field::new("total_count", FieldType::Integer).not_null().default("0"))
                .add_field(Field::new("completed_count", FieldType::Integer).not_null().default("0"))
                .add_field(Field::new("failed_count", FieldType::Integer).not_null().default("0"))
                .add_field(Field::new("credits_used", FieldType::BigInt).not_null().default("0"))
                .add_field(Field::new("deducted_at", FieldType::Text))
                .add_field(Field::new("cache_hits", FieldType::Integer).not_null().default("0"))
                .add_field(Field::new("result_blob", FieldType::Text))
                .add_field(Field::new("failure_message", FieldType::Text)),
        )
        .operation(
            CreateTable::new("billing_ledger")
                .add_field(Field::new("id", FieldType::Text).primary_key())
                .add_field(Field::new("idempotency_key", FieldType::Text).not_null().unique())
                .add_field(Field::new("job_id", FieldType::Text).not_null().references("jobs", "id"))
                .add_field(Field::new("api_key_id", FieldType::Text).not_null())
                .add_field(Field::new("mode", FieldType::Text).not_null())
                .add_field(Field::new("reason", FieldType::Text).not_null())
                .add_field(Field::new("charged", FieldType::BigInt).not_null())
                .add_field(Field::new("before_used", FieldType::BigInt).not_null())
                .add_field(Field::new("after_used", FieldType::BigInt).not_null())
                .add_field(Field::new("before_credits", FieldType::BigInt))
                .add_field(Field::new("after_credits", FieldType::BigInt))
                .add_field(Field::new("details_json", FieldType::Text).not_null())
                .add_field(Field::new("created_at", FieldType::Text).not_null()),
        )
        .operation(
            CreateTable::new("webhook_subscriptions")
                .add_field(Field::new("id", FieldType::Text).primary_key())
                .add_field(Field::new("owner_api_key_id", FieldType::Text))
                .add_field(Field::new("owner_user_id", FieldType::Text))
                .add_field(Field::new("url", FieldType::Text).not_null())
                .add_field(Field::new("secret", FieldType::Text).not_null())
                .add_field(Field::new("scope", FieldType::Text).not_null())
                .add_field(Field::new("event_types", FieldType::Text).not_null())
                .add_field(Field::new("specific_task_ids", FieldType::Text))
                .add_field(Field::new("custom_headers", FieldType::Text).not_null().default("'{}'"))
                .add_field(Field::new("timeout_ms", FieldType::Integer).not_null().default("30000"))
                .add_field(Field::new("max_retries", FieldType::Integer).not_null().default("5"))
                .add_field(Field::new("backoff_multiplier", FieldType::Double).not_null().default("2.0"))
                .add_field(Field::new("is_active", FieldType::Boolean).not_null().default("1"))
                .add_field(Field::new("consecutive_failures", FieldType::Integer).not_null().default("0"))
                .add_field(Field::new("tags", FieldType::Text).not_null().default("'[]'"))
                .add_field(Field::new("metadata", FieldType::Text).not_null().default("'{}'"))
                .add_field(Field::new("created_at", FieldType::Text).not_null())
                .add_field(Field::new("updated_at", FieldType::Text).not_null()),
        )
        .operation(
            CreateTable::new("webhook_deliveries")
                .add_field(Field::new("id", FieldType::Text).primary_key())
                .add_field(
                    Field::new("subscription_id", FieldType::Text)
                        .not_null()
                        .references("webhook_subscriptions", "id"),
                )
                .add_field(Field::new("event_type", FieldType::Text).not_null())
                .add_field(Field::new("payload", FieldType::Text).not_null())
                .add_field(Field::new("status", FieldType::Text).not_null())
                .add_field(Field::new("attempt_number", FieldType::Integer).not_null().default("0"))
                .add_field(Field::new("next_retry_at", FieldType::Text))
                .add_field(Field::new("error_message", FieldType::Text))
                .add_field(Field::new("created_at", FieldType::Text).not_null())
                .add_field(Field::new("updated_at", FieldType::Text).not_null()),
        )
        .operation(
            CreateTable::new("scheduled_tasks")
                .add_field(Field::new("id", FieldType::Text).primary_key())
                .add_field(Field::new("job_id", FieldType::Text).not_null().references("jobs", "id"))
                .add_field(Field::new("kind", FieldType::Text).not_null())
                .add_field(Field::new("total_executions", FieldType::Integer).not_null().default("0"))
                .add_field(Field::new("failed_executions", FieldType::Integer).not_null().default("0"))
                .add_field(Field::new("created_at", FieldType::Text).not_null())
                .add_field(Field::new("updated_at", FieldType::Text).not_null()),
        )
        .operation(
            CreateTable::new("task_executions")
                .add_field(Field::new("id", FieldType::Text).primary_key())
                .add_field(
                    Field::new("scheduled_task_id", FieldType::Text)
                        .not_null()
                        .references("scheduled_tasks", "id"),
                )
                .add_field(Field::new("job_id", FieldType::Text).not_null())
                .add_field(Field::new("status", FieldType::Text).not_null())
                .add_field(Field::new("started_at", FieldType::Text).not_null())
                .add_field(Field::new("finished_at", FieldType::Text))
                .add_field(Field::new("reason", FieldType::Text)),
        )
        .operation(
            CreateTable::new("queue_messages")
                .add_field(Field::new("id", FieldType::Text).primary_key())
                .add_field(Field::new("queue_name", FieldType::Text).not_null())
                .add_field(Field::new("job_id", FieldType::Text).not_null())
                .add_field(Field::new("payload", FieldType::Text).not_null())
                .add_field(Field::new("status", FieldType::Text).not_null())
                .add_field(Field::new("leased_until", FieldType::Text))
                .add_field(Field::new("visible_at", FieldType::Text).not_null())
                .add_field(Field::new("created_at", FieldType::Text).not_null()),
        )
        .operation(
            RunSql::portable().for_backend(
                "sqlite",
                "CREATE INDEX idx_queue_messages_lookup ON queue_messages (queue_name, status, visible_at)",
            ).for_backend(
                "postgres",
                "CREATE INDEX idx_queue_messages_lookup ON queue_messages (queue_name, status, visible_at)",
            ),
        )
}
