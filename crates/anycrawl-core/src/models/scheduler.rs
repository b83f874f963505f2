//! Scheduled task / execution models backing the reaper (C5).

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{scheduled_tasks, task_executions};

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = scheduled_tasks)]
pub struct ScheduledTask {
    pub id: String,
    pub job_id: String,
    pub kind: String,
    pub total_executions: i32,
    pub failed_executions: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = scheduled_tasks)]
pub struct NewScheduledTask {
    pub id: String,
    pub job_id: String,
    pub kind: String,
    pub total_executions: i32,
    pub failed_executions: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = task_executions)]
pub struct TaskExecution {
    pub id: String,
    pub scheduled_task_id: String,
    pub job_id: String,
    pub status: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_executions)]
pub struct NewTaskExecution {
    pub id: String,
    pub scheduled_task_id: String,
    pub job_id: String,
    pub status: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub reason: Option<String>,
}
