// src/db/process_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::process::{
        Comment, FlowStep, HistoryEvent, HistoryEventType, Process, ProcessFilter,
        ProcessPriority, ProcessStatus,
    },
};

#[derive(Clone)]
pub struct ProcessRepository {
    pool: PgPool,
}

pub struct NewProcess<'a> {
    pub name: &'a str,
    pub service_name: Option<&'a str>,
    pub company_name: Option<&'a str>,
    pub contact_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub company_id: Option<i32>,
    pub priority: ProcessPriority,
    pub department_flow: &'a [i32],
    pub description: Option<&'a str>,
    pub creator_notes: Option<&'a str>,
    pub independent_departments: bool,
    pub created_by_id: i32,
    pub delivery_date: Option<DateTime<Utc>>,
    pub progress: i32,
}

impl ProcessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  PROCESSES
    // =========================================================================

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Process>, AppError> {
        let process = sqlx::query_as::<_, Process>("SELECT * FROM processes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(process)
    }

    /// Releitura dentro da transação com FOR UPDATE: avanços concorrentes no
    /// mesmo processo serializam aqui; o perdedor enxerga o índice já movido.
    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        id: i32,
    ) -> Result<Option<Process>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let process =
            sqlx::query_as::<_, Process>("SELECT * FROM processes WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(executor)
                .await?;
        Ok(process)
    }

    pub async fn list(&self, filter: &ProcessFilter) -> Result<Vec<Process>, AppError> {
        let processes = sqlx::query_as::<_, Process>(
            "SELECT * FROM processes
             WHERE ($1::process_status IS NULL OR status = $1)
               AND ($2::int IS NULL OR current_department = $2)
               AND ($3::int IS NULL OR company_id = $3)
             ORDER BY created_at DESC",
        )
        .bind(filter.status)
        .bind(filter.department_id)
        .bind(filter.company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(processes)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        new: NewProcess<'_>,
    ) -> Result<Process, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // O primeiro departamento do fluxo é a posição inicial.
        let process = sqlx::query_as::<_, Process>(
            "INSERT INTO processes (
                name, service_name, company_name, contact_name, email, phone,
                company_id, priority, current_department, current_department_index,
                department_flow, progress, description, creator_notes,
                independent_departments, created_by_id, delivery_date
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, $10, $11, $12, $13, $14, $15, $16)
             RETURNING *",
        )
        .bind(new.name)
        .bind(new.service_name)
        .bind(new.company_name)
        .bind(new.contact_name)
        .bind(new.email)
        .bind(new.phone)
        .bind(new.company_id)
        .bind(new.priority)
        .bind(new.department_flow[0])
        .bind(new.department_flow)
        .bind(new.progress)
        .bind(new.description)
        .bind(new.creator_notes)
        .bind(new.independent_departments)
        .bind(new.created_by_id)
        .bind(new.delivery_date)
        .fetch_one(executor)
        .await?;
        Ok(process)
    }

    pub async fn advance_position<'e, E>(
        &self,
        executor: E,
        id: i32,
        next_department: i32,
        next_index: i32,
        progress: i32,
    ) -> Result<Process, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let process = sqlx::query_as::<_, Process>(
            "UPDATE processes SET
                current_department = $2,
                current_department_index = $3,
                progress = $4,
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(next_department)
        .bind(next_index)
        .bind(progress)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Processo".to_string()))?;
        Ok(process)
    }

    pub async fn finalize<'e, E>(&self, executor: E, id: i32) -> Result<Process, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let process = sqlx::query_as::<_, Process>(
            "UPDATE processes SET
                status = 'FINALIZED',
                progress = 100,
                finalized_at = NOW(),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Processo".to_string()))?;
        Ok(process)
    }

    pub async fn set_interlinked<'e, E>(
        &self,
        executor: E,
        id: i32,
        successor_id: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE processes SET interlinked_process_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(successor_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    // =========================================================================
    //  FLOW STEPS (HistoricoFluxo)
    // =========================================================================

    pub async fn open_flow_step<'e, E>(
        &self,
        executor: E,
        process_id: i32,
        department_id: i32,
        position: i32,
    ) -> Result<FlowStep, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let step = sqlx::query_as::<_, FlowStep>(
            "INSERT INTO flow_steps (process_id, department_id, position, status)
             VALUES ($1, $2, $3, 'IN_PROGRESS')
             RETURNING *",
        )
        .bind(process_id)
        .bind(department_id)
        .bind(position)
        .fetch_one(executor)
        .await?;
        Ok(step)
    }

    /// Fecha o step ativo do processo. Deve haver no máximo um.
    pub async fn close_active_flow_step<'e, E>(
        &self,
        executor: E,
        process_id: i32,
    ) -> Result<Option<FlowStep>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let step = sqlx::query_as::<_, FlowStep>(
            "UPDATE flow_steps SET status = 'COMPLETED', exited_at = NOW()
             WHERE id = (
                SELECT id FROM flow_steps
                WHERE process_id = $1 AND status = 'IN_PROGRESS'
                ORDER BY position DESC LIMIT 1
             )
             RETURNING *",
        )
        .bind(process_id)
        .fetch_optional(executor)
        .await?;
        Ok(step)
    }

    pub async fn list_flow_steps(&self, process_id: i32) -> Result<Vec<FlowStep>, AppError> {
        let steps = sqlx::query_as::<_, FlowStep>(
            "SELECT * FROM flow_steps WHERE process_id = $1 ORDER BY position",
        )
        .bind(process_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(steps)
    }

    // =========================================================================
    //  HISTORY EVENTS (append-only)
    // =========================================================================

    pub async fn append_event<'e, E>(
        &self,
        executor: E,
        process_id: i32,
        event_type: HistoryEventType,
        action: &str,
        department_name: Option<&str>,
        actor_id: i32,
    ) -> Result<HistoryEvent, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let event = sqlx::query_as::<_, HistoryEvent>(
            "INSERT INTO history_events
                (process_id, event_type, action, department_name, actor_id, timestamp_ms)
             VALUES ($1, $2, $3, $4, $5, (EXTRACT(EPOCH FROM NOW()) * 1000)::bigint)
             RETURNING *",
        )
        .bind(process_id)
        .bind(event_type)
        .bind(action)
        .bind(department_name)
        .bind(actor_id)
        .fetch_one(executor)
        .await?;
        Ok(event)
    }

    pub async fn list_events(&self, process_id: i32) -> Result<Vec<HistoryEvent>, AppError> {
        let events = sqlx::query_as::<_, HistoryEvent>(
            "SELECT * FROM history_events WHERE process_id = $1 ORDER BY occurred_at, id",
        )
        .bind(process_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    // =========================================================================
    //  COMMENTS
    // =========================================================================

    pub async fn create_comment<'e, E>(
        &self,
        executor: E,
        process_id: i32,
        author_id: i32,
        content: &str,
    ) -> Result<Comment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let comment = sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (process_id, author_id, content)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(process_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(executor)
        .await?;
        Ok(comment)
    }

    pub async fn find_comment(&self, id: i32) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    pub async fn delete_comment<'e, E>(&self, executor: E, id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // =========================================================================
    //  TAGS aplicadas
    // =========================================================================

    pub async fn apply_tag<'e, E>(
        &self,
        executor: E,
        process_id: i32,
        tag_id: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO process_tags (process_id, tag_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(process_id)
        .bind(tag_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn remove_tag<'e, E>(
        &self,
        executor: E,
        process_id: i32,
        tag_id: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM process_tags WHERE process_id = $1 AND tag_id = $2")
            .bind(process_id)
            .bind(tag_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM processes WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
