use super::*;

use crate::traits::{TriggerFireRecord, TriggerLogStore};
use crate::types::DeliveryMethod;

fn row_to_fire(row: &sqlx::sqlite::SqliteRow) -> TriggerFireRecord {
    let context_json: String = row.get("context_json");
    let method: String = row.get("delivery_method");
    TriggerFireRecord {
        id: row.get("id"),
        trigger_id: row.get("trigger_id"),
        fired_at: parse_dt(&row.get::<String, _>("fired_at")),
        context: serde_json::from_str(&context_json).unwrap_or(serde_json::Value::Null),
        message_sent: row.get("message_sent"),
        delivery_method: DeliveryMethod::parse(&method),
        delivered: row.get::<i64, _>("delivered") != 0,
        user_responded: row
            .get::<Option<i64>, _>("user_responded")
            .map(|v| v != 0),
    }
}

#[async_trait]
impl TriggerLogStore for SqliteHistoryStore {
    async fn get_last_fire(
        &self,
        trigger_id: &str,
    ) -> anyhow::Result<Option<TriggerFireRecord>> {
        let row = sqlx::query(
            "SELECT id, trigger_id, fired_at, context_json, message_sent,
                    delivery_method, delivered, user_responded
             FROM trigger_fires WHERE trigger_id = ?
             ORDER BY fired_at DESC LIMIT 1",
        )
        .bind(trigger_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| row_to_fire(&r)))
    }

    async fn append_fire(&self, record: &TriggerFireRecord) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO trigger_fires
                (id, trigger_id, fired_at, context_json, message_sent,
                 delivery_method, delivered, user_responded)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.trigger_id)
        .bind(record.fired_at.to_rfc3339())
        .bind(serde_json::to_string(&record.context)?)
        .bind(&record.message_sent)
        .bind(record.delivery_method.as_str())
        .bind(record.delivered as i64)
        .bind(record.user_responded.map(|v| v as i64))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_user_responded(&self, fire_id: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE trigger_fires SET user_responded = 1 WHERE id = ?")
            .bind(fire_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
