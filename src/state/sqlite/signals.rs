use super::*;

use crate::traits::{Goal, HealthEntry, MoodEntry, SignalStore, UserMessage, Workout};

fn row_to_health(row: &sqlx::sqlite::SqliteRow) -> HealthEntry {
    let workouts_json: String = row.get("workouts_json");
    HealthEntry {
        id: row.get("id"),
        sleep_hours: row.get("sleep_hours"),
        steps: row.get("steps"),
        active_minutes: row.get("active_minutes"),
        workouts: serde_json::from_str::<Vec<Workout>>(&workouts_json).unwrap_or_default(),
        created_at: parse_dt(&row.get::<String, _>("created_at")),
    }
}

fn row_to_goal(row: &sqlx::sqlite::SqliteRow) -> Goal {
    Goal {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        status: row.get("status"),
        progress: row.get("progress"),
        created_at: parse_dt(&row.get::<String, _>("created_at")),
        updated_at: parse_dt(&row.get::<String, _>("updated_at")),
    }
}

#[async_trait]
impl SignalStore for SqliteHistoryStore {
    async fn get_health_since(&self, days: u32) -> anyhow::Result<Vec<HealthEntry>> {
        let rows = sqlx::query(
            "SELECT id, sleep_hours, steps, active_minutes, workouts_json, created_at
             FROM health_entries WHERE created_at >= ?
             ORDER BY created_at DESC",
        )
        .bind(cutoff_rfc3339(days))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_health).collect())
    }

    async fn save_health(&self, entry: &HealthEntry) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO health_entries
                (id, sleep_hours, steps, active_minutes, workouts_json, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(entry.sleep_hours)
        .bind(entry.steps)
        .bind(entry.active_minutes)
        .bind(serde_json::to_string(&entry.workouts)?)
        .bind(entry.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_mood_since(&self, days: u32) -> anyhow::Result<Vec<MoodEntry>> {
        let rows = sqlx::query(
            "SELECT id, mood, energy, notes, created_at
             FROM mood_entries WHERE created_at >= ?
             ORDER BY created_at DESC",
        )
        .bind(cutoff_rfc3339(days))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| MoodEntry {
                id: r.get("id"),
                mood: r.get("mood"),
                energy: r.get("energy"),
                notes: r.get("notes"),
                created_at: parse_dt(&r.get::<String, _>("created_at")),
            })
            .collect())
    }

    async fn save_mood(&self, entry: &MoodEntry) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO mood_entries (id, mood, energy, notes, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(entry.mood)
        .bind(entry.energy)
        .bind(&entry.notes)
        .bind(entry.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_stale_goals(&self, days_stale: u32) -> anyhow::Result<Vec<Goal>> {
        let rows = sqlx::query(
            "SELECT id, title, description, status, progress, created_at, updated_at
             FROM goals WHERE status = 'active' AND updated_at < ?
             ORDER BY updated_at ASC",
        )
        .bind(cutoff_rfc3339(days_stale))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_goal).collect())
    }

    async fn save_goal(&self, goal: &Goal) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO goals (id, title, description, status, progress, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                status = excluded.status,
                progress = excluded.progress,
                updated_at = excluded.updated_at",
        )
        .bind(&goal.id)
        .bind(&goal.title)
        .bind(&goal.description)
        .bind(&goal.status)
        .bind(goal.progress)
        .bind(goal.created_at.to_rfc3339())
        .bind(goal.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_last_user_message(&self) -> anyhow::Result<Option<UserMessage>> {
        let row = sqlx::query(
            "SELECT id, content, created_at FROM user_messages
             ORDER BY created_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| UserMessage {
            id: r.get("id"),
            content: r.get("content"),
            created_at: parse_dt(&r.get::<String, _>("created_at")),
        }))
    }

    async fn save_user_message(&self, content: &str) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO user_messages (id, content, created_at) VALUES (?, ?, ?)")
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(content)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_screen_time_minutes(&self, category: &str, days: u32) -> anyhow::Result<i64> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(minutes), 0) AS total FROM screen_time
             WHERE category = ? AND created_at >= ?",
        )
        .bind(category)
        .bind(cutoff_rfc3339(days))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("total"))
    }

    async fn save_screen_time(
        &self,
        date: &str,
        category: &str,
        minutes: i64,
        app: Option<&str>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO screen_time (date, category, minutes, app, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(date)
        .bind(category)
        .bind(minutes)
        .bind(app)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_location(&self, lat: f64, lng: f64, name: Option<&str>) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO locations (lat, lng, name, created_at) VALUES (?, ?, ?, ?)")
            .bind(lat)
            .bind(lng)
            .bind(name)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
