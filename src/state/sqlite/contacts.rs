use super::*;

use crate::traits::{ContactStore, DeviceToken, KnownLocation, VipContact};

#[async_trait]
impl ContactStore for SqliteHistoryStore {
    async fn get_known_locations(&self) -> anyhow::Result<Vec<KnownLocation>> {
        let rows = sqlx::query(
            "SELECT id, name, lat, lng, radius_meters FROM known_locations ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| KnownLocation {
                id: r.get("id"),
                name: r.get("name"),
                lat: r.get("lat"),
                lng: r.get("lng"),
                radius_meters: r.get("radius_meters"),
            })
            .collect())
    }

    async fn upsert_known_location(
        &self,
        name: &str,
        lat: f64,
        lng: f64,
        radius_meters: f64,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO known_locations (name, lat, lng, radius_meters)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET
                lat = excluded.lat,
                lng = excluded.lng,
                radius_meters = excluded.radius_meters",
        )
        .bind(name)
        .bind(lat)
        .bind(lng)
        .bind(radius_meters)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn lookup_vip_by_email(&self, email: &str) -> anyhow::Result<Option<VipContact>> {
        let row = sqlx::query(
            "SELECT id, name, email, relationship FROM vip_contacts
             WHERE email = ? COLLATE NOCASE",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| VipContact {
            id: r.get("id"),
            name: r.get("name"),
            email: r.get("email"),
            relationship: r.get("relationship"),
        }))
    }

    async fn upsert_vip(
        &self,
        name: &str,
        email: &str,
        relationship: Option<&str>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO vip_contacts (name, email, relationship)
             VALUES (?, ?, ?)
             ON CONFLICT(email) DO UPDATE SET
                name = excluded.name,
                relationship = excluded.relationship",
        )
        .bind(name)
        .bind(email)
        .bind(relationship)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_device_tokens(&self) -> anyhow::Result<Vec<DeviceToken>> {
        let rows = sqlx::query(
            "SELECT id, token, platform, created_at FROM device_tokens ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| DeviceToken {
                id: r.get("id"),
                token: r.get("token"),
                platform: r.get("platform"),
                created_at: parse_dt(&r.get::<String, _>("created_at")),
            })
            .collect())
    }

    async fn register_device(&self, token: &str, platform: &str) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO device_tokens (token, platform, created_at)
             VALUES (?, ?, ?)
             ON CONFLICT(token) DO UPDATE SET platform = excluded.platform",
        )
        .bind(token)
        .bind(platform)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
