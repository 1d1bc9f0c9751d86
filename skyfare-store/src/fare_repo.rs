use chrono::{DateTime, Utc};
use skyfare_core::FareSnapshot;
use sqlx::sqlite::SqliteConnection;
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct FareRow {
    id: i64,
    flight_id: Uuid,
    price: f64,
    demand_factor: f64,
    available_seats: i64,
    recorded_at: DateTime<Utc>,
}

impl From<FareRow> for FareSnapshot {
    fn from(row: FareRow) -> Self {
        FareSnapshot {
            id: row.id,
            flight_id: row.flight_id,
            price: row.price,
            demand_factor: row.demand_factor,
            available_seats: row.available_seats,
            recorded_at: row.recorded_at,
        }
    }
}

/// Append-only price log. Inserts and reads only.
pub struct FareHistoryRepo;

impl FareHistoryRepo {
    pub async fn append(
        conn: &mut SqliteConnection,
        flight_id: Uuid,
        price: f64,
        demand_factor: f64,
        available_seats: i64,
        recorded_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO fare_history (flight_id, price, demand_factor, available_seats, \
             recorded_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(flight_id)
        .bind(price)
        .bind(demand_factor)
        .bind(available_seats)
        .bind(recorded_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Most recent snapshots, newest first.
    pub async fn recent(
        pool: &SqlitePool,
        flight_id: Uuid,
        limit: i64,
    ) -> Result<Vec<FareSnapshot>, sqlx::Error> {
        let rows = sqlx::query_as::<_, FareRow>(
            "SELECT id, flight_id, price, demand_factor, available_seats, recorded_at \
             FROM fare_history WHERE flight_id = ? ORDER BY recorded_at DESC, id DESC LIMIT ?",
        )
        .bind(flight_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(FareSnapshot::from).collect())
    }
}
