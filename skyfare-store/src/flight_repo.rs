use chrono::{DateTime, NaiveDate, Utc};
use skyfare_core::Flight;
use sqlx::sqlite::SqliteConnection;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    flight_number: String,
    airline: String,
    source: String,
    destination: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    base_price: f64,
    total_seats: i64,
    available_seats: i64,
    demand_factor: f64,
}

impl From<FlightRow> for Flight {
    fn from(row: FlightRow) -> Self {
        Flight {
            id: row.id,
            flight_number: row.flight_number,
            airline: row.airline,
            source: row.source,
            destination: row.destination,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            base_price: row.base_price,
            total_seats: row.total_seats,
            available_seats: row.available_seats,
            demand_factor: row.demand_factor,
        }
    }
}

const FLIGHT_COLUMNS: &str = "id, flight_number, airline, source, destination, departure_time, \
     arrival_time, base_price, total_seats, available_seats, demand_factor";

/// Optional filters for the public flight search.
#[derive(Debug, Default, Clone)]
pub struct FlightSearch {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

pub struct FlightRepo;

impl FlightRepo {
    pub async fn insert(conn: &mut SqliteConnection, flight: &Flight) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO flights (id, flight_number, airline, source, destination, \
             departure_time, arrival_time, base_price, total_seats, available_seats, demand_factor) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(flight.id)
        .bind(&flight.flight_number)
        .bind(&flight.airline)
        .bind(&flight.source)
        .bind(&flight.destination)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.base_price)
        .bind(flight.total_seats)
        .bind(flight.available_seats)
        .bind(flight.demand_factor)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn get(
        conn: &mut SqliteConnection,
        id: Uuid,
    ) -> Result<Option<Flight>, sqlx::Error> {
        let row = sqlx::query_as::<_, FlightRow>(&format!(
            "SELECT {FLIGHT_COLUMNS} FROM flights WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(row.map(Flight::from))
    }

    /// Public search: future departures with seats left, filters optional,
    /// ordered by departure time.
    pub async fn search(
        pool: &SqlitePool,
        filters: &FlightSearch,
        now: DateTime<Utc>,
    ) -> Result<Vec<Flight>, sqlx::Error> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {FLIGHT_COLUMNS} FROM flights WHERE departure_time > "
        ));
        qb.push_bind(now);
        qb.push(" AND available_seats > 0");

        if let Some(source) = &filters.source {
            qb.push(" AND source LIKE ").push_bind(format!("%{source}%"));
        }
        if let Some(destination) = &filters.destination {
            qb.push(" AND destination LIKE ")
                .push_bind(format!("%{destination}%"));
        }
        if let Some(date) = filters.departure_date {
            let day_start = date.and_hms_opt(0, 0, 0).expect("midnight").and_utc();
            let day_end = day_start + chrono::Duration::days(1);
            qb.push(" AND departure_time >= ").push_bind(day_start);
            qb.push(" AND departure_time < ").push_bind(day_end);
        }
        if let Some(min_price) = filters.min_price {
            qb.push(" AND base_price >= ").push_bind(min_price);
        }
        if let Some(max_price) = filters.max_price {
            qb.push(" AND base_price <= ").push_bind(max_price);
        }

        qb.push(" ORDER BY departure_time");

        let rows = qb.build_query_as::<FlightRow>().fetch_all(pool).await?;
        Ok(rows.into_iter().map(Flight::from).collect())
    }

    /// All flights, admin view, latest departures first.
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Flight>, sqlx::Error> {
        let rows = sqlx::query_as::<_, FlightRow>(&format!(
            "SELECT {FLIGHT_COLUMNS} FROM flights ORDER BY departure_time DESC"
        ))
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(Flight::from).collect())
    }

    /// Flights the demand simulator still cares about.
    pub async fn departing_after(
        pool: &SqlitePool,
        now: DateTime<Utc>,
    ) -> Result<Vec<Flight>, sqlx::Error> {
        let rows = sqlx::query_as::<_, FlightRow>(&format!(
            "SELECT {FLIGHT_COLUMNS} FROM flights WHERE departure_time > ? ORDER BY departure_time"
        ))
        .bind(now)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(Flight::from).collect())
    }

    /// Move the inventory counter. Callers hold a transaction; the schema
    /// CHECK keeps the counter inside [0, total_seats].
    pub async fn adjust_available_seats(
        conn: &mut SqliteConnection,
        id: Uuid,
        delta: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE flights SET available_seats = available_seats + ? WHERE id = ?")
            .bind(delta)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn set_demand_factor(
        conn: &mut SqliteConnection,
        id: Uuid,
        demand_factor: f64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE flights SET demand_factor = ? WHERE id = ?")
            .bind(demand_factor)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Admin update of schedule and pricing fields.
    pub async fn update(conn: &mut SqliteConnection, flight: &Flight) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE flights SET airline = ?, source = ?, destination = ?, departure_time = ?, \
             arrival_time = ?, base_price = ?, total_seats = ?, available_seats = ?, \
             demand_factor = ? WHERE id = ?",
        )
        .bind(&flight.airline)
        .bind(&flight.source)
        .bind(&flight.destination)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.base_price)
        .bind(flight.total_seats)
        .bind(flight.available_seats)
        .bind(flight.demand_factor)
        .bind(flight.id)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn delete(conn: &mut SqliteConnection, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM flights WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn flight_number_exists(
        pool: &SqlitePool,
        flight_number: &str,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM flights WHERE flight_number = ?")
                .bind(flight_number)
                .fetch_one(pool)
                .await?;
        Ok(count > 0)
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM flights")
            .fetch_one(pool)
            .await
    }
}
