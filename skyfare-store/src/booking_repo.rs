use chrono::{DateTime, Utc};
use skyfare_core::{Booking, BookingStatus};
use sqlx::sqlite::SqliteConnection;
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    pnr: Option<String>,
    user_id: Uuid,
    flight_id: Uuid,
    seat_no: String,
    passenger_name: Option<String>,
    passenger_email: Option<String>,
    final_price: f64,
    status: String,
    booking_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, sqlx::Error> {
        let status: BookingStatus = self
            .status
            .parse()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(Booking {
            id: self.id,
            pnr: self.pnr,
            user_id: self.user_id,
            flight_id: self.flight_id,
            seat_no: self.seat_no,
            passenger_name: self.passenger_name,
            passenger_email: self.passenger_email,
            final_price: self.final_price,
            status,
            booking_date: self.booking_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, pnr, user_id, flight_id, seat_no, passenger_name, \
     passenger_email, final_price, status, booking_date, created_at, updated_at";

const HOLDING_STATUSES: &str = "'PENDING', 'INFO_ADDED', 'CONFIRMED'";

pub struct BookingRepo;

impl BookingRepo {
    /// Insert a fresh PENDING booking. The partial unique index on
    /// (flight_id, seat_no) turns a seat race into a UniqueViolation here.
    pub async fn insert(conn: &mut SqliteConnection, booking: &Booking) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO bookings (id, pnr, user_id, flight_id, seat_no, passenger_name, \
             passenger_email, final_price, status, booking_date, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(booking.id)
        .bind(&booking.pnr)
        .bind(booking.user_id)
        .bind(booking.flight_id)
        .bind(&booking.seat_no)
        .bind(&booking.passenger_name)
        .bind(&booking.passenger_email)
        .bind(booking.final_price)
        .bind(booking.status.as_str())
        .bind(booking.booking_date)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Fetch a booking only if it belongs to `user_id`. Not-owned and
    /// absent are deliberately indistinguishable.
    pub async fn find_owned(
        conn: &mut SqliteConnection,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
        row.map(BookingRow::into_booking).transpose()
    }

    /// Public PNR lookup, no ownership check.
    pub async fn find_by_pnr(
        pool: &SqlitePool,
        pnr: &str,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE pnr = ?"
        ))
        .bind(pnr)
        .fetch_optional(pool)
        .await?;
        row.map(BookingRow::into_booking).transpose()
    }

    pub async fn list_for_user(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = ? ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    /// The user's still-open booking on a flight, if any. There is at most
    /// one: a new selection supersedes it.
    pub async fn find_open_for_user_flight(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        flight_id: Uuid,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = ? AND flight_id = ? \
             AND status IN ('PENDING', 'INFO_ADDED')"
        ))
        .bind(user_id)
        .bind(flight_id)
        .fetch_optional(conn)
        .await?;
        row.map(BookingRow::into_booking).transpose()
    }

    pub async fn is_seat_taken(
        conn: &mut SqliteConnection,
        flight_id: Uuid,
        seat_no: &str,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM bookings WHERE flight_id = ? AND seat_no = ? \
             AND status IN ({HOLDING_STATUSES})"
        ))
        .bind(flight_id)
        .bind(seat_no)
        .fetch_one(conn)
        .await?;
        Ok(count > 0)
    }

    /// Seat labels currently held on a flight.
    pub async fn held_seats(
        pool: &SqlitePool,
        flight_id: Uuid,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(&format!(
            "SELECT seat_no FROM bookings WHERE flight_id = ? AND status IN ({HOLDING_STATUSES})"
        ))
        .bind(flight_id)
        .fetch_all(pool)
        .await
    }

    pub async fn set_status(
        conn: &mut SqliteConnection,
        id: Uuid,
        status: BookingStatus,
        now: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE bookings SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn set_passenger_info(
        conn: &mut SqliteConnection,
        id: Uuid,
        name: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE bookings SET passenger_name = ?, passenger_email = ?, status = ?, \
             updated_at = ? WHERE id = ?",
        )
        .bind(name)
        .bind(email)
        .bind(BookingStatus::InfoAdded.as_str())
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Confirmation: PNR, status and booking_date move together. The unique
    /// index on pnr is the final arbiter of code uniqueness.
    pub async fn confirm(
        conn: &mut SqliteConnection,
        id: Uuid,
        pnr: &str,
        now: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE bookings SET pnr = ?, status = ?, booking_date = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(pnr)
        .bind(BookingStatus::Confirmed.as_str())
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn pnr_exists(conn: &mut SqliteConnection, pnr: &str) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE pnr = ?")
            .bind(pnr)
            .fetch_one(conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn exists_for_flight(
        conn: &mut SqliteConnection,
        flight_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE flight_id = ?")
            .bind(flight_id)
            .fetch_one(conn)
            .await?;
        Ok(count > 0)
    }

    /// Seat-holding bookings on a flight; the availability invariant checks
    /// against this count.
    pub async fn count_holding_for_flight(
        pool: &SqlitePool,
        flight_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM bookings WHERE flight_id = ? AND status IN ({HOLDING_STATUSES})"
        ))
        .bind(flight_id)
        .fetch_one(pool)
        .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(pool)
            .await
    }

    pub async fn count_with_status(
        pool: &SqlitePool,
        statuses: &[BookingStatus],
    ) -> Result<i64, sqlx::Error> {
        let placeholders = vec!["?"; statuses.len()].join(", ");
        let sql = format!("SELECT COUNT(*) FROM bookings WHERE status IN ({placeholders})");
        let mut query = sqlx::query_scalar(&sql);
        for status in statuses {
            query = query.bind(status.as_str());
        }
        query.fetch_one(pool).await
    }

    /// Sum of confirmed fares.
    pub async fn confirmed_revenue(pool: &SqlitePool) -> Result<f64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(final_price), 0.0) FROM bookings WHERE status = 'CONFIRMED'",
        )
        .fetch_one(pool)
        .await
    }
}
