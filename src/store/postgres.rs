use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{
    DecisionOutcome, NewParcel, NewPayment, NewRiderApplication, ParcelFilter, PaymentOutcome,
    RiderAssignment, Store, StoreError,
};
use crate::models::parcel::Parcel;
use crate::models::payment::Payment;
use crate::models::rider::{ApplicationStatus, RiderApplication};
use crate::models::user::{Role, User};

const USER_COLUMNS: &str = "id, email, role, created_at, last_login_at";
const PARCEL_COLUMNS: &str = "id, title, created_by, receiver_name, receiver_address, cost, \
     payment_status, delivery_status, rider_id, rider_name, rider_email, assigned_at, created_at";
const PAYMENT_COLUMNS: &str = "id, parcel_id, payer_email, amount, method, transaction_id, paid_at";
const RIDER_COLUMNS: &str = "id, name, applicant_email, phone, district, region, status, created_at";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
    last_login_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, StoreError> {
        Ok(User {
            id: self.id,
            email: self.email,
            role: self.role.parse().map_err(StoreError::decode)?,
            created_at: self.created_at,
            last_login_at: self.last_login_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UpsertedUserRow {
    id: i64,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
    last_login_at: DateTime<Utc>,
    inserted: bool,
}

#[derive(sqlx::FromRow)]
struct ParcelRow {
    id: i64,
    title: String,
    created_by: String,
    receiver_name: String,
    receiver_address: String,
    cost: i64,
    payment_status: String,
    delivery_status: String,
    rider_id: Option<i64>,
    rider_name: Option<String>,
    rider_email: Option<String>,
    assigned_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl ParcelRow {
    fn into_parcel(self) -> Result<Parcel, StoreError> {
        Ok(Parcel {
            id: self.id,
            title: self.title,
            created_by: self.created_by,
            receiver_name: self.receiver_name,
            receiver_address: self.receiver_address,
            cost: self.cost,
            payment_status: self.payment_status.parse().map_err(StoreError::decode)?,
            delivery_status: self.delivery_status.parse().map_err(StoreError::decode)?,
            rider_id: self.rider_id,
            rider_name: self.rider_name,
            rider_email: self.rider_email,
            assigned_at: self.assigned_at,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    parcel_id: i64,
    payer_email: String,
    amount: i64,
    method: String,
    transaction_id: String,
    paid_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_payment(self) -> Payment {
        Payment {
            id: self.id,
            parcel_id: self.parcel_id,
            payer_email: self.payer_email,
            amount: self.amount,
            method: self.method,
            transaction_id: self.transaction_id,
            paid_at: self.paid_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RiderApplicationRow {
    id: i64,
    name: String,
    applicant_email: String,
    phone: String,
    district: String,
    region: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl RiderApplicationRow {
    fn into_application(self) -> Result<RiderApplication, StoreError> {
        Ok(RiderApplication {
            id: self.id,
            name: self.name,
            applicant_email: self.applicant_email,
            phone: self.phone,
            district: self.district,
            region: self.region,
            status: self.status.parse().map_err(StoreError::decode)?,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn upsert_user(&self, email: &str, now: DateTime<Utc>) -> Result<(User, bool), StoreError> {
        // xmax = 0 distinguishes a fresh insert from a conflict-update.
        let row = sqlx::query_as::<_, UpsertedUserRow>(
            "INSERT INTO users (email, role, created_at, last_login_at) \
             VALUES ($1, 'user', $2, $2) \
             ON CONFLICT (email) DO UPDATE SET last_login_at = EXCLUDED.last_login_at \
             RETURNING id, email, role, created_at, last_login_at, (xmax = 0) AS inserted",
        )
        .bind(email)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        let inserted = row.inserted;
        let user = User {
            id: row.id,
            email: row.email,
            role: row.role.parse().map_err(StoreError::decode)?,
            created_at: row.created_at,
            last_login_at: row.last_login_at,
        };
        Ok((user, inserted))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn search_users(&self, email_fragment: &str) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email ILIKE $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(format!("%{email_fragment}%"))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn update_user_role(&self, id: i64, role: Role) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET role = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn insert_parcel(&self, parcel: NewParcel, now: DateTime<Utc>) -> Result<Parcel, StoreError> {
        let row = sqlx::query_as::<_, ParcelRow>(&format!(
            "INSERT INTO parcels \
             (title, created_by, receiver_name, receiver_address, cost, payment_status, delivery_status, created_at) \
             VALUES ($1, $2, $3, $4, $5, 'unpaid', 'pending', $6) \
             RETURNING {PARCEL_COLUMNS}"
        ))
        .bind(&parcel.title)
        .bind(&parcel.created_by)
        .bind(&parcel.receiver_name)
        .bind(&parcel.receiver_address)
        .bind(parcel.cost)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        row.into_parcel()
    }

    async fn list_parcels(&self, filter: &ParcelFilter) -> Result<Vec<Parcel>, StoreError> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {PARCEL_COLUMNS} FROM parcels WHERE 1 = 1"));
        if let Some(created_by) = &filter.created_by {
            query.push(" AND created_by = ").push_bind(created_by);
        }
        if let Some(payment_status) = filter.payment_status {
            query.push(" AND payment_status = ").push_bind(payment_status.as_str());
        }
        if let Some(delivery_status) = filter.delivery_status {
            query.push(" AND delivery_status = ").push_bind(delivery_status.as_str());
        }
        query.push(" ORDER BY created_at DESC, id DESC");

        let rows = query.build_query_as::<ParcelRow>().fetch_all(&self.pool).await?;
        rows.into_iter().map(ParcelRow::into_parcel).collect()
    }

    async fn find_parcel(&self, id: i64) -> Result<Option<Parcel>, StoreError> {
        let row = sqlx::query_as::<_, ParcelRow>(&format!(
            "SELECT {PARCEL_COLUMNS} FROM parcels WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(ParcelRow::into_parcel).transpose()
    }

    async fn assign_rider(
        &self,
        parcel_id: i64,
        assignment: RiderAssignment,
        now: DateTime<Utc>,
    ) -> Result<Option<Parcel>, StoreError> {
        let row = sqlx::query_as::<_, ParcelRow>(&format!(
            "UPDATE parcels SET rider_id = $2, rider_name = $3, rider_email = $4, \
             delivery_status = 'assigned', assigned_at = $5 \
             WHERE id = $1 RETURNING {PARCEL_COLUMNS}"
        ))
        .bind(parcel_id)
        .bind(assignment.rider_id)
        .bind(&assignment.rider_name)
        .bind(&assignment.rider_email)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        row.map(ParcelRow::into_parcel).transpose()
    }

    async fn delete_parcel(&self, id: i64, created_by: Option<&str>) -> Result<u64, StoreError> {
        let result = match created_by {
            Some(email) => {
                sqlx::query("DELETE FROM parcels WHERE id = $1 AND created_by = $2")
                    .bind(id)
                    .bind(email)
                    .execute(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("DELETE FROM parcels WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool)
                    .await?
            }
        };
        Ok(result.rows_affected())
    }

    async fn record_payment(&self, payment: NewPayment, now: DateTime<Utc>) -> Result<PaymentOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Guard first: the transition is a single check-and-set, so two
        // concurrent attempts cannot both pass it.
        let updated = sqlx::query(
            "UPDATE parcels SET payment_status = 'paid' WHERE id = $1 AND payment_status = 'unpaid'",
        )
        .bind(payment.parcel_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            let existing = sqlx::query_as::<_, (String,)>(
                "SELECT payment_status FROM parcels WHERE id = $1",
            )
            .bind(payment.parcel_id)
            .fetch_optional(&mut *tx)
            .await?;
            return Ok(match existing {
                None => PaymentOutcome::ParcelNotFound,
                Some(_) => PaymentOutcome::AlreadyPaid,
            });
        }

        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "INSERT INTO payments (parcel_id, payer_email, amount, method, transaction_id, paid_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(payment.parcel_id)
        .bind(&payment.payer_email)
        .bind(payment.amount)
        .bind(&payment.method)
        .bind(&payment.transaction_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(PaymentOutcome::Recorded(row.into_payment()))
    }

    async fn list_payments_for(&self, payer_email: &str) -> Result<Vec<Payment>, StoreError> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE payer_email = $1 ORDER BY paid_at DESC, id DESC"
        ))
        .bind(payer_email)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PaymentRow::into_payment).collect())
    }

    async fn insert_rider_application(
        &self,
        application: NewRiderApplication,
        now: DateTime<Utc>,
    ) -> Result<RiderApplication, StoreError> {
        let row = sqlx::query_as::<_, RiderApplicationRow>(&format!(
            "INSERT INTO rider_applications (name, applicant_email, phone, district, region, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, 'pending', $6) \
             RETURNING {RIDER_COLUMNS}"
        ))
        .bind(&application.name)
        .bind(&application.applicant_email)
        .bind(&application.phone)
        .bind(&application.district)
        .bind(&application.region)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        row.into_application()
    }

    async fn list_rider_applications(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<RiderApplication>, StoreError> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {RIDER_COLUMNS} FROM rider_applications WHERE 1 = 1"));
        if let Some(status) = status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        query.push(" ORDER BY created_at DESC, id DESC");

        let rows = query
            .build_query_as::<RiderApplicationRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(RiderApplicationRow::into_application).collect()
    }

    async fn list_approved_riders(&self, district: Option<&str>) -> Result<Vec<RiderApplication>, StoreError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {RIDER_COLUMNS} FROM rider_applications WHERE status = 'approved'"
        ));
        if let Some(district) = district {
            query.push(" AND district = ").push_bind(district);
        }
        query.push(" ORDER BY created_at DESC, id DESC");

        let rows = query
            .build_query_as::<RiderApplicationRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(RiderApplicationRow::into_application).collect()
    }

    async fn find_rider_application(&self, id: i64) -> Result<Option<RiderApplication>, StoreError> {
        let row = sqlx::query_as::<_, RiderApplicationRow>(&format!(
            "SELECT {RIDER_COLUMNS} FROM rider_applications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(RiderApplicationRow::into_application).transpose()
    }

    async fn decide_rider_application(
        &self,
        id: i64,
        decision: ApplicationStatus,
    ) -> Result<DecisionOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Only a pending application can be decided; the filter makes the
        // terminal transition a check-and-set.
        let updated = sqlx::query_as::<_, RiderApplicationRow>(&format!(
            "UPDATE rider_applications SET status = $2 WHERE id = $1 AND status = 'pending' \
             RETURNING {RIDER_COLUMNS}"
        ))
        .bind(id)
        .bind(decision.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = updated else {
            let existing = sqlx::query_as::<_, (String,)>(
                "SELECT status FROM rider_applications WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
            return Ok(match existing {
                None => DecisionOutcome::NotFound,
                Some((status,)) => {
                    DecisionOutcome::AlreadyDecided(status.parse().map_err(StoreError::decode)?)
                }
            });
        };
        let application = row.into_application()?;

        // Role promotion rides in the same transaction as the status
        // change. Zero affected rows means no matching user exists; the
        // approval still commits and the caller reports the divergence.
        let user_role_updated = if decision == ApplicationStatus::Approved {
            sqlx::query("UPDATE users SET role = 'rider' WHERE email = $1")
                .bind(&application.applicant_email)
                .execute(&mut *tx)
                .await?
                .rows_affected()
                > 0
        } else {
            false
        };

        tx.commit().await?;
        Ok(DecisionOutcome::Decided { application, user_role_updated })
    }
}
