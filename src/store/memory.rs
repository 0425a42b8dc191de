//! Mutex-serialized in-memory store, substituted for Postgres in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

use super::{
    DecisionOutcome, NewParcel, NewPayment, NewRiderApplication, ParcelFilter, PaymentOutcome,
    RiderAssignment, Store, StoreError,
};
use crate::models::parcel::{DeliveryStatus, Parcel, PaymentStatus};
use crate::models::payment::Payment;
use crate::models::rider::{ApplicationStatus, RiderApplication};
use crate::models::user::{Role, User};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    parcels: Vec<Parcel>,
    payments: Vec<Payment>,
    applications: Vec<RiderApplication>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn upsert_user(&self, email: &str, now: DateTime<Utc>) -> Result<(User, bool), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.iter_mut().find(|u| u.email == email) {
            user.last_login_at = now;
            return Ok((user.clone(), false));
        }
        let user = User {
            id: inner.next_id(),
            email: email.to_string(),
            role: Role::User,
            created_at: now,
            last_login_at: now,
        };
        inner.users.push(user.clone());
        Ok((user, true))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn search_users(&self, email_fragment: &str) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let needle = email_fragment.to_lowercase();
        let mut matches: Vec<User> = inner
            .users
            .iter()
            .filter(|u| u.email.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(matches)
    }

    async fn update_user_role(&self, id: i64, role: Role) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.role = role;
            user.clone()
        }))
    }

    async fn insert_parcel(&self, parcel: NewParcel, now: DateTime<Utc>) -> Result<Parcel, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let parcel = Parcel {
            id: inner.next_id(),
            title: parcel.title,
            created_by: parcel.created_by,
            receiver_name: parcel.receiver_name,
            receiver_address: parcel.receiver_address,
            cost: parcel.cost,
            payment_status: PaymentStatus::Unpaid,
            delivery_status: DeliveryStatus::Pending,
            rider_id: None,
            rider_name: None,
            rider_email: None,
            assigned_at: None,
            created_at: now,
        };
        inner.parcels.push(parcel.clone());
        Ok(parcel)
    }

    async fn list_parcels(&self, filter: &ParcelFilter) -> Result<Vec<Parcel>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut matches: Vec<Parcel> = inner
            .parcels
            .iter()
            .filter(|p| filter.created_by.as_deref().is_none_or(|c| p.created_by == c))
            .filter(|p| filter.payment_status.is_none_or(|s| p.payment_status == s))
            .filter(|p| filter.delivery_status.is_none_or(|s| p.delivery_status == s))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(matches)
    }

    async fn find_parcel(&self, id: i64) -> Result<Option<Parcel>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.parcels.iter().find(|p| p.id == id).cloned())
    }

    async fn assign_rider(
        &self,
        parcel_id: i64,
        assignment: RiderAssignment,
        now: DateTime<Utc>,
    ) -> Result<Option<Parcel>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.parcels.iter_mut().find(|p| p.id == parcel_id).map(|parcel| {
            parcel.rider_id = Some(assignment.rider_id);
            parcel.rider_name = Some(assignment.rider_name.clone());
            parcel.rider_email = Some(assignment.rider_email.clone());
            parcel.delivery_status = DeliveryStatus::Assigned;
            parcel.assigned_at = Some(now);
            parcel.clone()
        }))
    }

    async fn delete_parcel(&self, id: i64, created_by: Option<&str>) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.parcels.len();
        inner
            .parcels
            .retain(|p| !(p.id == id && created_by.is_none_or(|c| p.created_by == c)));
        Ok((before - inner.parcels.len()) as u64)
    }

    async fn record_payment(&self, payment: NewPayment, now: DateTime<Utc>) -> Result<PaymentOutcome, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let Some(parcel) = inner.parcels.iter_mut().find(|p| p.id == payment.parcel_id) else {
            return Ok(PaymentOutcome::ParcelNotFound);
        };
        if parcel.payment_status == PaymentStatus::Paid {
            return Ok(PaymentOutcome::AlreadyPaid);
        }
        parcel.payment_status = PaymentStatus::Paid;
        let payment = Payment {
            id,
            parcel_id: payment.parcel_id,
            payer_email: payment.payer_email,
            amount: payment.amount,
            method: payment.method,
            transaction_id: payment.transaction_id,
            paid_at: now,
        };
        inner.payments.push(payment.clone());
        Ok(PaymentOutcome::Recorded(payment))
    }

    async fn list_payments_for(&self, payer_email: &str) -> Result<Vec<Payment>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut matches: Vec<Payment> = inner
            .payments
            .iter()
            .filter(|p| p.payer_email == payer_email)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.paid_at.cmp(&a.paid_at).then(b.id.cmp(&a.id)));
        Ok(matches)
    }

    async fn insert_rider_application(
        &self,
        application: NewRiderApplication,
        now: DateTime<Utc>,
    ) -> Result<RiderApplication, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let application = RiderApplication {
            id: inner.next_id(),
            name: application.name,
            applicant_email: application.applicant_email,
            phone: application.phone,
            district: application.district,
            region: application.region,
            status: ApplicationStatus::Pending,
            created_at: now,
        };
        inner.applications.push(application.clone());
        Ok(application)
    }

    async fn list_rider_applications(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<RiderApplication>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut matches: Vec<RiderApplication> = inner
            .applications
            .iter()
            .filter(|a| status.is_none_or(|s| a.status == s))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(matches)
    }

    async fn list_approved_riders(&self, district: Option<&str>) -> Result<Vec<RiderApplication>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut matches: Vec<RiderApplication> = inner
            .applications
            .iter()
            .filter(|a| a.status == ApplicationStatus::Approved)
            .filter(|a| district.is_none_or(|d| a.district == d))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(matches)
    }

    async fn find_rider_application(&self, id: i64) -> Result<Option<RiderApplication>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.applications.iter().find(|a| a.id == id).cloned())
    }

    async fn decide_rider_application(
        &self,
        id: i64,
        decision: ApplicationStatus,
    ) -> Result<DecisionOutcome, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(index) = inner.applications.iter().position(|a| a.id == id) else {
            return Ok(DecisionOutcome::NotFound);
        };
        if inner.applications[index].status != ApplicationStatus::Pending {
            return Ok(DecisionOutcome::AlreadyDecided(inner.applications[index].status));
        }
        inner.applications[index].status = decision;
        let application = inner.applications[index].clone();

        let user_role_updated = if decision == ApplicationStatus::Approved {
            inner
                .users
                .iter_mut()
                .find(|u| u.email == application.applicant_email)
                .map(|u| u.role = Role::Rider)
                .is_some()
        } else {
            false
        };
        Ok(DecisionOutcome::Decided { application, user_role_updated })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[tokio::test]
    async fn upsert_creates_then_touches_last_login() {
        let store = MemStore::new();
        let (user, created) = store.upsert_user("a@x.com", now()).await.unwrap();
        assert!(created);
        assert_eq!(user.role, Role::User);

        let later = now();
        let (again, created) = store.upsert_user("a@x.com", later).await.unwrap();
        assert!(!created);
        assert_eq!(again.id, user.id);
        assert_eq!(again.last_login_at, later);
    }

    #[tokio::test]
    async fn payment_transition_happens_exactly_once() {
        let store = MemStore::new();
        let parcel = store
            .insert_parcel(
                NewParcel {
                    title: "books".into(),
                    created_by: "a@x.com".into(),
                    receiver_name: "B".into(),
                    receiver_address: "12 Main St".into(),
                    cost: 1500,
                },
                now(),
            )
            .await
            .unwrap();
        assert_eq!(parcel.payment_status, PaymentStatus::Unpaid);

        let payment = NewPayment {
            parcel_id: parcel.id,
            payer_email: "a@x.com".into(),
            amount: 1500,
            method: "card".into(),
            transaction_id: "tx-1".into(),
        };
        let first = store.record_payment(payment.clone(), now()).await.unwrap();
        assert!(matches!(first, PaymentOutcome::Recorded(_)));

        let second = store.record_payment(payment, now()).await.unwrap();
        assert!(matches!(second, PaymentOutcome::AlreadyPaid));
        assert_eq!(store.list_payments_for("a@x.com").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn payment_against_missing_parcel_is_reported() {
        let store = MemStore::new();
        let outcome = store
            .record_payment(
                NewPayment {
                    parcel_id: 99,
                    payer_email: "a@x.com".into(),
                    amount: 100,
                    method: "card".into(),
                    transaction_id: "tx-9".into(),
                },
                now(),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, PaymentOutcome::ParcelNotFound));
        assert!(store.list_payments_for("a@x.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn parcel_filters_are_conjunctive() {
        let store = MemStore::new();
        for (title, pay, delivery) in [
            ("a", PaymentStatus::Paid, DeliveryStatus::Pending),
            ("b", PaymentStatus::Paid, DeliveryStatus::Delivered),
            ("c", PaymentStatus::Unpaid, DeliveryStatus::Pending),
        ] {
            let parcel = store
                .insert_parcel(
                    NewParcel {
                        title: title.into(),
                        created_by: "a@x.com".into(),
                        receiver_name: "B".into(),
                        receiver_address: "12 Main St".into(),
                        cost: 100,
                    },
                    now(),
                )
                .await
                .unwrap();
            let mut inner = store.inner.lock().unwrap();
            let stored = inner.parcels.iter_mut().find(|p| p.id == parcel.id).unwrap();
            stored.payment_status = pay;
            stored.delivery_status = delivery;
        }

        let filter = ParcelFilter {
            created_by: None,
            payment_status: Some(PaymentStatus::Paid),
            delivery_status: Some(DeliveryStatus::Pending),
        };
        let matches = store.list_parcels(&filter).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].title, "a");
    }

    #[tokio::test]
    async fn delete_of_absent_parcel_reports_zero() {
        let store = MemStore::new();
        assert_eq!(store.delete_parcel(42, None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn approval_promotes_matching_user() {
        let store = MemStore::new();
        store.upsert_user("r@x.com", now()).await.unwrap();
        let application = store
            .insert_rider_application(
                NewRiderApplication {
                    name: "R".into(),
                    applicant_email: "r@x.com".into(),
                    phone: "017".into(),
                    district: "Dhaka".into(),
                    region: "Dhaka".into(),
                },
                now(),
            )
            .await
            .unwrap();

        let outcome = store
            .decide_rider_application(application.id, ApplicationStatus::Approved)
            .await
            .unwrap();
        match outcome {
            DecisionOutcome::Decided { application, user_role_updated } => {
                assert_eq!(application.status, ApplicationStatus::Approved);
                assert!(user_role_updated);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let user = store.find_user_by_email("r@x.com").await.unwrap().unwrap();
        assert_eq!(user.role, Role::Rider);
    }

    #[tokio::test]
    async fn approval_without_user_record_still_commits() {
        let store = MemStore::new();
        let application = store
            .insert_rider_application(
                NewRiderApplication {
                    name: "R".into(),
                    applicant_email: "ghost@x.com".into(),
                    phone: "018".into(),
                    district: "Sylhet".into(),
                    region: "Sylhet".into(),
                },
                now(),
            )
            .await
            .unwrap();

        let outcome = store
            .decide_rider_application(application.id, ApplicationStatus::Approved)
            .await
            .unwrap();
        match outcome {
            DecisionOutcome::Decided { application, user_role_updated } => {
                assert_eq!(application.status, ApplicationStatus::Approved);
                assert!(!user_role_updated);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn decisions_are_terminal() {
        let store = MemStore::new();
        let application = store
            .insert_rider_application(
                NewRiderApplication {
                    name: "R".into(),
                    applicant_email: "r@x.com".into(),
                    phone: "019".into(),
                    district: "Khulna".into(),
                    region: "Khulna".into(),
                },
                now(),
            )
            .await
            .unwrap();
        store
            .decide_rider_application(application.id, ApplicationStatus::Rejected)
            .await
            .unwrap();

        let again = store
            .decide_rider_application(application.id, ApplicationStatus::Approved)
            .await
            .unwrap();
        assert!(matches!(again, DecisionOutcome::AlreadyDecided(ApplicationStatus::Rejected)));
    }
}
