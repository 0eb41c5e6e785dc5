//! Alert repository: profiles, due installments and alert records.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, SelectTwo, Set,
};
use uuid::Uuid;

use super::mapping::{
    alert_to_domain, installment_to_domain, loan_to_domain, profile_to_domain, to_db_alert_status,
};
use crate::entities::{
    alerts, creditors, installments, loans, personas,
    sea_orm_active_enums::{AlertStatus as DbAlertStatus, InstallmentStatus},
};
use prestamos_core::alerts::{
    Alert, AlertRepository as AlertRepoTrait, AlertStatus, DueInstallment, NewAlert, NotifyError,
};
use prestamos_core::loan::Profile;
use prestamos_shared::{AlertId, PersonaId};

fn db_err(e: DbErr) -> NotifyError {
    NotifyError::repository(e.to_string())
}

/// Alert repository implementation.
#[derive(Debug, Clone)]
pub struct AlertRepository {
    db: DatabaseConnection,
}

impl AlertRepository {
    /// Create a new alert repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Pending installments of an owner with their loans.
    fn pending_for(owner_id: PersonaId) -> SelectTwo<installments::Entity, loans::Entity> {
        installments::Entity::find()
            .find_also_related(loans::Entity)
            .filter(loans::Column::PersonaId.eq(owner_id.into_inner()))
            .filter(installments::Column::Status.eq(InstallmentStatus::Pending))
            .order_by_asc(installments::Column::DueDate)
            .order_by_asc(installments::Column::SequenceNo)
    }

    async fn load_due(
        &self,
        query: SelectTwo<installments::Entity, loans::Entity>,
    ) -> Result<Vec<DueInstallment>, NotifyError> {
        let rows = query.all(&self.db).await.map_err(db_err)?;

        let creditor_ids: Vec<Uuid> = rows
            .iter()
            .filter_map(|(_, loan)| loan.as_ref().and_then(|l| l.creditor_id))
            .collect();
        let names: HashMap<Uuid, String> = if creditor_ids.is_empty() {
            HashMap::new()
        } else {
            creditors::Entity::find()
                .filter(creditors::Column::Id.is_in(creditor_ids))
                .all(&self.db)
                .await
                .map_err(db_err)?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect()
        };

        rows.into_iter()
            .filter_map(|(installment, loan)| loan.map(|l| (installment, l)))
            .map(|(installment, loan)| {
                let creditor_name = loan.creditor_id.and_then(|id| names.get(&id).cloned());
                Ok(DueInstallment {
                    installment: installment_to_domain(installment).map_err(NotifyError::repository)?,
                    loan: loan_to_domain(loan).map_err(NotifyError::repository)?,
                    creditor_name,
                })
            })
            .collect()
    }
}

impl AlertRepoTrait for AlertRepository {
    async fn list_profiles(&self) -> Result<Vec<Profile>, NotifyError> {
        personas::Entity::find()
            .order_by_asc(personas::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|m| profile_to_domain(m).map_err(NotifyError::repository))
            .collect()
    }

    async fn find_profile(&self, persona_id: PersonaId) -> Result<Option<Profile>, NotifyError> {
        personas::Entity::find_by_id(persona_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(|m| profile_to_domain(m).map_err(NotifyError::repository))
            .transpose()
    }

    async fn pending_due_on(
        &self,
        owner_id: PersonaId,
        dates: &[NaiveDate],
    ) -> Result<Vec<DueInstallment>, NotifyError> {
        if dates.is_empty() {
            return Ok(Vec::new());
        }
        let query = Self::pending_for(owner_id)
            .filter(installments::Column::DueDate.is_in(dates.iter().copied()));
        self.load_due(query).await
    }

    async fn pending_overdue(
        &self,
        owner_id: PersonaId,
        today: NaiveDate,
    ) -> Result<Vec<DueInstallment>, NotifyError> {
        let query = Self::pending_for(owner_id).filter(installments::Column::DueDate.lt(today));
        self.load_due(query).await
    }

    async fn record_alert(&self, alert: NewAlert) -> Result<Alert, NotifyError> {
        let active_model = alerts::ActiveModel {
            id: Set(Uuid::now_v7()),
            installment_id: Set(alert.installment_id.into_inner()),
            alert_date: Set(alert.alert_date),
            message: Set(alert.message),
            status: Set(DbAlertStatus::Pending),
            created_at: Set(Utc::now().into()),
        };

        alerts::Entity::insert(active_model)
            .on_conflict(
                OnConflict::columns([alerts::Column::InstallmentId, alerts::Column::AlertDate])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(db_err)?;

        alerts::Entity::find()
            .filter(alerts::Column::InstallmentId.eq(alert.installment_id.into_inner()))
            .filter(alerts::Column::AlertDate.eq(alert.alert_date))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(alert_to_domain)
            .ok_or_else(|| NotifyError::repository("alert vanished after insert"))
    }

    async fn set_alert_status(&self, alert_id: AlertId, status: AlertStatus) -> Result<(), NotifyError> {
        alerts::Entity::update_many()
            .set(alerts::ActiveModel {
                status: Set(to_db_alert_status(status)),
                ..Default::default()
            })
            .filter(alerts::Column::Id.eq(alert_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
