//! Loan repository: loans, installments, creditors and activity history.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait, Unchanged,
};
use tracing::debug;
use uuid::Uuid;

use super::mapping::{
    count_to_db, creditor_to_domain, history_to_domain, installment_to_domain, loan_to_domain,
};
use crate::entities::{
    creditors, history, installments, loans, sea_orm_active_enums::InstallmentStatus,
};
use prestamos_core::loan::{
    Creditor, HistoryEntry, Installment, Loan, LoanError, LoanRepository as LoanRepoTrait,
    NewHistoryEntry, NewInstallment, PaymentSnapshot,
};
use prestamos_shared::{CreditorId, InstallmentId, LoanId, PersonaId};

fn db_err(e: DbErr) -> LoanError {
    LoanError::repository(e.to_string())
}

/// Loan repository implementation.
#[derive(Debug, Clone)]
pub struct LoanRepository {
    db: DatabaseConnection,
}

impl LoanRepository {
    /// Create a new loan repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Activity history of a profile, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub async fn list_history(&self, persona_id: PersonaId) -> Result<Vec<HistoryEntry>, LoanError> {
        history::Entity::find()
            .filter(history::Column::PersonaId.eq(persona_id.into_inner()))
            .order_by_desc(history::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|m| history_to_domain(m).map_err(LoanError::repository))
            .collect()
    }

}

impl LoanRepoTrait for LoanRepository {
    async fn find_loan(&self, owner_id: PersonaId, loan_id: LoanId) -> Result<Option<Loan>, LoanError> {
        let model = loans::Entity::find_by_id(loan_id.into_inner())
            .filter(loans::Column::PersonaId.eq(owner_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        model
            .map(|m| loan_to_domain(m).map_err(LoanError::repository))
            .transpose()
    }

    async fn insert_loan(&self, loan: &Loan) -> Result<(), LoanError> {
        let active_model = loans::ActiveModel {
            id: Set(loan.id.into_inner()),
            persona_id: Set(loan.owner_id.into_inner()),
            creditor_id: Set(loan.creditor_id.map(CreditorId::into_inner)),
            label: Set(loan.label.clone()),
            description: Set(loan.description.clone()),
            principal: Set(loan.terms.principal),
            annual_rate: Set(loan.terms.annual_rate),
            installment_count: Set(
                count_to_db(loan.terms.installment_count).map_err(LoanError::repository)?
            ),
            start_date: Set(loan.terms.start_date),
            currency: Set(loan.terms.currency.code().to_string()),
            display_currency: Set(loan.display_currency.code().to_string()),
            created_at: Set(loan.created_at.into()),
            updated_at: Set(Utc::now().into()),
        };

        active_model.insert(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn update_loan(&self, loan: &Loan) -> Result<(), LoanError> {
        let active_model = loans::ActiveModel {
            id: Unchanged(loan.id.into_inner()),
            creditor_id: Set(loan.creditor_id.map(CreditorId::into_inner)),
            label: Set(loan.label.clone()),
            description: Set(loan.description.clone()),
            principal: Set(loan.terms.principal),
            annual_rate: Set(loan.terms.annual_rate),
            installment_count: Set(
                count_to_db(loan.terms.installment_count).map_err(LoanError::repository)?
            ),
            start_date: Set(loan.terms.start_date),
            currency: Set(loan.terms.currency.code().to_string()),
            display_currency: Set(loan.display_currency.code().to_string()),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        active_model.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn delete_loan(&self, owner_id: PersonaId, loan_id: LoanId) -> Result<bool, LoanError> {
        let result = loans::Entity::delete_many()
            .filter(loans::Column::Id.eq(loan_id.into_inner()))
            .filter(loans::Column::PersonaId.eq(owner_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn list_loans_without_installments(&self) -> Result<Vec<Loan>, LoanError> {
        let with_installments = Query::select()
            .column(installments::Column::LoanId)
            .from(installments::Entity)
            .to_owned();

        loans::Entity::find()
            .filter(loans::Column::Id.not_in_subquery(with_installments))
            .order_by_asc(loans::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|m| loan_to_domain(m).map_err(LoanError::repository))
            .collect()
    }

    async fn list_installments(&self, loan_id: LoanId) -> Result<Vec<Installment>, LoanError> {
        installments::Entity::find()
            .filter(installments::Column::LoanId.eq(loan_id.into_inner()))
            .order_by_asc(installments::Column::SequenceNo)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|m| installment_to_domain(m).map_err(LoanError::repository))
            .collect()
    }

    async fn count_installments(&self, loan_id: LoanId) -> Result<u64, LoanError> {
        installments::Entity::find()
            .filter(installments::Column::LoanId.eq(loan_id.into_inner()))
            .count(&self.db)
            .await
            .map_err(db_err)
    }

    async fn count_paid_installments(&self, loan_id: LoanId) -> Result<u64, LoanError> {
        installments::Entity::find()
            .filter(installments::Column::LoanId.eq(loan_id.into_inner()))
            .filter(installments::Column::Status.eq(InstallmentStatus::Paid))
            .count(&self.db)
            .await
            .map_err(db_err)
    }

    async fn insert_installments(
        &self,
        rows: Vec<NewInstallment>,
    ) -> Result<Vec<Installment>, LoanError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let txn = self.db.begin().await.map_err(db_err)?;
        let now = Utc::now();
        let mut created = Vec::with_capacity(rows.len());

        for row in rows {
            let active_model = installments::ActiveModel {
                id: Set(Uuid::now_v7()),
                loan_id: Set(row.loan_id.into_inner()),
                sequence_no: Set(count_to_db(row.sequence_no).map_err(LoanError::repository)?),
                amount: Set(row.amount),
                due_date: Set(row.due_date),
                status: Set(InstallmentStatus::Pending),
                paid_date: Set(None),
                origin_currency: Set(None),
                destination_currency: Set(None),
                exchange_rate: Set(None),
                origin_amount: Set(None),
                converted_amount: Set(None),
                created_at: Set(now.into()),
            };
            let model = active_model.insert(&txn).await.map_err(db_err)?;
            created.push(installment_to_domain(model).map_err(LoanError::repository)?);
        }

        txn.commit().await.map_err(db_err)?;
        debug!(count = created.len(), "installments inserted");
        Ok(created)
    }

    async fn delete_installments(&self, loan_id: LoanId) -> Result<u64, LoanError> {
        let result = installments::Entity::delete_many()
            .filter(installments::Column::LoanId.eq(loan_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected)
    }

    async fn find_installment(
        &self,
        owner_id: PersonaId,
        installment_id: InstallmentId,
    ) -> Result<Option<(Installment, Loan)>, LoanError> {
        let row = installments::Entity::find_by_id(installment_id.into_inner())
            .find_also_related(loans::Entity)
            .filter(loans::Column::PersonaId.eq(owner_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        match row {
            Some((installment, Some(loan))) => Ok(Some((
                installment_to_domain(installment).map_err(LoanError::repository)?,
                loan_to_domain(loan).map_err(LoanError::repository)?,
            ))),
            _ => Ok(None),
        }
    }

    async fn record_payment(
        &self,
        installment_id: InstallmentId,
        paid_date: NaiveDate,
        snapshot: Option<PaymentSnapshot>,
    ) -> Result<bool, LoanError> {
        let snapshot = snapshot.as_ref();
        let result = installments::Entity::update_many()
            .set(installments::ActiveModel {
                status: Set(InstallmentStatus::Paid),
                paid_date: Set(Some(paid_date)),
                origin_currency: Set(snapshot.map(|s| s.origin_currency.code().to_string())),
                destination_currency: Set(
                    snapshot.map(|s| s.destination_currency.code().to_string())
                ),
                exchange_rate: Set(snapshot.map(|s| s.rate)),
                origin_amount: Set(snapshot.map(|s| s.origin_amount)),
                converted_amount: Set(snapshot.map(|s| s.converted_amount)),
                ..Default::default()
            })
            .filter(installments::Column::Id.eq(installment_id.into_inner()))
            .filter(installments::Column::Status.eq(InstallmentStatus::Pending))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected == 1)
    }

    async fn find_creditor(
        &self,
        owner_id: PersonaId,
        creditor_id: CreditorId,
    ) -> Result<Option<Creditor>, LoanError> {
        let model = creditors::Entity::find_by_id(creditor_id.into_inner())
            .filter(creditors::Column::PersonaId.eq(owner_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(creditor_to_domain))
    }

    async fn count_loans_for_creditor(&self, creditor_id: CreditorId) -> Result<u64, LoanError> {
        loans::Entity::find()
            .filter(loans::Column::CreditorId.eq(creditor_id.into_inner()))
            .count(&self.db)
            .await
            .map_err(db_err)
    }

    async fn delete_creditor(
        &self,
        owner_id: PersonaId,
        creditor_id: CreditorId,
    ) -> Result<bool, LoanError> {
        let result = creditors::Entity::delete_many()
            .filter(creditors::Column::Id.eq(creditor_id.into_inner()))
            .filter(creditors::Column::PersonaId.eq(owner_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn append_history(&self, entry: NewHistoryEntry) -> Result<(), LoanError> {
        let active_model = history::ActiveModel {
            id: Set(Uuid::now_v7()),
            persona_id: Set(entry.persona_id.into_inner()),
            action: Set(entry.action.code().to_string()),
            detail: Set(entry.detail),
            created_at: Set(Utc::now().into()),
        };

        active_model.insert(&self.db).await.map_err(db_err)?;
        Ok(())
    }
}
