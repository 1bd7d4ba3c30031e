use chrono::Utc;
use sea_orm::{ActiveValue, ColumnTrait, Condition};
use uuid::Uuid;

use crate::{
    AuditEvent, Caller, Company, EngineError, ResultEngine, Role, companies, company_members,
    users,
    util::{normalize_optional_text, normalize_required_name, parse_uuid},
};

use super::Engine;

impl Engine {
    /// Creates a tenant. Operator-only: there is no caller yet to scope it to.
    pub async fn new_company(&self, name: &str, tax_id: Option<&str>) -> ResultEngine<Company> {
        let company = Company {
            id: Uuid::new_v4(),
            name: normalize_required_name(name, "company")?,
            tax_id: normalize_optional_text(tax_id),
            created_at: Utc::now(),
        };
        self.store
            .insert(companies::ActiveModel::from(&company))
            .await?;
        tracing::info!(company_id = %company.id, "company created");
        self.emit(AuditEvent::new(
            "company.created",
            "operator",
            company.id,
            "company",
            company.id,
        ));
        Ok(company)
    }

    pub async fn company(&self, caller: &Caller, company_id: Uuid) -> ResultEngine<Company> {
        Company::try_from(self.require_company(caller, company_id).await?)
    }

    /// Companies visible to the caller.
    pub async fn companies(&self, caller: &Caller) -> ResultEngine<Vec<Company>> {
        let ids: Vec<String> = caller.company_ids.iter().map(ToString::to_string).collect();
        self.store
            .find::<companies::Entity>(Condition::all().add(companies::Column::Id.is_in(ids)))
            .await?
            .into_iter()
            .map(Company::try_from)
            .collect()
    }

    /// Creates a user holding `api_token`, member of `company_ids`.
    pub async fn new_user(
        &self,
        email: &str,
        name: &str,
        api_token: &str,
        role: Role,
        company_ids: &[Uuid],
    ) -> ResultEngine<Uuid> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(EngineError::InvalidName(format!("invalid email: {email}")));
        }
        let api_token = api_token.trim();
        if api_token.is_empty() {
            return Err(EngineError::InvalidName(
                "api token must not be empty".to_string(),
            ));
        }
        let existing = self
            .store
            .find_one::<users::Entity>(Condition::all().add(users::Column::Email.eq(email.as_str())))
            .await?;
        if existing.is_some() {
            return Err(EngineError::ExistingKey(email));
        }
        for company_id in company_ids {
            if self
                .store
                .find_by_id::<companies::Entity>(*company_id)
                .await?
                .is_none()
            {
                return Err(EngineError::KeyNotFound("company not exists".to_string()));
            }
        }

        let user_id = Uuid::new_v4();
        self.store
            .insert(users::ActiveModel {
                id: ActiveValue::Set(user_id.to_string()),
                email: ActiveValue::Set(email),
                name: ActiveValue::Set(normalize_required_name(name, "user")?),
                api_token: ActiveValue::Set(api_token.to_string()),
                role: ActiveValue::Set(role.as_str().to_string()),
            })
            .await?;
        for company_id in company_ids {
            self.store
                .insert(company_members::ActiveModel {
                    company_id: ActiveValue::Set(company_id.to_string()),
                    user_id: ActiveValue::Set(user_id.to_string()),
                })
                .await?;
        }
        tracing::info!(%user_id, companies = company_ids.len(), "user created");
        Ok(user_id)
    }

    /// Resolves a bearer credential. `None` for unknown tokens.
    pub async fn resolve_token(&self, token: &str) -> ResultEngine<Option<Caller>> {
        let Some(user) = self
            .store
            .find_one::<users::Entity>(Condition::all().add(users::Column::ApiToken.eq(token)))
            .await?
        else {
            return Ok(None);
        };
        let memberships = self
            .store
            .find::<company_members::Entity>(
                Condition::all().add(company_members::Column::UserId.eq(user.id.as_str())),
            )
            .await?;
        let company_ids = memberships
            .iter()
            .map(|m| parse_uuid(&m.company_id, "company"))
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok(Some(Caller::new(
            user.id,
            company_ids,
            Role::try_from(user.role.as_str())?,
        )))
    }
}
