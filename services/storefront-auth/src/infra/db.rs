use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, sea_query::Expr,
};

use rentdesk_domain::id::{CustomerId, TenantId};
use rentdesk_storefront_auth_schema::{customer_sessions, customers, stores, verification_codes};

use crate::domain::repository::{
    CustomerRepository, SessionRepository, TenantRepository, VerificationCodeRepository,
};
use crate::domain::types::{
    Customer, CustomerSession, Tenant, VERIFICATION_CODE_TYPE, VerificationCode,
};

// ── Tenant repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbTenantRepository {
    pub db: DatabaseConnection,
}

impl TenantRepository for DbTenantRepository {
    async fn find_by_id(&self, id: TenantId) -> anyhow::Result<Option<Tenant>> {
        let model = stores::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find store by id")?;
        Ok(model.map(tenant_from_model))
    }

    async fn find_by_slug(&self, slug: &str) -> anyhow::Result<Option<Tenant>> {
        let model = stores::Entity::find()
            .filter(stores::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .context("find store by slug")?;
        Ok(model.map(tenant_from_model))
    }
}

fn tenant_from_model(model: stores::Model) -> Tenant {
    Tenant {
        id: TenantId(model.id),
        slug: model.slug,
        name: model.name,
        logo_url: model.logo_url,
    }
}

// ── Customer repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCustomerRepository {
    pub db: DatabaseConnection,
}

impl CustomerRepository for DbCustomerRepository {
    async fn find_by_email(
        &self,
        tenant_id: TenantId,
        email: &str,
    ) -> anyhow::Result<Option<Customer>> {
        let model = customers::Entity::find()
            .filter(customers::Column::StoreId.eq(tenant_id.0))
            .filter(customers::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find customer by email")?;
        Ok(model.map(customer_from_model))
    }

    async fn find_by_id(&self, id: CustomerId) -> anyhow::Result<Option<Customer>> {
        let model = customers::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find customer by id")?;
        Ok(model.map(customer_from_model))
    }
}

fn customer_from_model(model: customers::Model) -> Customer {
    Customer {
        id: CustomerId(model.id),
        tenant_id: TenantId(model.store_id),
        email: model.email,
        first_name: model.first_name,
        last_name: model.last_name,
    }
}

// ── Verification code repository ─────────────────────────────────────────────

#[derive(Clone)]
pub struct DbVerificationCodeRepository {
    pub db: DatabaseConnection,
}

impl VerificationCodeRepository for DbVerificationCodeRepository {
    async fn create(&self, code: &VerificationCode) -> anyhow::Result<()> {
        verification_codes::ActiveModel {
            id: Set(code.id),
            store_id: Set(code.tenant_id.0),
            email: Set(code.email.clone()),
            code: Set(code.code.clone()),
            kind: Set(VERIFICATION_CODE_TYPE.to_owned()),
            expires_at: Set(code.expires_at),
            used_at: Set(None),
            created_at: Set(code.created_at),
        }
        .insert(&self.db)
        .await
        .context("create verification code")?;
        Ok(())
    }

    async fn consume(
        &self,
        tenant_id: TenantId,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<VerificationCode>> {
        let candidate = verification_codes::Entity::find()
            .filter(verification_codes::Column::StoreId.eq(tenant_id.0))
            .filter(verification_codes::Column::Email.eq(email))
            .filter(verification_codes::Column::Code.eq(code))
            .filter(verification_codes::Column::Kind.eq(VERIFICATION_CODE_TYPE))
            .filter(verification_codes::Column::UsedAt.is_null())
            .filter(verification_codes::Column::ExpiresAt.gt(now))
            .order_by_desc(verification_codes::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find verification code")?;
        let Some(candidate) = candidate else {
            return Ok(None);
        };

        // Conditional update: only the caller that flips used_at from NULL wins.
        let result = verification_codes::Entity::update_many()
            .col_expr(verification_codes::Column::UsedAt, Expr::value(now))
            .filter(verification_codes::Column::Id.eq(candidate.id))
            .filter(verification_codes::Column::UsedAt.is_null())
            .filter(verification_codes::Column::ExpiresAt.gt(now))
            .exec(&self.db)
            .await
            .context("mark verification code used")?;
        if result.rows_affected != 1 {
            return Ok(None);
        }

        let mut consumed = verification_code_from_model(candidate);
        consumed.used_at = Some(now);
        Ok(Some(consumed))
    }
}

fn verification_code_from_model(model: verification_codes::Model) -> VerificationCode {
    VerificationCode {
        id: model.id,
        tenant_id: TenantId(model.store_id),
        email: model.email,
        code: model.code,
        expires_at: model.expires_at,
        used_at: model.used_at,
        created_at: model.created_at,
    }
}

// ── Session repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbSessionRepository {
    pub db: DatabaseConnection,
}

impl SessionRepository for DbSessionRepository {
    async fn create(&self, session: &CustomerSession) -> anyhow::Result<()> {
        customer_sessions::ActiveModel {
            id: Set(session.id),
            customer_id: Set(session.customer_id.0),
            token: Set(session.token.clone()),
            expires_at: Set(session.expires_at),
            created_at: Set(session.created_at),
        }
        .insert(&self.db)
        .await
        .context("create customer session")?;
        Ok(())
    }

    async fn find_active(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<CustomerSession>> {
        let model = customer_sessions::Entity::find()
            .filter(customer_sessions::Column::Token.eq(token))
            .filter(customer_sessions::Column::ExpiresAt.gt(now))
            .one(&self.db)
            .await
            .context("find customer session")?;
        Ok(model.map(session_from_model))
    }

    async fn delete_by_token(&self, token: &str) -> anyhow::Result<bool> {
        let result = customer_sessions::Entity::delete_many()
            .filter(customer_sessions::Column::Token.eq(token))
            .exec(&self.db)
            .await
            .context("delete customer session")?;
        Ok(result.rows_affected > 0)
    }
}

fn session_from_model(model: customer_sessions::Model) -> CustomerSession {
    CustomerSession {
        id: model.id,
        customer_id: CustomerId(model.customer_id),
        token: model.token,
        expires_at: model.expires_at,
        created_at: model.created_at,
    }
}
