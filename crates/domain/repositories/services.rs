use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::services::ServiceEntity;

#[async_trait]
#[automock]
pub trait ServiceRepository {
    async fn find_by_id(&self, service_id: Uuid) -> Result<Option<ServiceEntity>>;
}
