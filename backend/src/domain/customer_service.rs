//! Customer directory service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;

use crate::domain::ports::{CustomerDirectory, CustomerRepository, CustomerRepositoryError};
use crate::domain::{
    Customer, CustomerDraft, CustomerFilter, CustomerId, CustomerUpdate, CustomerValidationError,
    Error,
};

pub(crate) fn map_customer_error(error: CustomerRepositoryError) -> Error {
    match error {
        CustomerRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("customer repository unavailable: {message}"))
        }
        CustomerRepositoryError::Query { message } => {
            Error::internal(format!("customer repository error: {message}"))
        }
    }
}

fn validation_error(error: CustomerValidationError) -> Error {
    Error::invalid_request(error.to_string()).with_details(json!({
        "field": error.field(),
        "code": "invalid_customer",
    }))
}

/// Load a customer or fail with `not_found`.
pub(crate) async fn require_customer<R>(repo: &R, id: CustomerId) -> Result<Customer, Error>
where
    R: CustomerRepository + ?Sized,
{
    repo.find_by_id(&id)
        .await
        .map_err(map_customer_error)?
        .ok_or_else(|| Error::not_found(format!("customer {id} not found")))
}

/// Customer service implementing the directory port.
#[derive(Clone)]
pub struct CustomerService<R> {
    customers: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> CustomerService<R> {
    /// Create the service over its repository.
    pub fn new(customers: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { customers, clock }
    }
}

#[async_trait]
impl<R> CustomerDirectory for CustomerService<R>
where
    R: CustomerRepository,
{
    async fn create_customer(&self, draft: CustomerDraft) -> Result<Customer, Error> {
        let customer = Customer::create(CustomerId::random(), draft, self.clock.utc())
            .map_err(validation_error)?;
        self.customers
            .create(&customer)
            .await
            .map_err(map_customer_error)?;
        tracing::info!(customer_id = %customer.id, "customer created");
        Ok(customer)
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Customer, Error> {
        require_customer(self.customers.as_ref(), id).await
    }

    async fn list_customers(&self, filter: CustomerFilter) -> Result<Vec<Customer>, Error> {
        self.customers
            .list(&filter)
            .await
            .map_err(map_customer_error)
    }

    async fn update_customer(
        &self,
        id: CustomerId,
        update: CustomerUpdate,
    ) -> Result<Customer, Error> {
        let mut customer = require_customer(self.customers.as_ref(), id).await?;
        if customer.archived {
            return Err(Error::conflict("archived customers cannot be updated"));
        }
        customer
            .apply(update, self.clock.utc())
            .map_err(validation_error)?;
        self.customers
            .update(&customer)
            .await
            .map_err(map_customer_error)?;
        Ok(customer)
    }

    async fn archive_customer(&self, id: CustomerId) -> Result<Customer, Error> {
        let mut customer = require_customer(self.customers.as_ref(), id).await?;
        if customer.archived {
            return Ok(customer);
        }
        customer.archived = true;
        customer.updated_at = self.clock.utc();
        self.customers
            .update(&customer)
            .await
            .map_err(map_customer_error)?;
        tracing::info!(customer_id = %customer.id, "customer archived");
        Ok(customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockCustomerRepository;
    use crate::domain::test_fixtures::{fixture_clock, fixture_now, sample_customer};
    use rstest::rstest;

    fn service(repo: MockCustomerRepository) -> CustomerService<MockCustomerRepository> {
        CustomerService::new(Arc::new(repo), fixture_clock())
    }

    #[rstest]
    #[tokio::test]
    async fn create_persists_validated_customer() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_create()
            .withf(|customer| customer.email.as_deref() == Some("ops@example.com"))
            .times(1)
            .return_once(|_| Ok(()));
        let draft = CustomerDraft {
            name: "Ops".into(),
            email: Some(" OPS@example.com ".into()),
            ..CustomerDraft::default()
        };

        let customer = service(repo).create_customer(draft).await.expect("created");
        assert_eq!(customer.created_at, fixture_now());
    }

    #[rstest]
    #[tokio::test]
    async fn invalid_draft_reports_field() {
        let draft = CustomerDraft {
            name: "Ops".into(),
            phone: Some("call me".into()),
            ..CustomerDraft::default()
        };
        let err = service(MockCustomerRepository::new())
            .create_customer(draft)
            .await
            .expect_err("invalid");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            err.details().and_then(|d| d.get("field")).and_then(|f| f.as_str()),
            Some("phone")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn missing_customer_is_not_found() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_find_by_id().return_once(|_| Ok(None));
        let err = service(repo)
            .get_customer(CustomerId::random())
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn archive_is_idempotent() {
        let mut archived = sample_customer();
        archived.archived = true;
        let mut repo = MockCustomerRepository::new();
        repo.expect_find_by_id()
            .return_once(move |_| Ok(Some(archived)));
        repo.expect_update().times(0);

        let customer = service(repo)
            .archive_customer(CustomerId::random())
            .await
            .expect("archived");
        assert!(customer.archived);
    }

    #[rstest]
    #[tokio::test]
    async fn update_applies_preferences() {
        let existing = sample_customer();
        let id = existing.id;
        let mut repo = MockCustomerRepository::new();
        repo.expect_find_by_id()
            .return_once(move |_| Ok(Some(existing)));
        repo.expect_update()
            .withf(|customer| !customer.sms_opt_in)
            .times(1)
            .return_once(|_| Ok(()));
        let update = CustomerUpdate {
            sms_opt_in: Some(false),
            ..CustomerUpdate::default()
        };

        let customer = service(repo).update_customer(id, update).await.expect("updated");
        assert!(!customer.sms_opt_in);
    }

    #[rstest]
    #[tokio::test]
    async fn query_failures_are_internal() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_list()
            .return_once(|_| Err(CustomerRepositoryError::query("syntax")));
        let err = service(repo)
            .list_customers(CustomerFilter::default())
            .await
            .expect_err("failed");
        assert_eq!(err.code(), ErrorCode::InternalError);
    }
}
