//! PostgreSQL-backed `CustomerRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{CustomerRepository, CustomerRepositoryError};
use crate::domain::{Channel, Customer, CustomerFilter, CustomerId, PageRequest};

use super::diesel_helpers::{page_window, repository_error_mapping};
use super::models::{CustomerRow, decode_rows};
use super::pool::DbPool;
use super::schema::customers;

/// Diesel-backed implementation of the `CustomerRepository` port.
#[derive(Clone)]
pub struct DieselCustomerRepository {
    pool: DbPool,
}

impl DieselCustomerRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

repository_error_mapping!(CustomerRepositoryError);

/// Escape `LIKE` metacharacters so user input matches literally.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl CustomerRepository for DieselCustomerRepository {
    async fn create(&self, customer: &Customer) -> Result<(), CustomerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(customers::table)
            .values(CustomerRow::from(customer))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &CustomerId,
    ) -> Result<Option<Customer>, CustomerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<CustomerRow> = customers::table
            .find(*id.as_uuid())
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(Customer::try_from).transpose().map_err(decode_error)
    }

    async fn list(&self, filter: &CustomerFilter) -> Result<Vec<Customer>, CustomerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let (limit, offset) = page_window(&filter.page);

        let mut query = customers::table
            .select(CustomerRow::as_select())
            .order((customers::name.asc(), customers::id.asc()))
            .limit(limit)
            .offset(offset)
            .into_boxed();
        if !filter.include_archived {
            query = query.filter(customers::archived.eq(false));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = like_pattern(search.trim());
            query = query.filter(
                customers::name
                    .ilike(pattern.clone())
                    .or(customers::email.ilike(pattern)),
            );
        }

        let rows: Vec<CustomerRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        decode_rows(rows).map_err(decode_error)
    }

    async fn update(&self, customer: &Customer) -> Result<(), CustomerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(customers::table.find(*customer.id.as_uuid()))
            .set(CustomerRow::from(customer))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if updated == 0 {
            return Err(CustomerRepositoryError::query("customer not found for update"));
        }
        Ok(())
    }

    async fn list_contactable(
        &self,
        channel: Channel,
        page: &PageRequest,
    ) -> Result<Vec<Customer>, CustomerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let (limit, offset) = page_window(page);

        let query = customers::table
            .filter(customers::archived.eq(false))
            .select(CustomerRow::as_select())
            .order(customers::id.asc())
            .limit(limit)
            .offset(offset)
            .into_boxed();
        let query = match channel {
            Channel::Email => query.filter(customers::email_opt_in.eq(true)),
            Channel::Sms => query.filter(customers::sms_opt_in.eq(true)),
        };

        let rows: Vec<CustomerRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        decode_rows(rows).map_err(decode_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ann", "%ann%")]
    #[case("50%", "%50\\%%")]
    #[case("a_b", "%a\\_b%")]
    fn search_terms_are_escaped(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(like_pattern(input), expected);
    }
}
