//! Review request sequencing.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::customer_service::require_customer;
use crate::domain::ports::{
    Communications, CustomerRepository, ReviewRepository, ReviewRepositoryError, ReviewRequests,
};
use crate::domain::{
    Customer, Error, Job, MessageDraft, MessagePurpose, ReviewError, ReviewFilter, ReviewPolicy,
    ReviewRequest, ReviewRequestId, ReviewStep, ReviewSubmission,
};

fn map_review_error(error: ReviewRepositoryError) -> Error {
    match error {
        ReviewRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("review repository unavailable: {message}"))
        }
        ReviewRepositoryError::Query { message } => {
            Error::internal(format!("review repository error: {message}"))
        }
        ReviewRepositoryError::DuplicateJob { job_id } => {
            Error::conflict(format!("review request already exists for job {job_id}"))
        }
    }
}

fn map_rule_error(error: ReviewError) -> Error {
    match error {
        ReviewError::Closed { .. } => Error::conflict(error.to_string()),
        ReviewError::InvalidRating | ReviewError::CommentTooLong { .. } => {
            Error::invalid_request(error.to_string())
        }
    }
}

fn review_message(review: &ReviewRequest, customer: &Customer, step: ReviewStep) -> MessageDraft {
    let opening = match step {
        ReviewStep::SendReminder => "A quick reminder: we'd still love your feedback.",
        _ => "Thanks for choosing us!",
    };
    MessageDraft {
        customer_id: review.customer_id,
        channel: customer.preferred_channel(),
        purpose: MessagePurpose::ReviewRequest,
        subject: Some("How did we do?".to_owned()),
        body: format!(
            "Hi {}, {opening} Please rate your recent clean from 1 to 5 (review {}).",
            customer.name, review.id
        ),
    }
}

/// Review service implementing the review requests port.
#[derive(Clone)]
pub struct ReviewService<R, C> {
    reviews: Arc<R>,
    customers: Arc<C>,
    messages: Arc<dyn Communications>,
    policy: ReviewPolicy,
    clock: Arc<dyn Clock>,
}

impl<R, C> ReviewService<R, C> {
    /// Create the service over its repositories and collaborators.
    pub fn new(
        reviews: Arc<R>,
        customers: Arc<C>,
        messages: Arc<dyn Communications>,
        policy: ReviewPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reviews,
            customers,
            messages,
            policy,
            clock,
        }
    }
}

impl<R, C> ReviewService<R, C>
where
    R: ReviewRepository,
    C: CustomerRepository,
{
    async fn require_review(&self, id: ReviewRequestId) -> Result<ReviewRequest, Error> {
        self.reviews
            .find_by_id(&id)
            .await
            .map_err(map_review_error)?
            .ok_or_else(|| Error::not_found(format!("review request {id} not found")))
    }
}

#[async_trait]
impl<R, C> ReviewRequests for ReviewService<R, C>
where
    R: ReviewRepository,
    C: CustomerRepository,
{
    async fn schedule_for_job(&self, job: &Job) -> Result<Option<ReviewRequest>, Error> {
        let Some(completed_at) = job.completed_at else {
            return Err(Error::invalid_request(format!(
                "job {} has not been completed",
                job.id
            )));
        };
        let review = ReviewRequest::schedule(job.customer_id, job.id, completed_at, &self.policy);
        match self.reviews.create(&review).await {
            Ok(()) => {
                tracing::info!(review_id = %review.id, job_id = %job.id, "review request scheduled");
                Ok(Some(review))
            }
            Err(ReviewRepositoryError::DuplicateJob { .. }) => Ok(None),
            Err(error) => Err(map_review_error(error)),
        }
    }

    async fn get_review(&self, id: ReviewRequestId) -> Result<ReviewRequest, Error> {
        self.require_review(id).await
    }

    async fn list_reviews(&self, filter: ReviewFilter) -> Result<Vec<ReviewRequest>, Error> {
        self.reviews.list(&filter).await.map_err(map_review_error)
    }

    async fn submit_review(
        &self,
        id: ReviewRequestId,
        rating: i16,
        comment: Option<String>,
    ) -> Result<ReviewSubmission, Error> {
        let mut review = self.require_review(id).await?;
        let invite_public_review = review
            .submit(rating, comment, self.clock.utc())
            .map_err(map_rule_error)?;
        self.reviews
            .update(&review)
            .await
            .map_err(map_review_error)?;
        tracing::info!(review_id = %review.id, rating, "review submitted");
        Ok(ReviewSubmission {
            review,
            invite_public_review,
        })
    }

    async fn advance_due(&self, limit: u32) -> Result<u32, Error> {
        let now = self.clock.utc();
        let due = self
            .reviews
            .list_due(now, limit)
            .await
            .map_err(map_review_error)?;
        let mut processed = 0;
        for mut review in due {
            let Some(step) = review.next_step(&self.policy) else {
                continue;
            };
            if step != ReviewStep::Expire {
                let customer = require_customer(self.customers.as_ref(), review.customer_id).await?;
                self.messages
                    .enqueue(review_message(&review, &customer, step))
                    .await?;
            }
            review.apply_step(step, now, &self.policy);
            self.reviews
                .update(&review)
                .await
                .map_err(map_review_error)?;
            processed += 1;
        }
        Ok(processed)
    }
}
