//! Row conversion coverage for the persistence models.

use chrono::Duration;
use rstest::rstest;

use super::*;
use crate::domain::test_fixtures::{fixture_now, sample_customer, sample_job};
use crate::domain::{JobStatus, LoyaltyTier, PromotionDraft, PromotionId};

#[rstest]
fn customer_zone_is_stored_by_name() {
    let mut customer = sample_customer();
    customer.time_zone = Some(chrono_tz::Europe::London);

    let row = CustomerRow::from(&customer);
    assert_eq!(row.time_zone.as_deref(), Some("Europe/London"));

    let decoded = Customer::try_from(row).expect("decodes");
    assert_eq!(decoded, customer);
}

#[rstest]
fn unknown_zone_is_a_decode_error() {
    let mut row = CustomerRow::from(&sample_customer());
    row.time_zone = Some("Mars/Olympus_Mons".into());

    let error = Customer::try_from(row).expect_err("bad zone");
    assert_eq!(
        error,
        RowDecodeError::new("customers.time_zone", "Mars/Olympus_Mons")
    );
}

#[rstest]
fn job_status_is_stored_as_text() {
    let job = sample_job(sample_customer().id);
    let row = JobRow::from(&job);
    assert_eq!(row.status, "scheduled");
    assert_eq!(row.service_type, "standard");
}

#[rstest]
#[case("paused")]
#[case("SCHEDULED")]
fn unknown_job_status_is_rejected(#[case] stored: &str) {
    let mut row = JobRow::from(&sample_job(sample_customer().id));
    row.status = stored.into();

    let error = Job::try_from(row).expect_err("bad status");
    assert!(error.to_string().contains("jobs.status"));
}

#[rstest]
fn completed_job_keeps_completion_time() {
    let mut job = sample_job(sample_customer().id);
    job.status = JobStatus::Completed;
    job.completed_at = Some(fixture_now());

    let decoded = Job::try_from(JobRow::from(&job)).expect("decodes");
    assert_eq!(decoded.completed_at, Some(fixture_now()));
}

fn promotion(min_tier: Option<LoyaltyTier>) -> Promotion {
    let now = fixture_now();
    Promotion::create(
        PromotionId::random(),
        PromotionDraft {
            code: "spring25".into(),
            description: "Spring clean".into(),
            discount: Discount::Percent(25),
            starts_at: now,
            ends_at: now + Duration::days(30),
            max_redemptions: Some(100),
            min_tier,
        },
        now,
    )
    .expect("valid promotion")
}

#[rstest]
fn promotion_discount_splits_into_kind_and_value() {
    let row = PromotionRow::from(&promotion(Some(LoyaltyTier::Silver)));
    assert_eq!(row.code, "SPRING25");
    assert_eq!(row.discount_kind, "percent");
    assert_eq!(row.discount_value, 25);
    assert_eq!(row.min_tier.as_deref(), Some("silver"));
}

#[rstest]
fn promotion_round_trips_through_its_row() {
    let original = promotion(None);
    let decoded = Promotion::try_from(PromotionRow::from(&original)).expect("decodes");
    assert_eq!(decoded, original);
}

#[rstest]
fn unknown_discount_kind_is_rejected() {
    let mut row = PromotionRow::from(&promotion(None));
    row.discount_kind = "bogo".into();

    let error = Promotion::try_from(row).expect_err("bad kind");
    assert_eq!(error, RowDecodeError::new("promotions.discount_kind", "bogo"));
}

#[rstest]
fn negative_score_is_rejected() {
    let now = fixture_now();
    let row = OpportunityRow {
        id: uuid::Uuid::new_v4(),
        customer_id: uuid::Uuid::new_v4(),
        kind: "rebook".into(),
        status: "open".into(),
        score: -1,
        estimated_value_cents: 0,
        notes: None,
        expires_at: None,
        contacted_at: None,
        closed_at: None,
        created_at: now,
        updated_at: now,
    };

    let error = Opportunity::try_from(row).expect_err("bad score");
    assert_eq!(error, RowDecodeError::new("opportunities.score", "-1"));
}

#[rstest]
fn decode_rows_stops_at_the_first_bad_row() {
    let good = JobRow::from(&sample_job(sample_customer().id));
    let mut bad = good.clone();
    bad.service_type = "windows".into();

    let result: Result<Vec<Job>, _> = decode_rows(vec![good, bad]);
    assert!(result.is_err());
}
