//! Quiet-hours gate swept across a full year in zones with and without
//! daylight saving.

use chrono::{DateTime, Duration, LocalResult, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use crm_backend::domain::{QuietHours, SendDecision};
use rstest::rstest;

const STEP_MINUTES: i64 = 7;

fn sweep() -> impl Iterator<Item = DateTime<Utc>> {
    let start = Utc
        .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .expect("valid start");
    let end = Utc
        .with_ymd_and_hms(2027, 1, 1, 0, 0, 0)
        .single()
        .expect("valid end");
    std::iter::successors(Some(start), |t| Some(*t + Duration::minutes(STEP_MINUTES)))
        .take_while(move |t| *t < end)
}

#[rstest]
#[case(chrono_tz::America::New_York)]
#[case(chrono_tz::Europe::London)]
#[case(chrono_tz::Australia::Sydney)]
#[case(chrono_tz::Asia::Kolkata)]
#[case(chrono_tz::UTC)]
fn resume_time_is_the_next_local_window_end(#[case] zone: Tz) {
    let quiet = QuietHours::evening_to_morning(zone);
    let eight = NaiveTime::from_hms_opt(8, 0, 0).expect("valid time");

    for now in sweep() {
        match (quiet.is_quiet(now), quiet.decide(now)) {
            (true, SendDecision::DeferUntil(resume)) => {
                assert!(resume > now, "{now}: resume {resume} not in the future");
                assert!(!quiet.is_quiet(resume), "{now}: resume {resume} still quiet");
                assert_eq!(resume.with_timezone(&zone).time(), eight, "{now}");
                assert!(resume - now <= Duration::hours(12), "{now}: resume {resume} too far");
            }
            (false, SendDecision::SendNow) => {
                assert!(quiet.next_allowed(now).is_none(), "{now}");
            }
            (quiet_now, decision) => panic!("{now}: quiet={quiet_now} but {decision:?}"),
        }
    }
}

#[rstest]
#[case("America/New_York")]
#[case("Europe/London")]
fn window_ending_inside_the_repeated_hour_still_resumes_later(#[case] zone: &str) {
    let quiet = QuietHours::parse("22:00", "01:30", zone).expect("valid window");
    let tz: Tz = zone.parse().expect("known zone");
    let half_past_one = NaiveTime::from_hms_opt(1, 30, 0).expect("valid time");

    for now in sweep() {
        if let Some(resume) = quiet.next_allowed(now) {
            assert!(resume > now, "{now}: resume {resume} not in the future");
            assert!(!quiet.is_quiet(resume), "{now}: resume {resume} still quiet");
            let local = resume.with_timezone(&tz);
            let skipped = matches!(
                tz.from_local_datetime(&local.date_naive().and_time(half_past_one)),
                LocalResult::None
            );
            assert!(local.time() == half_past_one || skipped, "{now}: resume {local}");
        }
    }
}

#[rstest]
#[case("08:00:00", false)]
#[case("07:59:59", true)]
#[case("21:00:00", true)]
#[case("20:59:59", false)]
#[case("00:00:00", true)]
#[case("12:00:00", false)]
fn window_boundaries(#[case] local: &str, #[case] expected: bool) {
    let zone = chrono_tz::Europe::Paris;
    let quiet = QuietHours::evening_to_morning(zone);
    let time = NaiveTime::parse_from_str(local, "%H:%M:%S").expect("valid time");
    let instant = zone
        .from_local_datetime(
            &chrono::NaiveDate::from_ymd_opt(2026, 9, 14)
                .expect("valid date")
                .and_time(time),
        )
        .single()
        .expect("unambiguous")
        .with_timezone(&Utc);

    assert_eq!(quiet.is_quiet(instant), expected, "{local}");
}

#[rstest]
fn non_wrapping_window_in_the_afternoon() {
    let quiet = QuietHours::parse("12:00", "14:00", "UTC").expect("valid window");
    let lunch = Utc
        .with_ymd_and_hms(2026, 3, 2, 13, 30, 0)
        .single()
        .expect("valid instant");
    assert_eq!(
        quiet.next_allowed(lunch),
        Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).single()
    );
    assert!(!quiet.is_quiet(lunch + Duration::minutes(30)));
}
