// tests/cron_roundtrip.rs

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use cronchain::cron::{CronBuilder, CronExpression, CronSchedule, DayOfMonth, TimeOfDay, WeekdaySet};

fn time_strategy() -> impl Strategy<Value = TimeOfDay> {
    (0u32..24, 0u32..60).prop_map(|(h, m)| TimeOfDay::new(h, m).unwrap())
}

fn schedule_strategy() -> impl Strategy<Value = CronSchedule> {
    prop_oneof![
        Just(CronSchedule::Hourly),
        time_strategy().prop_map(|at| CronSchedule::Daily { at }),
        (
            time_strategy(),
            proptest::collection::btree_set(0u32..7, 1..=7)
        )
            .prop_map(|(at, days)| CronSchedule::Weekly {
                at,
                days: WeekdaySet::new(days).unwrap(),
            }),
        (time_strategy(), 1u32..=31).prop_map(|(at, day)| CronSchedule::Monthly {
            at,
            day: DayOfMonth::new(day).unwrap(),
        }),
    ]
}

proptest! {
    #[test]
    fn encode_then_decode_is_identity(schedule in schedule_strategy()) {
        let encoded = schedule.encode();
        prop_assert_eq!(CronSchedule::decode(&encoded).unwrap(), schedule.clone());

        let mut builder = CronBuilder::default();
        builder.load(&encoded).unwrap();
        prop_assert_eq!(builder.build(), schedule);
    }

    #[test]
    fn next_after_is_a_later_match(
        schedule in schedule_strategy(),
        offset_minutes in 0i64..(60 * 24 * 400),
    ) {
        let expr: CronExpression = schedule.to_expression();
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::minutes(offset_minutes);

        // Every editor schedule fires at least once a year, even day 31.
        let next = expr.next_after(&start).unwrap();
        prop_assert!(next > start);
        prop_assert!(expr.matches(&next));
    }
}

#[test]
fn decode_prefers_monthly_when_both_days_are_set() {
    let schedule = CronSchedule::decode("0 9 15 * 1,3").unwrap();
    assert_eq!(
        schedule,
        CronSchedule::Monthly {
            at: TimeOfDay::new(9, 0).unwrap(),
            day: DayOfMonth::new(15).unwrap(),
        }
    );
    // The weekday list is lost on the way back.
    assert_eq!(schedule.encode(), "0 9 15 * *");
}
