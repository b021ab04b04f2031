use crate::shared::*;

/// The 16-week irrigation table: soil moisture and irrigation cost per week,
/// modelled on NASA POWER surface-moisture parameters for a January–April season.
pub fn default_weeks() -> Vec<WeekRecord> {
    let rows: [(u32, &str, f32, u32); CAMPAIGN_WEEKS] = [
        (1, "Jan 7", 0.75, 12_000),
        (2, "Jan 14", 0.68, 15_000),
        (3, "Jan 21", 0.55, 18_000),
        (4, "Jan 28", 0.45, 22_000),
        (5, "Feb 4", 0.72, 13_000),
        (6, "Feb 11", 0.62, 16_000),
        (7, "Feb 18", 0.50, 20_000),
        (8, "Feb 25", 0.38, 25_000),
        (9, "Mar 4", 0.70, 14_000),
        (10, "Mar 11", 0.58, 17_000),
        (11, "Mar 18", 0.48, 21_000),
        (12, "Mar 25", 0.65, 15_000),
        (13, "Apr 1", 0.60, 16_500),
        (14, "Apr 8", 0.52, 19_000),
        (15, "Apr 15", 0.67, 15_500),
        (16, "Apr 22", 0.63, 15_000),
    ];

    rows.iter()
        .map(|&(week, date, moisture, cost)| WeekRecord {
            week,
            date: date.to_string(),
            moisture,
            cost,
        })
        .collect()
}
