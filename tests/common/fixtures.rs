use fluxtidy::datamodel::{Point, TidyDateTime, TidyDateTimeExt};

/// 2024-01-01T00:00:00Z in nanoseconds.
pub const JAN_1_2024_NS: i64 = 1_704_067_200_000_000_000;

const MINUTE_NS: i64 = 60_000_000_000;

/// A small home-automation database with every kind of problem:
/// a sparse twin (`temp_kitchen_old`), a busy measurement with many tags
/// (`energy_meter`) and a healthy one (`cpu_load`).
pub fn home_database() -> String {
    let mut lines = Vec::new();
    for i in 0..12 {
        lines.push(format!(
            "temp_kitchen,tag_room=kitchen value={} {}",
            20.0 + i as f64 / 10.0,
            JAN_1_2024_NS + i * MINUTE_NS
        ));
    }
    for i in 0..3 {
        lines.push(format!(
            "temp_kitchen_old,tag_room=kitchen value={} {}",
            18.0 + i as f64,
            JAN_1_2024_NS + i * MINUTE_NS
        ));
    }
    for i in 0..120 {
        lines.push(format!(
            "energy_meter,tag_site=home,tag_phase={},tag_circuit=c{},tag_meter=m1 watts={} {}",
            i % 3,
            i % 4,
            100 + i,
            JAN_1_2024_NS + i * MINUTE_NS
        ));
    }
    for i in 0..40 {
        lines.push(format!(
            "cpu_load,tag_host=server load={} {}",
            0.5 + (i % 5) as f64 / 10.0,
            JAN_1_2024_NS + i * MINUTE_NS
        ));
    }
    lines.join("\n")
}

/// Three measurements with disjoint timestamps, for merge laws.
pub fn three_sources() -> String {
    let mut lines = Vec::new();
    for (offset, name) in ["alpha", "beta", "gamma"].iter().enumerate() {
        for i in 0..4_i64 {
            lines.push(format!(
                "{},tag_room=r{} value={},raw={}i {}",
                name,
                i % 2,
                i as f64 * 1.5,
                i,
                JAN_1_2024_NS + (offset as i64 * 100 + i) * MINUTE_NS
            ));
        }
    }
    lines.join("\n")
}

/// One measurement split across three rooms and two floors.
pub fn climate() -> String {
    let mut lines = Vec::new();
    for i in 0..30_i64 {
        let room = ["kitchen", "garage", "attic"][(i % 3) as usize];
        lines.push(format!(
            "climate,tag_room={},tag_floor={} temperature={},humidity={}i {}",
            room,
            i % 2,
            15.0 + i as f64 / 2.0,
            40 + i,
            JAN_1_2024_NS + (i / 3) * MINUTE_NS
        ));
    }
    lines.join("\n")
}

/// `count` one-field points, one per minute, starting on 2020-01-01.
pub fn dense_history(measurement: &str, count: i64) -> Vec<Point> {
    let start = 1_577_836_800_i64;
    (0..count)
        .map(|i| {
            Point::new(
                measurement,
                TidyDateTime::from_unix_seconds_i64(start + i * 60),
            )
            .field("reading", i as f64)
        })
        .collect()
}
