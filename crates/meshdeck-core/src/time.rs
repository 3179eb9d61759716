use chrono::Timelike;

/// Wall-clock label used for telemetry history entries: `H:M:S`, no
/// zero padding (e.g. `9:5:7`).
pub fn clock_label<T: Timelike>(t: &T) -> String {
    format!("{}:{}:{}", t.hour(), t.minute(), t.second())
}

/// Label for the current local time.
pub fn clock_label_now() -> String {
    clock_label(&chrono::Local::now())
}
