/// `HH:MM:SS,mmm` with `,` as the decimal separator.
pub fn format_srt(seconds: f64) -> String {
    format_timestamp(seconds, ',')
}

/// `HH:MM:SS.mmm` with `.` as the decimal separator.
pub fn format_vtt(seconds: f64) -> String {
    format_timestamp(seconds, '.')
}

fn format_timestamp(seconds: f64, sep: char) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).floor() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let s = total_secs % 60;
    let total_mins = total_secs / 60;
    let m = total_mins % 60;
    let h = total_mins / 60;
    format!("{h:02}:{m:02}:{s:02}{sep}{ms:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srt_uses_comma_separator() {
        assert_eq!(format_srt(3661.25), "01:01:01,250");
    }

    #[test]
    fn vtt_uses_dot_separator() {
        assert_eq!(format_vtt(3661.25), "01:01:01.250");
    }

    #[test]
    fn milliseconds_round_down() {
        assert_eq!(format_srt(1.9999), "00:00:01,999");
    }

    #[test]
    fn zero_is_valid() {
        assert_eq!(format_srt(0.0), "00:00:00,000");
    }
}
