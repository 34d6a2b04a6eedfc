use std::time::{Duration, Instant};

const INTERVAL: Duration = Duration::from_secs(1);

/// Prints conversion progress to stderr at most once per second.
pub struct Progress {
    block_size: u64,
    start: Instant,
    last: Option<Instant>,
}

impl Progress {
    pub fn new(block_size: u32) -> Self {
        Self {
            block_size: block_size as u64,
            start: Instant::now(),
            last: None,
        }
    }

    pub fn update(&mut self, done: u64, total: u64) {
        let now = Instant::now();
        if done != total && self.last.map_or(false, |x| now - x < INTERVAL) {
            return;
        }
        self.last = Some(now);

        let elapsed = now.duration_since(self.start).as_secs_f64();
        let transferred = done * self.block_size;
        let bytes_per_second = if elapsed > 0.0 {
            (transferred as f64 / elapsed).round() as u64
        } else {
            0
        };
        display_progress(transferred, total * self.block_size, bytes_per_second);
    }
}

fn display_progress(transferred: u64, total: u64, bytes_per_second: u64) {
    let left = total - transferred;
    let time_left = left / bytes_per_second.max(1);

    let minutes_left = time_left / 60;
    let seconds_left = time_left % 60;

    let percent = if total == 0 {
        100f32
    } else {
        transferred as f32 * 100f32 / total as f32
    };

    eprintln!(
        "{:.2}% done ({} out of {}) transferred at {}/s ETA {:02}:{:02}",
        percent,
        transferred,
        total,
        super::size_to_string(bytes_per_second),
        minutes_left,
        seconds_left
    );
}
