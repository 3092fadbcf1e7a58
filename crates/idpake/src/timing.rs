//! Wall-clock stage timing for the exchange tools
//!
//! Prints one line per named stage and online/offline totals at the end,
//! mirroring the layout of the measurement output the protocols have always
//! been benchmarked with.

use std::io::Write;
use std::time::{Duration, Instant};

struct Stage {
    started: Instant,
    online: bool,
}

/// Stage timer; a no-op when disabled.
pub struct Stages {
    enabled: bool,
    current: Option<Stage>,
    online: Duration,
    offline: Duration,
}

impl Stages {
    /// Create the timer and print the table header.
    pub fn new(enabled: bool) -> Self {
        if enabled {
            println!("{:<28}    Real-time", "Stage");
            println!("=============================================");
        }
        Stages {
            enabled,
            current: None,
            online: Duration::ZERO,
            offline: Duration::ZERO,
        }
    }

    /// Start an online stage (counted toward the online total).
    pub fn start(&mut self, label: &str) {
        self.start_as(label, true);
    }

    /// Start an offline stage (setup work a deployment would do in advance).
    pub fn start_offline(&mut self, label: &str) {
        self.start_as(label, false);
    }

    fn start_as(&mut self, label: &str, online: bool) {
        self.stop();
        if self.enabled {
            print!("{:<28}: ", label);
            let _ = std::io::stdout().flush();
        }
        self.current = Some(Stage {
            started: Instant::now(),
            online,
        });
    }

    /// Close the running stage, printing its duration.
    pub fn stop(&mut self) {
        if let Some(stage) = self.current.take() {
            let elapsed = stage.started.elapsed();
            if stage.online {
                self.online += elapsed;
            } else {
                self.offline += elapsed;
            }
            if self.enabled {
                println!("{}", format_duration(elapsed));
            }
        }
    }

    /// Close the running stage and print the totals.
    pub fn finish(&mut self) {
        self.stop();
        if self.enabled {
            println!(
                "{:<28}: {}",
                "Total",
                format_duration(self.online + self.offline)
            );
            println!("{:<28}: {}", "Total Online", format_duration(self.online));
        }
    }
}

fn format_duration(d: Duration) -> String {
    format!("{:>11.3} us", d.as_secs_f64() * 1e6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_accumulate() {
        let mut stages = Stages::new(false);
        stages.start_offline("setup");
        stages.start("exchange");
        stages.finish();
        assert!(stages.online >= Duration::ZERO);
        assert!(stages.current.is_none());
    }

    #[test]
    fn test_format() {
        assert_eq!(
            format_duration(Duration::from_micros(1500)),
            "   1500.000 us"
        );
    }
}
