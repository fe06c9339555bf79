use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex};
use tracing::warn;
use vipersweep::engine::progress::{Progress, ProgressCallback};
use vipersweep::engine::retry::RowOutcome;

#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
    current_row: Arc<Mutex<String>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0)
            .with_style(Self::bar_style())
            .with_message("Waiting for sweep...");
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
            current_row: Arc::new(Mutex::new(String::new())),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb_clone = self.pb.clone();
        let row_clone = self.current_row.clone();

        Box::new(move |progress: Progress| {
            let (Ok(pb_guard), Ok(mut row_guard)) = (pb_clone.lock(), row_clone.lock()) else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::SweepStart { total_rows } => {
                    pb_guard.reset();
                    pb_guard.set_style(Self::bar_style());
                    pb_guard.set_length(total_rows);
                    pb_guard.set_position(0);
                }
                Progress::RowStart { index: _, directory } => {
                    *row_guard = directory.clone();
                    pb_guard.set_message(directory);
                }
                Progress::AttemptStart { dt } => {
                    pb_guard.set_message(format!("{} [dt {}]", *row_guard, dt));
                }
                Progress::RowFinish { outcome } => {
                    if outcome == RowOutcome::Skipped {
                        pb_guard.println(format!("  skipped {}", *row_guard));
                    }
                    pb_guard.inc(1);
                }
                Progress::SweepFinish => {
                    pb_guard.finish_with_message("✓ Done");
                }
                Progress::Message(msg) => {
                    if !pb_guard.is_finished() {
                        pb_guard.println(format!("  {}", msg));
                    } else {
                        pb_guard.set_message(msg);
                    }
                }
            }
        })
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("Failed to create bar style template")
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_initializes_in_a_clean_state() {
        let handler = CliProgressHandler::new();
        let pb = handler.pb.lock().unwrap();
        assert_eq!(pb.length(), Some(0));
        assert!(pb.is_finished());
    }

    #[test]
    fn callback_tracks_rows_through_the_sweep() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        callback(Progress::SweepStart { total_rows: 2 });
        {
            let pb = handler.pb.lock().unwrap();
            assert_eq!(pb.length(), Some(2));
            assert_eq!(pb.position(), 0);
        }

        callback(Progress::RowStart {
            index: 0,
            directory: "1_Re200_mfine_N7_A0.1_o0.5_b1_dt0.01".to_string(),
        });
        callback(Progress::AttemptStart { dt: 0.01 });
        {
            let pb = handler.pb.lock().unwrap();
            assert_eq!(
                pb.message(),
                "1_Re200_mfine_N7_A0.1_o0.5_b1_dt0.01 [dt 0.01]"
            );
        }

        callback(Progress::RowFinish {
            outcome: RowOutcome::Success,
        });
        {
            let pb = handler.pb.lock().unwrap();
            assert_eq!(pb.position(), 1);
        }

        callback(Progress::SweepFinish);
        {
            let pb = handler.pb.lock().unwrap();
            assert!(pb.is_finished());
            assert_eq!(pb.message(), "✓ Done");
        }
    }

    #[test]
    fn callback_is_thread_safe() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        std::thread::spawn(move || {
            callback(Progress::SweepStart { total_rows: 1 });
            callback(Progress::RowFinish {
                outcome: RowOutcome::Success,
            });
            callback(Progress::SweepFinish);
        })
        .join()
        .unwrap();

        let pb = handler.pb.lock().unwrap();
        assert!(pb.is_finished());
        assert_eq!(pb.message(), "✓ Done");
    }
}
