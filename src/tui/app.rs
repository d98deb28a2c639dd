use crate::engine::endpoint::Endpoint;
use crate::engine::types::*;

/// Current phase of the speed test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connecting,
    Selecting,
    Latency,
    Download,
    Upload,
    ConnectionInfo,
    Results,
    Aborted,
    Failed,
}

impl From<Stage> for Phase {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::ServerSelection => Phase::Selecting,
            Stage::Latency => Phase::Latency,
            Stage::Download => Phase::Download,
            Stage::Upload => Phase::Upload,
            Stage::ConnectionInfo => Phase::ConnectionInfo,
        }
    }
}

/// TUI application state, updated by consuming SessionEvents.
pub struct App {
    pub phase: Phase,
    pub status: String,
    pub server: Option<Endpoint>,

    /// Progress within the current stage, 0-100.
    pub stage_percent: f64,

    // Latency
    pub latency_total: u32,
    /// Running-average ping after each probe, at most one per probe.
    pub ping_averages: Vec<f64>,
    pub ping: Option<f64>,
    pub jitter: Option<f64>,

    // Throughput
    pub current_test_type: Option<TestType>,
    pub current_mbps: f64,
    pub chart_data: Vec<f64>,
    /// `chart_data` index and credited rate of each finished trial.
    pub trial_marks: Vec<(usize, f64)>,
    pub trials_done: u32,
    pub trials_total: u32,
    pub current_size_mb: Option<f64>,
    pub download_trials: u32,
    pub upload_trials: u32,

    pub report: Option<SessionReport>,
    pub errors: Vec<String>,

    pub should_quit: bool,
}

impl App {
    pub fn new(config: &SpeedTestConfig) -> Self {
        Self::with_totals(
            config.latency_probes,
            config.download_sizes_mb.len() as u32,
            config.upload_sizes_mb.len() as u32,
        )
    }

    fn with_totals(latency_total: u32, download_trials: u32, upload_trials: u32) -> Self {
        Self {
            phase: Phase::Connecting,
            status: "Starting...".to_string(),
            server: None,
            stage_percent: 0.0,
            latency_total,
            ping_averages: Vec::new(),
            ping: None,
            jitter: None,
            current_test_type: None,
            current_mbps: 0.0,
            chart_data: Vec::new(),
            trial_marks: Vec::new(),
            trials_done: 0,
            trials_total: 0,
            current_size_mb: None,
            download_trials,
            upload_trials,
            report: None,
            errors: Vec::new(),
            should_quit: false,
        }
    }

    /// Forget the previous session before a new one starts.
    pub fn reset(&mut self) {
        let should_quit = self.should_quit;
        *self = Self {
            should_quit,
            ..Self::with_totals(self.latency_total, self.download_trials, self.upload_trials)
        };
    }

    /// True once the session has ended one way or another.
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Results | Phase::Aborted | Phase::Failed)
    }

    /// Process a session event and update state.
    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::StageChanged(stage) => {
                self.phase = Phase::from(stage);
                self.status = stage.description().to_string();
                self.stage_percent = 0.0;
                let test_type = match stage {
                    Stage::Download => Some(TestType::Download),
                    Stage::Upload => Some(TestType::Upload),
                    _ => None,
                };
                if let Some(test_type) = test_type {
                    self.current_test_type = Some(test_type);
                    self.current_mbps = 0.0;
                    self.chart_data.clear();
                    self.trial_marks.clear();
                    self.trials_done = 0;
                    self.current_size_mb = None;
                    self.trials_total = match test_type {
                        TestType::Download => self.download_trials,
                        TestType::Upload => self.upload_trials,
                    };
                }
            }
            SessionEvent::Progress { percent, .. } => {
                self.stage_percent = percent;
            }
            SessionEvent::Realtime { metric, value } => match metric {
                Metric::Download | Metric::Upload => {
                    self.current_mbps = value;
                    self.chart_data.push(value);
                }
                Metric::Ping => {
                    self.ping = Some(value);
                    // the closing summary repeats the final average
                    if self.ping_averages.len() < self.latency_total as usize {
                        self.ping_averages.push(value);
                    }
                }
                Metric::Jitter => self.jitter = Some(value),
            },
            SessionEvent::ServerSelected(endpoint) => {
                self.server = Some(endpoint);
            }
            SessionEvent::TrialFinished {
                size_mb,
                mbps,
                index,
                total,
                ..
            } => {
                self.trial_marks.push((self.chart_data.len(), mbps));
                self.current_size_mb = Some(size_mb);
                self.trials_done = index;
                self.trials_total = total;
                self.stage_percent = 0.0;
            }
            SessionEvent::Complete(report) => {
                self.ping = Some(report.results.ping);
                self.jitter = Some(report.results.jitter);
                self.report = Some(*report);
                self.phase = Phase::Results;
                self.status = "Complete".to_string();
            }
            SessionEvent::Error(msg) => {
                self.status = format!("Error: {msg}");
                self.errors.push(msg);
                self.phase = Phase::Failed;
            }
            SessionEvent::Aborted => {
                self.phase = Phase::Aborted;
                self.status = "Aborted".to_string();
            }
        }
    }

    /// Current overall progress as fraction (0.0..1.0).
    pub fn overall_progress(&self) -> f64 {
        let stage = (self.stage_percent / 100.0).clamp(0.0, 1.0);
        let trials = if self.trials_total == 0 {
            0.0
        } else {
            ((self.trials_done as f64 + stage) / self.trials_total as f64).min(1.0)
        };
        match self.phase {
            Phase::Connecting | Phase::Selecting | Phase::Aborted | Phase::Failed => 0.0,
            Phase::Latency => 0.05 + stage * 0.15,
            Phase::Download => 0.2 + trials * 0.4,
            Phase::Upload => 0.6 + trials * 0.35,
            Phase::ConnectionInfo => 0.95,
            Phase::Results => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::report;

    fn app() -> App {
        App::new(&SpeedTestConfig::default())
    }

    #[test]
    fn test_download_stage_tracks_trials() {
        let mut app = app();
        app.handle_event(SessionEvent::StageChanged(Stage::Download));
        assert_eq!(app.phase, Phase::Download);
        assert_eq!(app.trials_total, 4);
        assert_eq!(app.overall_progress(), 0.2);

        app.handle_event(SessionEvent::Realtime {
            metric: Metric::Download,
            value: 48.0,
        });
        app.handle_event(SessionEvent::TrialFinished {
            test_type: TestType::Download,
            size_mb: 1.0,
            mbps: 50.0,
            index: 1,
            total: 4,
        });
        app.handle_event(SessionEvent::Progress {
            percent: 50.0,
            stage: Stage::Download,
        });

        assert_eq!(app.current_mbps, 48.0);
        assert_eq!(app.chart_data, vec![48.0]);
        assert_eq!(app.trial_marks, vec![(1, 50.0)]);
        assert!((app.overall_progress() - (0.2 + 1.5 / 4.0 * 0.4)).abs() < 1e-9);
    }

    #[test]
    fn test_upload_stage_resets_chart() {
        let mut app = app();
        app.handle_event(SessionEvent::StageChanged(Stage::Download));
        app.handle_event(SessionEvent::Realtime {
            metric: Metric::Download,
            value: 90.0,
        });
        app.handle_event(SessionEvent::StageChanged(Stage::Upload));
        assert_eq!(app.current_test_type, Some(TestType::Upload));
        assert!(app.chart_data.is_empty());
        assert!(app.trial_marks.is_empty());
        assert_eq!(app.trials_total, 3);
    }

    #[test]
    fn test_latency_updates() {
        let mut app = app();
        app.handle_event(SessionEvent::StageChanged(Stage::Latency));
        app.handle_event(SessionEvent::Realtime {
            metric: Metric::Ping,
            value: 21.0,
        });
        app.handle_event(SessionEvent::Realtime {
            metric: Metric::Jitter,
            value: 3.0,
        });
        assert_eq!(app.ping, Some(21.0));
        assert_eq!(app.jitter, Some(3.0));
        assert_eq!(app.ping_averages, vec![21.0]);
    }

    #[test]
    fn test_closing_ping_summary_is_not_plotted() {
        let mut app = App::with_totals(2, 1, 1);
        app.handle_event(SessionEvent::StageChanged(Stage::Latency));
        for value in [30.0, 26.0, 26.0] {
            app.handle_event(SessionEvent::Realtime {
                metric: Metric::Ping,
                value,
            });
        }
        assert_eq!(app.ping_averages, vec![30.0, 26.0]);
        assert_eq!(app.ping, Some(26.0));
    }

    #[test]
    fn test_terminal_events() {
        let mut app = app();
        app.handle_event(SessionEvent::Complete(Box::new(report())));
        assert_eq!(app.phase, Phase::Results);
        assert!(app.is_finished());
        assert_eq!(app.overall_progress(), 1.0);

        app.reset();
        assert_eq!(app.phase, Phase::Connecting);
        assert!(app.report.is_none());

        app.handle_event(SessionEvent::Aborted);
        assert_eq!(app.phase, Phase::Aborted);
        assert!(app.errors.is_empty());

        app.reset();
        app.handle_event(SessionEvent::Error("no endpoints configured".to_string()));
        assert_eq!(app.phase, Phase::Failed);
        assert_eq!(app.errors.len(), 1);
    }
}
