//! Polled autosave scheduler.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Project;
use crate::core::Clock;
use crate::util::Error;

/// Length of one autosave period unit.
pub const AUTOSAVE_PERIOD_SCALE: Duration = Duration::from_secs(60);

/// Autosave settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    /// Period in minutes, 0 disables autosave.
    pub period_minutes: u32,
    /// Save straight to the project file instead of asking for a name.
    pub silent: bool,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self { period_minutes: 15, silent: true }
    }
}

impl AutosaveConfig {
    /// Disabled autosave.
    pub fn disabled() -> Self {
        Self { period_minutes: 0, ..Default::default() }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.period_minutes > 0
    }

    /// Time between attempts, `None` when disabled.
    pub fn interval(&self) -> Option<Duration> {
        self.is_enabled().then(|| AUTOSAVE_PERIOD_SCALE * self.period_minutes)
    }
}

/// Interactive "save as" flow supplied by the host.
pub trait AutosavePrompt {
    /// Ask the user for a file and save there. Returns false if dismissed.
    fn save_as(&mut self, project: &mut Project) -> bool;
}

/// Prompt that is always dismissed.
#[derive(Debug, Default, Clone, Copy)]
pub struct DismissPrompt;

impl AutosavePrompt for DismissPrompt {
    fn save_as(&mut self, _project: &mut Project) -> bool {
        false
    }
}

/// Which save an elapsed deadline asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutosaveAction {
    Silent,
    Prompt,
}

/// What a call to [`Project::tick_autosave`] did.
#[derive(Debug)]
pub enum AutosaveOutcome {
    /// Nothing due.
    Idle,
    /// Silent save succeeded.
    Saved,
    /// Silent save failed; retried after the next period.
    Failed(Error),
    /// The host prompt ran.
    Prompted { saved: bool },
}

/// Deadline bookkeeping for autosave.
///
/// Every reschedule starts from the current clock reading, never from the
/// previous deadline.
pub struct Autosave {
    config: AutosaveConfig,
    clock: Box<dyn Clock>,
    deadline: Option<Duration>,
}

impl Autosave {
    pub fn new(config: AutosaveConfig, clock: Box<dyn Clock>) -> Self {
        Self { config, clock, deadline: None }
    }

    #[inline]
    pub fn config(&self) -> AutosaveConfig {
        self.config
    }

    /// Replace the settings. An enabled config restarts the countdown.
    pub fn set_config(&mut self, config: AutosaveConfig) {
        self.config = config;
        self.reschedule();
    }

    /// Next deadline as a clock reading.
    #[inline]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Push the deadline to now + interval. No-op while disabled.
    pub fn reschedule(&mut self) {
        if let Some(interval) = self.config.interval() {
            let deadline = self.clock.now() + interval;
            tracing::trace!(?deadline, "autosave scheduled");
            self.deadline = Some(deadline);
        }
    }

    /// Save requested by the deadline, if any.
    pub fn due(&self, changed: bool) -> Option<AutosaveAction> {
        if !changed || !self.config.is_enabled() {
            return None;
        }
        let deadline = self.deadline?;
        if self.clock.now() < deadline {
            return None;
        }
        Some(if self.config.silent { AutosaveAction::Silent } else { AutosaveAction::Prompt })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use std::rc::Rc;

    fn scheduler(config: AutosaveConfig) -> (Autosave, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::default());
        (Autosave::new(config, Box::new(clock.clone())), clock)
    }

    #[test]
    fn test_interval() {
        assert_eq!(AutosaveConfig::disabled().interval(), None);
        let cfg = AutosaveConfig { period_minutes: 2, silent: false };
        assert_eq!(cfg.interval(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_reschedule_from_now() {
        let (mut auto, clock) = scheduler(AutosaveConfig { period_minutes: 1, silent: true });
        clock.set(Duration::from_secs(10));
        auto.reschedule();
        assert_eq!(auto.deadline(), Some(Duration::from_secs(70)));

        clock.set(Duration::from_secs(500));
        auto.reschedule();
        assert_eq!(auto.deadline(), Some(Duration::from_secs(560)));
    }

    #[test]
    fn test_disabled_never_schedules() {
        let (mut auto, _clock) = scheduler(AutosaveConfig::disabled());
        auto.reschedule();
        assert_eq!(auto.deadline(), None);
        assert_eq!(auto.due(true), None);
    }

    #[test]
    fn test_due_needs_changes_and_deadline() {
        let (mut auto, clock) = scheduler(AutosaveConfig { period_minutes: 1, silent: false });
        auto.reschedule();
        assert_eq!(auto.due(true), None);

        clock.advance(AUTOSAVE_PERIOD_SCALE);
        assert_eq!(auto.due(false), None);
        assert_eq!(auto.due(true), Some(AutosaveAction::Prompt));
    }

    #[test]
    fn test_set_config_restarts() {
        let (mut auto, clock) = scheduler(AutosaveConfig::disabled());
        clock.set(Duration::from_secs(30));
        auto.set_config(AutosaveConfig { period_minutes: 3, silent: true });
        assert_eq!(auto.deadline(), Some(Duration::from_secs(210)));
    }
}
