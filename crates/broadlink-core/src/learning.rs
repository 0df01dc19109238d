//! Learning-mode state machine for RM-family IR/RF capture.
//!
//! This is advisory, caller-side bookkeeping - the device itself enforces
//! ordering and answers a premature poll with `0xFFF6` ("not ready"). What
//! this state machine buys a caller is: it rejects an operation issued out
//! of order *before* a UDP round-trip, and it owns the capture-timeout
//! clock so polling code doesn't have to.
//!
//! States: `Idle -> IrArmed -> IrCaptured`, or
//! `Idle -> RfSweeping -> RfLocked -> RfArmed -> RfCaptured`, with `cancel`
//! returning to `Idle` from any RF state.

use std::time::Duration;

use crate::{env::Environment, error::BroadlinkError};

/// Default timeout for an IR capture poll loop.
pub const DEFAULT_LEARN_TIMEOUT: Duration = Duration::from_secs(30);

/// A state in the learning-mode state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearningState {
    /// No learning operation in progress.
    Idle,
    /// `enter_learning()` issued; waiting for an IR capture.
    IrArmed,
    /// An IR packet has been captured.
    IrCaptured,
    /// `sweep_frequency()` issued; waiting for frequency lock.
    RfSweeping,
    /// Frequency has locked; ready for `find_rf_packet()`.
    RfLocked,
    /// `find_rf_packet()` issued; waiting for an RF capture.
    RfArmed,
    /// An RF packet has been captured.
    RfCaptured,
}

/// Advisory client-side state for one RM handle's learning mode.
pub struct LearningSession<E: Environment> {
    state: LearningState,
    started_at: Option<E::Instant>,
    timeout: Duration,
    env: E,
}

impl<E: Environment> LearningSession<E> {
    /// Start a new, idle learning session using `env`'s clock and the
    /// default 30-second capture timeout.
    #[must_use]
    pub fn new(env: E) -> Self {
        Self::with_timeout(env, DEFAULT_LEARN_TIMEOUT)
    }

    /// Start a new, idle learning session with an explicit capture timeout.
    #[must_use]
    pub fn with_timeout(env: E, timeout: Duration) -> Self {
        Self { state: LearningState::Idle, started_at: None, timeout, env }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> LearningState {
        self.state
    }

    /// Transition `Idle -> IrArmed`. Call once before sending
    /// `enter_learning()` to the device.
    ///
    /// # Errors
    ///
    /// [`BroadlinkError::InvalidArgument`] if not currently `Idle`.
    pub fn enter_ir_learning(&mut self) -> Result<(), BroadlinkError> {
        self.require(LearningState::Idle, "enter_learning")?;
        self.state = LearningState::IrArmed;
        self.started_at = Some(self.env.now());
        Ok(())
    }

    /// Record the result of one `check_data()` poll during IR capture.
    ///
    /// `captured` is `Some(pulses)` once the device returns data; `None`
    /// while it still reports `NotReady`. Returns the capture on success,
    /// `None` while still waiting, or [`BroadlinkError::LearnTimeout`] once
    /// the capture window has elapsed.
    ///
    /// # Errors
    ///
    /// [`BroadlinkError::InvalidArgument`] if not currently `IrArmed`.
    /// [`BroadlinkError::LearnTimeout`] if the capture window elapsed.
    pub fn poll_ir_capture(&mut self, captured: Option<Vec<u8>>) -> Result<Option<Vec<u8>>, BroadlinkError> {
        self.require(LearningState::IrArmed, "check_data")?;
        if let Some(data) = captured {
            self.state = LearningState::IrCaptured;
            return Ok(Some(data));
        }
        self.check_timeout()?;
        Ok(None)
    }

    /// Transition `Idle -> RfSweeping`. Call once before sending
    /// `sweep_frequency()` to the device.
    ///
    /// # Errors
    ///
    /// [`BroadlinkError::InvalidArgument`] if not currently `Idle`.
    pub fn sweep_frequency(&mut self) -> Result<(), BroadlinkError> {
        self.require(LearningState::Idle, "sweep_frequency")?;
        self.state = LearningState::RfSweeping;
        self.started_at = Some(self.env.now());
        Ok(())
    }

    /// Record the result of one `check_frequency()` poll.
    ///
    /// # Errors
    ///
    /// [`BroadlinkError::InvalidArgument`] if not currently `RfSweeping`.
    /// [`BroadlinkError::LearnTimeout`] if the sweep window elapsed.
    pub fn poll_frequency_lock(&mut self, locked: bool) -> Result<bool, BroadlinkError> {
        self.require(LearningState::RfSweeping, "check_frequency")?;
        if locked {
            self.state = LearningState::RfLocked;
            return Ok(true);
        }
        self.check_timeout()?;
        Ok(false)
    }

    /// Transition `RfLocked -> RfArmed`. Call once before sending
    /// `find_rf_packet()` to the device.
    ///
    /// # Errors
    ///
    /// [`BroadlinkError::InvalidArgument`] if not currently `RfLocked`.
    pub fn find_rf_packet(&mut self) -> Result<(), BroadlinkError> {
        self.require(LearningState::RfLocked, "find_rf_packet")?;
        self.state = LearningState::RfArmed;
        self.started_at = Some(self.env.now());
        Ok(())
    }

    /// Record the result of one `check_data()` poll during RF capture.
    ///
    /// # Errors
    ///
    /// [`BroadlinkError::InvalidArgument`] if not currently `RfArmed`.
    /// [`BroadlinkError::LearnTimeout`] if the capture window elapsed.
    pub fn poll_rf_capture(&mut self, captured: Option<Vec<u8>>) -> Result<Option<Vec<u8>>, BroadlinkError> {
        self.require(LearningState::RfArmed, "check_data")?;
        if let Some(data) = captured {
            self.state = LearningState::RfCaptured;
            return Ok(Some(data));
        }
        self.check_timeout()?;
        Ok(None)
    }

    /// Cancel an in-progress RF sweep/lock/arm, returning to `Idle`.
    ///
    /// # Errors
    ///
    /// [`BroadlinkError::InvalidArgument`] if called from `Idle`, `IrArmed`
    /// or `IrCaptured` - there is no device-side RF sweep to cancel there.
    pub fn cancel(&mut self) -> Result<(), BroadlinkError> {
        match self.state {
            LearningState::RfSweeping | LearningState::RfLocked | LearningState::RfArmed => {
                self.state = LearningState::Idle;
                self.started_at = None;
                Ok(())
            },
            other => Err(BroadlinkError::InvalidArgument(format!("cancel called from {other:?}, no RF sweep active"))),
        }
    }

    /// Force the session back to `Idle`, discarding any in-progress capture.
    /// Called after `Session::complete_auth` rotates the session key, which
    /// invalidates any learning operation already in flight on the device.
    pub fn reset(&mut self) {
        self.state = LearningState::Idle;
        self.started_at = None;
    }

    fn require(&self, expected: LearningState, operation: &str) -> Result<(), BroadlinkError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(BroadlinkError::InvalidArgument(format!(
                "{operation} called from {:?}, expected {expected:?}",
                self.state
            )))
        }
    }

    fn check_timeout(&mut self) -> Result<(), BroadlinkError> {
        if let Some(start) = self.started_at {
            if self.env.now() - start > self.timeout {
                self.state = LearningState::Idle;
                self.started_at = None;
                return Err(BroadlinkError::LearnTimeout);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::Cell,
        time::{Duration, Instant},
    };

    use super::*;

    #[derive(Clone)]
    struct FakeClock {
        now: std::rc::Rc<Cell<Instant>>,
    }

    impl FakeClock {
        fn new() -> Self {
            Self { now: std::rc::Rc::new(Cell::new(Instant::now())) }
        }

        fn advance(&self, duration: Duration) {
            self.now.set(self.now.get() + duration);
        }
    }

    impl Environment for FakeClock {
        type Instant = Instant;

        fn now(&self) -> Instant {
            self.now.get()
        }
    }

    #[test]
    fn ir_path_requires_enter_before_poll() {
        let clock = FakeClock::new();
        let mut session = LearningSession::new(clock);
        let result = session.poll_ir_capture(None);
        assert!(matches!(result, Err(BroadlinkError::InvalidArgument(_))));
    }

    #[test]
    fn ir_path_reaches_captured_on_data() {
        let clock = FakeClock::new();
        let mut session = LearningSession::new(clock);
        session.enter_ir_learning().unwrap();
        assert!(session.poll_ir_capture(None).unwrap().is_none());
        let captured = session.poll_ir_capture(Some(vec![1, 2, 3])).unwrap();
        assert_eq!(captured, Some(vec![1, 2, 3]));
        assert_eq!(session.state(), LearningState::IrCaptured);
    }

    #[test]
    fn ir_path_times_out() {
        let clock = FakeClock::new();
        let mut session = LearningSession::with_timeout(clock.clone(), Duration::from_secs(30));
        session.enter_ir_learning().unwrap();
        clock.advance(Duration::from_secs(31));
        let result = session.poll_ir_capture(None);
        assert_eq!(result, Err(BroadlinkError::LearnTimeout));
        assert_eq!(session.state(), LearningState::Idle);
    }

    #[test]
    fn rf_path_requires_sweep_lock_arm_in_order() {
        let clock = FakeClock::new();
        let mut session = LearningSession::new(clock);

        // find_rf_packet before sweeping is rejected.
        assert!(session.find_rf_packet().is_err());

        session.sweep_frequency().unwrap();
        assert!(!session.poll_frequency_lock(false).unwrap());
        assert!(session.poll_frequency_lock(true).unwrap());
        assert_eq!(session.state(), LearningState::RfLocked);

        session.find_rf_packet().unwrap();
        assert_eq!(session.state(), LearningState::RfArmed);

        let captured = session.poll_rf_capture(Some(vec![9, 9])).unwrap();
        assert_eq!(captured, Some(vec![9, 9]));
        assert_eq!(session.state(), LearningState::RfCaptured);
    }

    #[test]
    fn cancel_returns_to_idle_from_any_rf_state() {
        let clock = FakeClock::new();
        for setup in [
            |s: &mut LearningSession<FakeClock>| s.sweep_frequency().unwrap(),
            |s: &mut LearningSession<FakeClock>| {
                s.sweep_frequency().unwrap();
                s.poll_frequency_lock(true).unwrap();
            },
            |s: &mut LearningSession<FakeClock>| {
                s.sweep_frequency().unwrap();
                s.poll_frequency_lock(true).unwrap();
                s.find_rf_packet().unwrap();
            },
        ] {
            let mut session = LearningSession::new(clock.clone());
            setup(&mut session);
            session.cancel().unwrap();
            assert_eq!(session.state(), LearningState::Idle);
        }
    }

    #[test]
    fn cancel_rejected_outside_rf_states() {
        let clock = FakeClock::new();
        let mut session = LearningSession::new(clock);
        assert!(session.cancel().is_err());
    }
}
