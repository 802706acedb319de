//! Global hook filter
//!
//! Decides, for each raw mouse event seen by the low-level hook, whether the
//! event is swallowed and which signals are posted to the host. The secondary
//! press is always swallowed; it either turns into a gesture (once the pointer
//! travels far enough soon enough) or is replayed as a synthetic click on
//! release. Synthetic events carry the sentinel and are never considered, so
//! the replayed click cannot start another gesture.

use crate::capture::protocol::{is_synthetic, RawSignal, Signal};
use crate::capture::types::{MouseEventKind, RawMouseEvent, ScreenPoint};
use crate::config::MonitorSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Hand the event to the next hook
    PassThrough,
    /// Block the event from reaching applications
    Swallow,
}

/// Result of one [`HookFilter::process`] call. Holds at most two signals so
/// the hook never allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookAction {
    pub disposition: Disposition,
    posts: [Option<RawSignal>; 2],
    /// The swallowed press must be replayed as an in-place secondary click
    pub replay_click: bool,
}

impl HookAction {
    fn pass() -> Self {
        Self {
            disposition: Disposition::PassThrough,
            posts: [None, None],
            replay_click: false,
        }
    }

    fn swallow() -> Self {
        Self {
            disposition: Disposition::Swallow,
            ..Self::pass()
        }
    }

    fn post(mut self, signal: Signal, point: ScreenPoint) -> Self {
        if let Some(slot) = self.posts.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(RawSignal::new(signal, point));
        }
        self
    }

    /// Signals to deliver, in order
    pub fn signals(&self) -> impl Iterator<Item = RawSignal> + '_ {
        self.posts.iter().flatten().copied()
    }
}

#[derive(Debug)]
pub struct HookFilter {
    settings: MonitorSettings,
    secondary_down: bool,
    start: ScreenPoint,
    down_tick: u64,
    gesture_active: bool,
    timing_valid: bool,
    last_move_tick: Option<u64>,
}

impl HookFilter {
    pub fn new(settings: MonitorSettings) -> Self {
        Self {
            settings,
            secondary_down: false,
            start: ScreenPoint::default(),
            down_tick: 0,
            gesture_active: false,
            timing_valid: true,
            last_move_tick: None,
        }
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture_active
    }

    pub fn process(&mut self, event: &RawMouseEvent) -> HookAction {
        if is_synthetic(event.extra_info) {
            return HookAction::pass();
        }

        match event.kind {
            MouseEventKind::SecondaryDown => {
                self.secondary_down = true;
                self.start = event.point;
                self.down_tick = event.tick_ms;
                self.gesture_active = false;
                self.timing_valid = true;
                self.last_move_tick = None;
                HookAction::swallow()
            }
            MouseEventKind::Move => self.on_move(event),
            MouseEventKind::SecondaryUp => self.on_release(event),
            MouseEventKind::Other => HookAction::pass(),
        }
    }

    fn on_move(&mut self, event: &RawMouseEvent) -> HookAction {
        if !self.secondary_down || !self.timing_valid {
            return HookAction::pass();
        }

        if self.gesture_active {
            if let Some(last) = self.last_move_tick {
                if event.tick_ms.saturating_sub(last) < self.settings.move_throttle_ms {
                    return HookAction::pass();
                }
            }
            self.last_move_tick = Some(event.tick_ms);
            return HookAction::pass().post(Signal::Move, event.point);
        }

        if event.tick_ms.saturating_sub(self.down_tick) > self.settings.max_gesture_delay_ms {
            self.timing_valid = false;
            return HookAction::pass();
        }

        let dx = i64::from(event.point.x) - i64::from(self.start.x);
        let dy = i64::from(event.point.y) - i64::from(self.start.y);
        let threshold = i64::from(self.settings.drag_threshold_px);
        if dx * dx + dy * dy <= threshold * threshold {
            return HookAction::pass();
        }

        self.gesture_active = true;
        self.last_move_tick = Some(event.tick_ms);
        HookAction::pass()
            .post(Signal::Show, self.start)
            .post(Signal::Move, event.point)
    }

    fn on_release(&mut self, event: &RawMouseEvent) -> HookAction {
        if !self.secondary_down {
            return HookAction::pass();
        }
        self.secondary_down = false;

        if self.gesture_active {
            self.gesture_active = false;
            return HookAction::swallow().post(Signal::Commit, event.point);
        }

        // The press never became a gesture; give the application its click.
        HookAction {
            replay_click: true,
            ..HookAction::swallow()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::injector::{in_place_secondary_click, SyntheticAction};
    use crate::capture::protocol::{unpack_point, SENTINEL};

    fn event(kind: MouseEventKind, x: i32, y: i32, tick_ms: u64) -> RawMouseEvent {
        RawMouseEvent {
            kind,
            point: ScreenPoint::new(x, y),
            tick_ms,
            extra_info: 0,
        }
    }

    fn down(x: i32, y: i32, t: u64) -> RawMouseEvent {
        event(MouseEventKind::SecondaryDown, x, y, t)
    }

    fn mv(x: i32, y: i32, t: u64) -> RawMouseEvent {
        event(MouseEventKind::Move, x, y, t)
    }

    fn up(x: i32, y: i32, t: u64) -> RawMouseEvent {
        event(MouseEventKind::SecondaryUp, x, y, t)
    }

    fn decoded(action: &HookAction) -> Vec<(Option<Signal>, ScreenPoint)> {
        action
            .signals()
            .map(|s| (Signal::from_word(s.signal), unpack_point(s.coords)))
            .collect()
    }

    #[test]
    fn test_press_is_swallowed() {
        let mut filter = HookFilter::new(MonitorSettings::default());
        let action = filter.process(&down(100, 100, 0));
        assert_eq!(action.disposition, Disposition::Swallow);
        assert_eq!(action.signals().count(), 0);
    }

    #[test]
    fn test_small_jitter_does_not_start_gesture() {
        let mut filter = HookFilter::new(MonitorSettings::default());
        filter.process(&down(100, 100, 0));

        let action = filter.process(&mv(110, 110, 20));
        assert_eq!(action.signals().count(), 0);
        assert!(!filter.is_gesture_active());
    }

    #[test]
    fn test_drag_posts_show_then_move() {
        let mut filter = HookFilter::new(MonitorSettings::default());
        filter.process(&down(100, 100, 0));

        let action = filter.process(&mv(100, 80, 50));

        assert_eq!(action.disposition, Disposition::PassThrough);
        assert_eq!(
            decoded(&action),
            vec![
                (Some(Signal::Show), ScreenPoint::new(100, 100)),
                (Some(Signal::Move), ScreenPoint::new(100, 80)),
            ]
        );
        assert!(filter.is_gesture_active());
    }

    #[test]
    fn test_moves_are_throttled() {
        let mut filter = HookFilter::new(MonitorSettings::default());
        filter.process(&down(0, 0, 0));
        filter.process(&mv(0, -20, 10));

        assert_eq!(filter.process(&mv(0, -25, 15)).signals().count(), 0);
        let action = filter.process(&mv(0, -30, 20));
        assert_eq!(decoded(&action), vec![(Some(Signal::Move), ScreenPoint::new(0, -30))]);
    }

    #[test]
    fn test_release_after_gesture_commits() {
        let mut filter = HookFilter::new(MonitorSettings::default());
        filter.process(&down(0, 0, 0));
        filter.process(&mv(0, -200, 40));

        let action = filter.process(&up(0, -200, 200));

        assert_eq!(action.disposition, Disposition::Swallow);
        assert!(!action.replay_click);
        assert_eq!(
            decoded(&action),
            vec![(Some(Signal::Commit), ScreenPoint::new(0, -200))]
        );
        assert!(!filter.is_gesture_active());
    }

    #[test]
    fn test_plain_click_is_replayed() {
        let mut filter = HookFilter::new(MonitorSettings::default());
        filter.process(&down(50, 50, 0));

        let action = filter.process(&up(50, 50, 80));

        assert_eq!(action.disposition, Disposition::Swallow);
        assert!(action.replay_click);
        assert_eq!(action.signals().count(), 0);
    }

    #[test]
    fn test_late_drag_never_becomes_gesture() {
        let mut filter = HookFilter::new(MonitorSettings::default());
        filter.process(&down(0, 0, 0));

        assert_eq!(filter.process(&mv(0, -5, 400)).signals().count(), 0);
        assert_eq!(filter.process(&mv(0, -300, 450)).signals().count(), 0);
        assert!(!filter.is_gesture_active());

        let action = filter.process(&up(0, -300, 500));
        assert!(action.replay_click);
    }

    #[test]
    fn test_unrelated_events_pass_through() {
        let mut filter = HookFilter::new(MonitorSettings::default());
        assert_eq!(filter.process(&mv(10, 10, 0)).disposition, Disposition::PassThrough);
        assert_eq!(filter.process(&up(10, 10, 5)).disposition, Disposition::PassThrough);
        assert_eq!(
            filter.process(&event(MouseEventKind::Other, 0, 0, 6)).disposition,
            Disposition::PassThrough
        );
    }

    #[test]
    fn test_replayed_click_does_not_feed_back() {
        let mut filter = HookFilter::new(MonitorSettings::default());
        filter.process(&down(50, 50, 0));
        let action = filter.process(&up(50, 50, 30));
        assert!(action.replay_click);

        // The injected press/release reach the hook tagged with the sentinel.
        for synthetic in in_place_secondary_click() {
            assert_eq!(synthetic.extra_info, SENTINEL as usize);
            let kind = match synthetic.action {
                SyntheticAction::SecondaryDown => MouseEventKind::SecondaryDown,
                SyntheticAction::SecondaryUp => MouseEventKind::SecondaryUp,
            };
            let replayed = RawMouseEvent {
                extra_info: synthetic.extra_info,
                ..event(kind, 50, 50, 31)
            };
            let action = filter.process(&replayed);
            assert_eq!(action.disposition, Disposition::PassThrough);
            assert!(!action.replay_click);
        }

        // Real input is still recognised afterwards.
        assert_eq!(filter.process(&down(50, 50, 100)).disposition, Disposition::Swallow);
    }
}
