use std::fmt;

use chrono::{Local, NaiveDateTime};

use crate::Result;
use crate::runtime::{EventFlow, PagePlugin, RuntimeContext, RuntimeEvent};

/// Remaining time split into display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeLeft {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TimeLeft {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for TimeLeft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02} Dias · {:02} Hrs · {:02} Min · {:02} Seg",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Countdown {
    target: NaiveDateTime,
}

impl Countdown {
    pub fn new(target: NaiveDateTime) -> Self {
        Self { target }
    }

    pub fn target(&self) -> NaiveDateTime {
        self.target
    }

    /// Whole units until the target; zero once it has passed.
    pub fn time_left(&self, now: NaiveDateTime) -> TimeLeft {
        let remaining = (self.target - now).num_seconds();
        if remaining <= 0 {
            return TimeLeft::default();
        }
        TimeLeft {
            days: remaining / 86_400,
            hours: remaining % 86_400 / 3_600,
            minutes: remaining % 3_600 / 60,
            seconds: remaining % 60,
        }
    }
}

type Clock = Box<dyn Fn() -> NaiveDateTime + Send>;

/// Redraws the countdown zone on every tick.
pub struct CountdownPlugin {
    countdown: Countdown,
    zone: String,
    clock: Clock,
}

impl CountdownPlugin {
    pub fn new(countdown: Countdown) -> Self {
        Self {
            countdown,
            zone: "eppa:countdown".to_string(),
            clock: Box::new(|| Local::now().naive_local()),
        }
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = zone.into();
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    fn render(&self) -> String {
        let left = self.countdown.time_left((self.clock)());
        if left.is_zero() {
            format!("{left}\nJunte-se a nós: o encontro começou.")
        } else {
            format!("{left}\npara respirarmos juntos")
        }
    }
}

impl PagePlugin for CountdownPlugin {
    fn name(&self) -> &str {
        "eppa.countdown"
    }

    fn init(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        ctx.set_zone(self.zone.clone(), self.render());
        Ok(())
    }

    fn on_event(
        &mut self,
        ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        if matches!(event, RuntimeEvent::Tick { .. }) {
            ctx.set_zone(self.zone.clone(), self.render());
        }
        Ok(EventFlow::Continue)
    }
}
