// Keyboard teleop over the pushed transport: W/S throttle, A/D steer, R/F power, Q quit
//
// Usage: cargo run --example teleop -- [topic-prefix]
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::{Duration, Instant};
use tracing::info;

use rc_drive_runtime::config::{DEFAULT_TOPIC_PREFIX, TOPIC_CMD_PUSH};
use rc_drive_runtime::transport::PushedTarget;

// (label, throttle, steering)
const POWER_LEVELS: [(&str, i32, i32); 3] =
    [("LOW", 120, 150), ("MED", 190, 200), ("HIGH", 255, 255)];
const RELEASE_AFTER: Duration = Duration::from_millis(150); // terminals send no key-up
const SEND_PERIOD: Duration = Duration::from_millis(20);

/// One axis driven by key repeats, falling back to zero once the key is let go
struct HeldAxis {
    value: i32,
    pressed_at: Instant,
}

impl HeldAxis {
    fn new() -> Self {
        Self {
            value: 0,
            pressed_at: Instant::now(),
        }
    }

    fn press(&mut self, value: i32) {
        self.value = value;
        self.pressed_at = Instant::now();
    }

    fn current(&mut self) -> i32 {
        if self.pressed_at.elapsed() > RELEASE_AFTER {
            self.value = 0;
        }
        self.value
    }
}

enum Key {
    Throttle(i32),
    Steer(i32),
    Power(isize),
    Quit,
}

fn key_for(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Char('w') => Some(Key::Throttle(1)),
        KeyCode::Char('s') => Some(Key::Throttle(-1)),
        KeyCode::Char('d') => Some(Key::Steer(1)),
        KeyCode::Char('a') => Some(Key::Steer(-1)),
        KeyCode::Char('r') => Some(Key::Power(1)),
        KeyCode::Char('f') => Some(Key::Power(-1)),
        KeyCode::Char('q') | KeyCode::Esc => Some(Key::Quit),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let prefix = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_TOPIC_PREFIX.to_string());
    let topic = format!("{}/{}", prefix, TOPIC_CMD_PUSH);

    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(topic.clone()).await?;
    info!("Teleop on {} (W/S throttle, A/D steer, R/F power, Q quit)", topic);

    enable_raw_mode()?;
    let result = drive_from_keyboard(&publisher).await;
    disable_raw_mode()?;

    // Leave the vehicle stopped instead of waiting for the watchdog
    publisher.put(PushedTarget::encode(0, 0)).await?;
    result
}

async fn drive_from_keyboard(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut level = 0;
    let mut throttle = HeldAxis::new();
    let mut steering = HeldAxis::new();

    loop {
        if event::poll(SEND_PERIOD)? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()?
                && kind != KeyEventKind::Release
            {
                let (label, max_throttle, max_steering) = POWER_LEVELS[level];
                match key_for(code) {
                    Some(Key::Throttle(sign)) => throttle.press(sign * max_throttle),
                    Some(Key::Steer(sign)) => steering.press(sign * max_steering),
                    Some(Key::Power(delta)) => {
                        level = level.saturating_add_signed(delta).min(POWER_LEVELS.len() - 1);
                        info!("Power: {} -> {}", label, POWER_LEVELS[level].0);
                    }
                    Some(Key::Quit) => return Ok(()),
                    None => {}
                }
            }
        }

        // Published every pass so the runtime watchdog stays fed
        publisher
            .put(PushedTarget::encode(throttle.current(), steering.current()))
            .await?;
    }
}
