// Fixed-period control loop with watchdog
// Every tick: watchdog -> ramp -> duty output. Command transports run in their
// own tasks and only ever touch the shared target, so a slow or silent
// transport can never stall the loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};
use zenoh::pubsub::Publisher;

// local imports
use crate::config::{
    DEFAULT_STORE_DIR, DEFAULT_TOPIC_PREFIX, MotorConfig, RAMP_INTERVAL, TOPIC_CMD_PUSH,
    TOPIC_CMD_TARGET, TOPIC_CONFIG, TOPIC_HEALTH, TOPIC_RT_DUTY,
};
use crate::control::{
    CommandIntake, CommandSource, ConfigService, RampEngine, RampState, SafetyWatchdog,
    SharedControl, actuator,
};
use crate::messages::{DutyFrame, RuntimeHealth};
use crate::store::{ConfigStore, FileStore};
use crate::transport::{PolledTarget, PushedTarget, handle_config_request};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of one control tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutput {
    pub frame: DutyFrame,
    pub health: RuntimeHealth,
    pub state: RampState,
}

pub struct Runtime {
    shared: Arc<SharedControl>,
    watchdog: SafetyWatchdog,
    ramp: RampEngine,
}

impl Runtime {
    pub fn new(config: MotorConfig) -> Self {
        Self::starting_at(config, Instant::now())
    }

    /// Runtime whose command timestamp starts at `now`
    pub fn starting_at(config: MotorConfig, now: Instant) -> Self {
        Self {
            shared: Arc::new(SharedControl::new(config, now)),
            watchdog: SafetyWatchdog::new(),
            ramp: RampEngine::new(),
        }
    }

    /// Handle for transport adapters
    pub fn intake(&self) -> CommandIntake {
        CommandIntake::new(self.shared.clone())
    }

    pub fn config_service(&self, store: ConfigStore) -> ConfigService {
        ConfigService::new(self.shared.clone(), store)
    }

    pub fn shared(&self) -> &Arc<SharedControl> {
        &self.shared
    }

    /// One control period. Never blocks on I/O.
    pub fn tick(&mut self, now: Instant) -> TickOutput {
        let verdict = self.watchdog.check(&self.shared, now);
        let snapshot = self.shared.snapshot();
        let state = self.ramp.tick(&snapshot.target, &snapshot.config, now);

        TickOutput {
            frame: actuator::frame(&state),
            health: verdict.health,
            state,
        }
    }
}

/// Runtime settings supplied on the command line
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub store_dir: PathBuf,
    pub loop_period: Duration,
    pub topic_prefix: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            loop_period: RAMP_INTERVAL,
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_owned(),
        }
    }
}

impl RunOptions {
    fn topic(&self, suffix: &str) -> String {
        format!("{}/{}", self.topic_prefix.trim_end_matches('/'), suffix)
    }
}

pub async fn run(options: RunOptions) -> Result<(), BoxError> {
    info!("Opening motor config store at {}", options.store_dir.display());
    let store = ConfigStore::new(Arc::new(FileStore::open(&options.store_dir)?));
    let loaded = tokio::task::spawn_blocking({
        let store = store.clone();
        move || store.load()
    })
    .await?;
    if loaded.used_defaults() {
        info!("Running with default motor config");
    }

    let mut runtime = Runtime::new(loaded.config);
    let intake = runtime.intake();
    let config_service = runtime.config_service(store);

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers, subscribers and queryables...");
    let push_subscriber = session
        .declare_subscriber(options.topic(TOPIC_CMD_PUSH))
        .await?;
    let target_queryable = session
        .declare_queryable(options.topic(TOPIC_CMD_TARGET))
        .await?;
    let config_queryable = session
        .declare_queryable(options.topic(TOPIC_CONFIG))
        .await?;
    let pub_duty = session
        .declare_publisher(options.topic(TOPIC_RT_DUTY))
        .await?;
    let pub_health = session
        .declare_publisher(options.topic(TOPIC_HEALTH))
        .await?;

    // Pushed transport: no reply channel, malformed payloads are dropped
    let pushed = PushedTarget::new(intake.clone());
    tokio::spawn(async move {
        while let Ok(sample) = push_subscriber.recv_async().await {
            let payload = sample.payload().to_bytes();
            if let Err(e) = pushed.accept(&payload) {
                debug!("Dropped pushed command: {}", e);
            }
        }
        warn!("Pushed command stream closed");
    });

    // Polled transport: every request gets OK or Bad Request
    let polled = PolledTarget::new(intake);
    tokio::spawn(async move {
        while let Ok(query) = target_queryable.recv_async().await {
            let sent = match polled.reply(query.parameters().as_str()) {
                Ok(body) => query.reply(query.key_expr().clone(), body.to_owned()).await,
                Err(body) => query.reply_err(body.to_owned()).await,
            };
            if let Err(e) = sent {
                warn!("Failed to answer target request: {}", e);
            }
        }
        warn!("Target request queryable closed");
    });

    // Config transport: persistence may block, keep it off the async workers
    tokio::spawn(async move {
        while let Ok(query) = config_queryable.recv_async().await {
            let payload = query.payload().map(|p| p.to_bytes().into_owned());
            let service = config_service.clone();
            let reply = tokio::task::spawn_blocking(move || {
                handle_config_request(&service, payload.as_deref()).into_payload()
            })
            .await
            .unwrap_or_else(|e| Err(format!("config handler failed: {e}")));

            let sent = match reply {
                Ok(body) => query.reply(query.key_expr().clone(), body).await,
                Err(body) => query.reply_err(body).await,
            };
            if let Err(e) = sent {
                warn!("Failed to answer config request: {}", e);
            }
        }
        warn!("Config queryable closed");
    });

    info!(
        "Runtime started: {}ms loop, {}ms watchdog timeout",
        options.loop_period.as_millis(),
        runtime.shared().config().control_timeout_ms
    );
    info!(
        "Commands on: {}, {}; config on: {}",
        options.topic(TOPIC_CMD_TARGET),
        options.topic(TOPIC_CMD_PUSH),
        options.topic(TOPIC_CONFIG)
    );
    info!(
        "Publishing to: {}, {}",
        options.topic(TOPIC_RT_DUTY),
        options.topic(TOPIC_HEALTH)
    );

    let sink = ZenohSink {
        duty: pub_duty,
        health: pub_health,
    };
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Signal handler failed: {}", e);
        }
    };
    drive(&mut runtime, &sink, options.loop_period, shutdown).await;
    Ok(())
}

/// Where each tick's output goes
pub(crate) trait TickSink {
    async fn publish_duty(&self, frame: &DutyFrame) -> Result<(), BoxError>;
    async fn publish_health(&self, health: RuntimeHealth) -> Result<(), BoxError>;
}

struct ZenohSink<'a> {
    duty: Publisher<'a>,
    health: Publisher<'a>,
}

impl TickSink for ZenohSink<'_> {
    async fn publish_duty(&self, frame: &DutyFrame) -> Result<(), BoxError> {
        self.duty.put(serde_json::to_string(frame)?).await
    }

    async fn publish_health(&self, health: RuntimeHealth) -> Result<(), BoxError> {
        self.health.put(serde_json::to_string(&health)?).await
    }
}

/// Tick until `shutdown` resolves, then publish a coast frame.
/// Publish failures are logged and never stop the loop.
pub(crate) async fn drive<S: TickSink>(
    runtime: &mut Runtime,
    sink: &S,
    period: Duration,
    shutdown: impl Future<Output = ()>,
) {
    let mut tick = interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut publish_failing = false;
    loop {
        tokio::select! {
            _ = tick.tick() => {
                // 1. Watchdog, ramp, duty mapping
                let output = runtime.tick(Instant::now());

                // 2. Publish duty quadruple, then health
                let sent = match sink.publish_duty(&output.frame).await {
                    Ok(()) => sink.publish_health(output.health).await,
                    Err(e) => Err(e),
                };

                match sent {
                    Err(e) if !publish_failing => {
                        warn!("Publishing tick output failed: {}", e);
                        publish_failing = true;
                    }
                    Ok(()) if publish_failing => {
                        info!("Publishing tick output recovered");
                        publish_failing = false;
                    }
                    _ => {}
                }
            }
            _ = &mut shutdown => break,
        }
    }

    info!("Shutting down, coasting motors");
    if let Err(e) = sink.publish_duty(&DutyFrame::coast()).await {
        warn!("Failed to publish coast frame: {}", e);
    }
}
