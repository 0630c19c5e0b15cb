use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::Notice;
use crate::ip_source::ip_source::{IPNotifier, Protocol};
use crate::schedule::{Schedule, ScheduleError};
use crate::sink::{NotifyResult, Sink};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

pub struct Runner {
    notice: Notice,
    notifier: Box<dyn IPNotifier>,
    sink: Sink,
}

impl Runner {
    pub fn new(notice: Notice, notifier: Box<dyn IPNotifier>, sink: Sink) -> Self {
        Runner {
            notice,
            notifier,
            sink,
        }
    }

    fn enabled_protocols(&self) -> Vec<Protocol> {
        let mut protocols = Vec::with_capacity(2);
        if self.notice.ipv4 {
            protocols.push(Protocol::IPv4);
        }
        if self.notice.ipv6 {
            protocols.push(Protocol::IPv6);
        }
        protocols
    }

    /// One pass over the enabled protocols. Returns true if every check succeeded.
    pub async fn cycle(&self) -> bool {
        let mut ok = true;
        for protocol in self.enabled_protocols() {
            let result = match self
                .notifier
                .fetch_reported_ip(protocol, &self.notice.id, &self.notice.password)
                .await
            {
                Ok(ip) => NotifyResult::Success { protocol, ip },
                Err(error) => NotifyResult::Failure { protocol, error },
            };
            ok &= !result.is_failure();
            self.sink.report(&result, &self.notice.id).await;
        }
        ok
    }

    pub async fn run_once(&self) -> u8 {
        debug!("run once mode.");
        if self.cycle().await {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        }
    }

    /// Runs a cycle on every tick until `shutdown` is cancelled.
    ///
    /// The next tick is computed only after the current cycle is done, so
    /// cycles never overlap and ticks missed meanwhile are skipped.
    pub async fn run_scheduled(
        &self,
        schedule: &Schedule,
        shutdown: CancellationToken,
    ) -> Result<(), ScheduleError> {
        debug!("run cron mode.");
        loop {
            let delay = schedule.next_delay()?;
            debug!("next cycle in {:?}", delay);
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("stopping scheduled notifications");
                    return Ok(());
                }
                _ = sleep(delay) => {
                    if !self.cycle().await {
                        error!("notification cycle finished with failures");
                    }
                }
            }
        }
    }
}
