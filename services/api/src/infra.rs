use internmatch::placement::{NotificationSink, NotifyError, OfferNotice};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Sink for the long-running server: every status notice becomes a log
/// line, standing in for the e-mail transport.
#[derive(Default, Clone)]
pub(crate) struct LoggingSink;

impl NotificationSink for LoggingSink {
    fn deliver(&self, notice: OfferNotice) -> Result<(), NotifyError> {
        tracing::info!(
            recipient = %notice.recipient,
            opportunity = %notice.opportunity,
            status = notice.status.label(),
            score = notice.score,
            waitlist_rank = ?notice.waitlist_rank,
            "offer notice dispatched"
        );
        Ok(())
    }
}

/// Sink for the CLI commands, which replay the captured notices at the
/// end of their output instead of logging as they go.
#[derive(Default, Clone)]
pub(crate) struct RecordingSink {
    events: Arc<Mutex<Vec<OfferNotice>>>,
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, notice: OfferNotice) -> Result<(), NotifyError> {
        let mut guard = self.events.lock().expect("notice mutex poisoned");
        guard.push(notice);
        Ok(())
    }
}

impl RecordingSink {
    pub(crate) fn events(&self) -> Vec<OfferNotice> {
        self.events.lock().expect("notice mutex poisoned").clone()
    }
}
