//! Non-fatal problems reported while the chart runs

use crate::error::GuardError;

/// Something went wrong but the chart kept running.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A guard could not be evaluated and was treated as failing
    GuardFailed {
        /// Name of the transition owning the guard
        transition: String,
        /// Why evaluation failed
        error: GuardError,
    },
    /// Automatic transitions kept firing; the sweep was cut short
    SettleLimitReached {
        /// Passes run before giving up
        iterations: usize,
    },
    /// An event arrived before [`StateChart::init`](crate::StateChart::init) and was dropped
    EventBeforeInit {
        /// The dropped event
        event: String,
    },
}

/// Sending half kept by the chart. Reporting never blocks: once `capacity`
/// diagnostics are waiting unread, newer ones are only logged.
#[derive(Debug)]
pub(crate) struct DiagnosticSink {
    sender: flume::Sender<Diagnostic>,
    receiver: flume::Receiver<Diagnostic>,
}

impl DiagnosticSink {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, receiver) = flume::bounded(capacity);
        Self { sender, receiver }
    }

    pub(crate) fn report(&self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::GuardFailed { transition, error } => {
                log::warn!("Guard of transition {transition:?} failed to evaluate: {error}");
            }
            Diagnostic::SettleLimitReached { iterations } => {
                log::error!("Chart did not settle after {iterations} automatic passes");
            }
            Diagnostic::EventBeforeInit { event } => {
                log::warn!("Event {event:?} sent before the chart was initialized, ignoring");
            }
        }
        if let Err(flume::TrySendError::Full(dropped)) = self.sender.try_send(diagnostic) {
            log::trace!("Diagnostic channel full, dropping {dropped:?}");
        }
    }

    pub(crate) fn receiver(&self) -> flume::Receiver<Diagnostic> {
        self.receiver.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_reach_every_receiver_clone() {
        let sink = DiagnosticSink::new(8);
        let receiver = sink.receiver();

        sink.report(Diagnostic::SettleLimitReached { iterations: 3 });

        assert_eq!(
            receiver.try_recv(),
            Ok(Diagnostic::SettleLimitReached { iterations: 3 })
        );
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn unread_diagnostics_stay_bounded() {
        let sink = DiagnosticSink::new(4);
        for event in 0..1000 {
            sink.report(Diagnostic::EventBeforeInit {
                event: event.to_string(),
            });
        }

        let receiver = sink.receiver();
        assert_eq!(receiver.len(), 4);
        let kept: Vec<_> = receiver.try_iter().collect();
        assert_eq!(
            kept.first(),
            Some(&Diagnostic::EventBeforeInit {
                event: "0".to_string()
            })
        );

        sink.report(Diagnostic::SettleLimitReached { iterations: 1 });
        assert_eq!(
            receiver.try_recv(),
            Ok(Diagnostic::SettleLimitReached { iterations: 1 })
        );
    }
}
