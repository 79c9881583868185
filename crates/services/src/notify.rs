use guide_core::model::{CompletionStatus, SectionId};
use tokio::sync::mpsc;

/// Outbound state change, fired only on real transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    ActiveSectionChanged(SectionId),
    CompletionStatusChanged(CompletionStatus),
}

/// Receiver side of the presentation layer.
///
/// Implementations must not block; they run inside the session's event
/// handling.
pub trait PresentationAdapter: Send + Sync {
    fn on_active_section_changed(&self, section: SectionId);

    fn on_completion_status_changed(&self, status: CompletionStatus);

    fn notify(&self, notification: Notification) {
        match notification {
            Notification::ActiveSectionChanged(section) => self.on_active_section_changed(section),
            Notification::CompletionStatusChanged(status) => {
                self.on_completion_status_changed(status);
            }
        }
    }
}

/// Adapter that discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAdapter;

impl PresentationAdapter for NullAdapter {
    fn on_active_section_changed(&self, _section: SectionId) {}

    fn on_completion_status_changed(&self, _status: CompletionStatus) {}
}

/// Queue depth of `ChannelAdapter::channel`.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 256;

/// Adapter forwarding notifications into a bounded channel.
///
/// Sending never waits: when the receiver falls behind and the queue is
/// full, the notification is dropped and logged at `debug`.
#[derive(Debug, Clone)]
pub struct ChannelAdapter {
    tx: mpsc::Sender<Notification>,
}

impl ChannelAdapter {
    #[must_use]
    pub fn channel() -> (Self, mpsc::Receiver<Notification>) {
        Self::with_capacity(DEFAULT_NOTIFICATION_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    fn forward(&self, notification: Notification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!(?notification, "presentation queue full, dropping notification");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(?notification, "presentation receiver dropped");
            }
        }
    }
}

impl PresentationAdapter for ChannelAdapter {
    fn on_active_section_changed(&self, section: SectionId) {
        self.forward(Notification::ActiveSectionChanged(section));
    }

    fn on_completion_status_changed(&self, status: CompletionStatus) {
        self.forward(Notification::CompletionStatusChanged(status));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_adapter_forwards_in_order() {
        let (adapter, mut rx) = ChannelAdapter::channel();
        let status = CompletionStatus {
            completed_count: 1,
            quota: 4,
            unlocked: false,
        };
        adapter.on_active_section_changed(SectionId::Classes);
        adapter.on_completion_status_changed(status);

        assert_eq!(
            rx.try_recv().unwrap(),
            Notification::ActiveSectionChanged(SectionId::Classes)
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            Notification::CompletionStatusChanged(status)
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn full_queue_drops_newest_notifications() {
        let (adapter, mut rx) = ChannelAdapter::with_capacity(2);
        adapter.on_active_section_changed(SectionId::Welcome);
        adapter.on_active_section_changed(SectionId::Classes);
        adapter.on_active_section_changed(SectionId::Objects);

        assert_eq!(
            rx.try_recv().unwrap(),
            Notification::ActiveSectionChanged(SectionId::Welcome)
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            Notification::ActiveSectionChanged(SectionId::Classes)
        );
        assert!(rx.try_recv().is_err());

        adapter.on_active_section_changed(SectionId::Quest);
        assert_eq!(
            rx.try_recv().unwrap(),
            Notification::ActiveSectionChanged(SectionId::Quest)
        );
    }

    #[test]
    fn channel_adapter_survives_dropped_receiver() {
        let (adapter, rx) = ChannelAdapter::channel();
        drop(rx);
        adapter.on_active_section_changed(SectionId::Quest);
    }
}
