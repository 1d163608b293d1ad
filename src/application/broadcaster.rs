// Update broadcaster - Best-effort fan-out of dashboard views to subscribers
use crate::application::dashboard_service::DashboardService;
use crate::domain::dashboard::DashboardView;
use tokio::sync::broadcast;

/// Each subscriber owns a bounded queue. A subscriber that falls behind
/// loses the oldest views instead of slowing down the publisher.
#[derive(Clone)]
pub struct UpdateBroadcaster {
    sender: broadcast::Sender<DashboardView>,
}

impl UpdateBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardView> {
        self.sender.subscribe()
    }

    /// Never blocks. Returns how many subscribers the view was queued for.
    pub fn broadcast(&self, view: DashboardView) -> usize {
        match self.sender.send(view) {
            Ok(receivers) => {
                tracing::debug!("Broadcast dashboard update to {} subscriber(s)", receivers);
                receivers
            }
            Err(_) => {
                tracing::debug!("No subscribers for dashboard update");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Projects a fresh view and hands it to the broadcaster after a state change
#[derive(Clone)]
pub struct DashboardPublisher {
    dashboard: DashboardService,
    broadcaster: UpdateBroadcaster,
}

impl DashboardPublisher {
    pub fn new(dashboard: DashboardService, broadcaster: UpdateBroadcaster) -> Self {
        Self {
            dashboard,
            broadcaster,
        }
    }

    /// A failed projection is logged and dropped; the change that triggered
    /// it has already been applied.
    pub async fn publish(&self) -> usize {
        match self.dashboard.project().await {
            Ok(view) => self.broadcaster.broadcast(view),
            Err(e) => {
                tracing::error!("Failed to project dashboard for broadcast: {}", e);
                0
            }
        }
    }
}
