use crate::dashboard::{Completion, Dashboard, FetchTicket};
use crate::errors::FetchError;
use crate::models::{DashboardView, Region};
use crate::source::HitSource;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The edit would have inverted the window and was ignored.
    Refused,
    Applied,
    /// A newer edit was issued while this one was in flight.
    Superseded,
}

/// Owns the dashboard state and drives re-fetches through `S`.
///
/// The state lock is released while a fetch is outstanding, so other edits
/// can be issued meanwhile; only the latest one is applied.
pub struct DateRangeController<S> {
    dashboard: Mutex<Dashboard>,
    source: S,
}

impl<S: HitSource> DateRangeController<S> {
    pub fn new(dashboard: Dashboard, source: S) -> Self {
        Self {
            dashboard: Mutex::new(dashboard),
            source,
        }
    }

    pub async fn view(&self) -> DashboardView {
        self.dashboard.lock().await.view()
    }

    pub async fn refresh(&self) -> Result<EditOutcome, FetchError> {
        let ticket = self.dashboard.lock().await.request_refresh();
        self.run(ticket).await
    }

    pub async fn set_start(&self, start: NaiveDate) -> Result<EditOutcome, FetchError> {
        let ticket = self.dashboard.lock().await.request_start(start);
        match ticket {
            Some(ticket) => self.run(ticket).await,
            None => Ok(EditOutcome::Refused),
        }
    }

    pub async fn set_end(&self, end: NaiveDate) -> Result<EditOutcome, FetchError> {
        let ticket = self.dashboard.lock().await.request_end(end);
        match ticket {
            Some(ticket) => self.run(ticket).await,
            None => Ok(EditOutcome::Refused),
        }
    }

    pub async fn set_cursor(&self, date: NaiveDate) -> bool {
        self.dashboard.lock().await.set_cursor(date)
    }

    pub async fn toggle_region(&self, region: Region) {
        self.dashboard.lock().await.toggle_region(region);
    }

    pub async fn reset_selection(&self) {
        self.dashboard.lock().await.reset_selection();
    }

    async fn run(&self, ticket: FetchTicket) -> Result<EditOutcome, FetchError> {
        let result = self.source.fetch(ticket.window).await;
        let completion = self.dashboard.lock().await.complete(ticket, result);
        match completion {
            Ok(Completion::Applied { .. }) => Ok(EditOutcome::Applied),
            Ok(Completion::Superseded) => Ok(EditOutcome::Superseded),
            Err(err) => {
                error!(window = %ticket.window, "failed to fetch hits: {err}");
                Err(err)
            }
        }
    }
}
