//! Dashboard state: the fetched series, the date window, the region
//! selection and the pie cursor, plus the request sequencing that keeps a
//! late response from overwriting a newer edit.

use crate::errors::FetchError;
use crate::models::{DashboardView, DateWindow, Distribution, HitRecord, Region, TrendPoint};
use crate::projector::{project_distribution, project_trend};
use crate::selection::RegionSelection;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

/// A re-fetch issued for `window`. Only the most recently issued ticket may
/// change the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub window: DateWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied { records: usize },
    Superseded,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    series: Vec<HitRecord>,
    window: DateWindow,
    selection: RegionSelection,
    cursor: NaiveDate,
    regions: Vec<Region>,
    issued: u64,
    awaiting: Option<u64>,
    last_error: Option<String>,
}

impl Dashboard {
    pub fn new(window: DateWindow, regions: Vec<Region>) -> Self {
        Self {
            series: Vec::new(),
            window,
            selection: RegionSelection::default(),
            cursor: window.end(),
            regions,
            issued: 0,
            awaiting: None,
            last_error: None,
        }
    }

    pub fn series(&self) -> &[HitRecord] {
        &self.series
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }

    pub fn selection(&self) -> &RegionSelection {
        &self.selection
    }

    pub fn cursor(&self) -> NaiveDate {
        self.cursor
    }

    pub fn is_loading(&self) -> bool {
        self.awaiting.is_some()
    }

    /// Message of the latest failed fetch, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Ticket for reloading the current window, used at start-up.
    pub fn request_refresh(&mut self) -> FetchTicket {
        self.issue(self.window)
    }

    /// `None` when `start` would invert the window; nothing changes then.
    pub fn request_start(&mut self, start: NaiveDate) -> Option<FetchTicket> {
        let Some(window) = self.window.with_start(start) else {
            debug!(%start, window = %self.window, "refused start date after window end");
            return None;
        };
        self.set_window(window);
        Some(self.issue(window))
    }

    /// `None` when `end` would invert the window; nothing changes then.
    pub fn request_end(&mut self, end: NaiveDate) -> Option<FetchTicket> {
        let Some(window) = self.window.with_end(end) else {
            debug!(%end, window = %self.window, "refused end date before window start");
            return None;
        };
        self.set_window(window);
        Some(self.issue(window))
    }

    fn set_window(&mut self, window: DateWindow) {
        self.window = window;
        self.cursor = window.clamp(self.cursor);
    }

    fn issue(&mut self, window: DateWindow) -> FetchTicket {
        self.issued += 1;
        self.awaiting = Some(self.issued);
        FetchTicket {
            seq: self.issued,
            window,
        }
    }

    /// Feed back the outcome of a fetch. Responses to superseded tickets are
    /// dropped whether they succeeded or not. A failure of the latest ticket
    /// keeps the previous series and is handed back to the caller.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<HitRecord>, FetchError>,
    ) -> Result<Completion, FetchError> {
        if ticket.seq != self.issued {
            warn!(
                seq = ticket.seq,
                latest = self.issued,
                window = %ticket.window,
                "dropping response for superseded request"
            );
            return Ok(Completion::Superseded);
        }
        self.awaiting = None;

        let records = match result {
            Ok(records) => records,
            Err(err) => {
                self.last_error = Some(err.to_string());
                return Err(err);
            }
        };
        self.last_error = None;
        self.set_window(DateWindow::spanning(&records).unwrap_or(ticket.window));
        self.series = records;
        info!(
            records = self.series.len(),
            window = %self.window,
            "applied hit series"
        );
        Ok(Completion::Applied {
            records: self.series.len(),
        })
    }

    /// Moves the pie cursor; dates outside the window are refused.
    pub fn set_cursor(&mut self, date: NaiveDate) -> bool {
        if !self.window.contains(date) {
            debug!(%date, window = %self.window, "refused cursor outside window");
            return false;
        }
        self.cursor = date;
        true
    }

    pub fn toggle_region(&mut self, region: Region) {
        self.selection.toggle(region);
    }

    pub fn reset_selection(&mut self) {
        self.selection.reset();
    }

    pub fn trend(&self) -> Vec<TrendPoint> {
        project_trend(&self.series, &self.selection)
    }

    pub fn distribution(&self) -> Distribution {
        project_distribution(&self.series, &self.selection, self.cursor)
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            window: self.window,
            cursor: self.cursor,
            selection: self.selection.view(),
            regions: self.regions.clone(),
            loading: self.is_loading(),
            error: self.last_error.clone(),
            trend: self.trend(),
            distribution: self.distribution(),
        }
    }
}
