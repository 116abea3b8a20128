use crate::models::{Region, SelectionView};

/// Which regions the charts plot.
///
/// `Subset` keeps display order and may be empty: deselecting the last region
/// leaves an explicit "nothing selected" state rather than falling back to
/// `All`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegionSelection {
    #[default]
    All,
    Subset(Vec<Region>),
}

impl RegionSelection {
    pub fn select_all(&mut self) {
        *self = Self::All;
    }

    pub fn reset(&mut self) {
        self.select_all();
    }

    pub fn toggle(&mut self, region: Region) {
        match self {
            Self::All => *self = Self::Subset(vec![region]),
            Self::Subset(regions) => {
                if let Some(pos) = regions.iter().position(|r| *r == region) {
                    regions.remove(pos);
                } else {
                    regions.push(region);
                }
            }
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn contains(&self, region: &Region) -> bool {
        match self {
            Self::All => false,
            Self::Subset(regions) => regions.contains(region),
        }
    }

    pub fn view(&self) -> SelectionView {
        match self {
            Self::All => SelectionView::All,
            Self::Subset(regions) => SelectionView::Subset {
                regions: regions.clone(),
            },
        }
    }
}
