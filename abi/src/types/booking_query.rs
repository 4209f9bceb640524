use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::{BookingStatus, RoomId, UserId};

/// Filter and page selection for listing bookings, ordered by booking id.
///
/// `page` is zero based. A `page_size` of zero asks for the configured default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(default)]
pub struct BookingQuery {
    #[builder(setter(strip_option))]
    pub status: Option<BookingStatus>,
    #[builder(setter(strip_option))]
    pub room_id: Option<RoomId>,
    #[builder(setter(strip_option))]
    pub user_id: Option<UserId>,
    #[builder(setter(into))]
    pub page: u32,
    #[builder(setter(into))]
    pub page_size: u32,
}

impl BookingQuery {
    /// resolve the page size against the configured default and upper bound
    pub fn normalize(mut self, default_size: u32, max_size: u32) -> Self {
        let max_size = max_size.max(1);
        if self.page_size == 0 {
            self.page_size = default_size;
        }
        self.page_size = self.page_size.clamp(1, max_size);
        self
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.page_size)
    }

    pub fn matches(&self, status: BookingStatus, room_id: RoomId, user_id: UserId) -> bool {
        self.status.map_or(true, |s| s == status)
            && self.room_id.map_or(true, |r| r == room_id)
            && self.user_id.map_or(true, |u| u == user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, page: u32, size: u32, total_elements: u64) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_elements.div_ceil(u64::from(size))
        };

        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_builder_should_work() {
        let query = BookingQueryBuilder::default()
            .status(BookingStatus::Confirmed)
            .room_id(101)
            .page(2u32)
            .page_size(10u32)
            .build()
            .unwrap();

        assert_eq!(query.status, Some(BookingStatus::Confirmed));
        assert_eq!(query.room_id, Some(101));
        assert_eq!(query.user_id, None);
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn normalize_should_apply_default_and_clamp() {
        let query = BookingQuery::default().normalize(20, 100);
        assert_eq!(query.page_size, 20);

        let query = BookingQuery {
            page_size: 1000,
            ..Default::default()
        }
        .normalize(20, 100);
        assert_eq!(query.page_size, 100);
    }

    #[test]
    fn matches_should_apply_every_filter() {
        let query = BookingQuery {
            status: Some(BookingStatus::Pending),
            user_id: Some(1),
            ..Default::default()
        };

        assert!(query.matches(BookingStatus::Pending, 101, 1));
        assert!(!query.matches(BookingStatus::Confirmed, 101, 1));
        assert!(!query.matches(BookingStatus::Pending, 101, 2));
    }

    #[test]
    fn page_should_count_total_pages() {
        let page = Page::new(vec![1, 2, 3], 0, 3, 7);
        assert_eq!(page.total_pages, 3);

        let empty: Page<i32> = Page::new(vec![], 0, 20, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
