use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Normalised paging window derived from raw `page` / `limit` query params.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub limit: i64,
}

impl PageWindow {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Saturates instead of overflowing for absurd `page` values.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Resolve a `field:asc|desc` sort string against a column allow-list.
/// Unknown columns fall back to `created_at DESC`.
pub fn order_by(sort: Option<&str>, allowed: &[&str]) -> String {
    let raw = sort.unwrap_or("created_at:desc");
    let (field, direction) = raw.split_once(':').unwrap_or((raw, "desc"));
    let field = match field {
        "createdAt" => "created_at",
        "updatedAt" => "updated_at",
        other => other,
    };
    if !allowed.contains(&field) {
        return "created_at DESC".to_string();
    }
    let direction = if direction.eq_ignore_ascii_case("asc") { "ASC" } else { "DESC" };
    format!("{field} {direction}")
}

#[derive(Debug, Serialize)]
pub struct PageInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, window: PageWindow) -> Self {
        Self {
            data,
            pagination: PageInfo {
                page: window.page,
                limit: window.limit,
                total,
                pages: (total + window.limit - 1) / window.limit,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_clamped() {
        assert_eq!(PageWindow::new(None, None), PageWindow { page: 1, limit: 20 });
        assert_eq!(PageWindow::new(Some(0), Some(500)), PageWindow { page: 1, limit: 100 });
        assert_eq!(PageWindow::new(Some(3), Some(10)).offset(), 20);
        assert_eq!(PageWindow::new(Some(i64::MAX), Some(20)).offset(), i64::MAX);
        assert!(PageWindow::new(Some(i64::MIN), None).offset() == 0);
    }

    #[test]
    fn test_order_by_allow_list() {
        let allowed = ["created_at", "title"];
        assert_eq!(order_by(Some("title:asc"), &allowed), "title ASC");
        assert_eq!(order_by(Some("createdAt:desc"), &allowed), "created_at DESC");
        assert_eq!(order_by(Some("password_hash:asc"), &allowed), "created_at DESC");
        assert_eq!(order_by(None, &allowed), "created_at DESC");
    }

    #[test]
    fn test_page_count_rounds_up() {
        let page = Paginated::new(vec![1, 2], 41, PageWindow::new(Some(1), Some(20)));
        assert_eq!(page.pagination.pages, 3);
    }
}
