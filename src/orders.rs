use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::{Order, OrderStatus, OrdersPage, PageRequest, TVError};

/// Upstream record, only the fields we derive orders from.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPost {
    pub id: u64,
    #[serde(rename = "userId")]
    pub user_id: u64,
}

impl OrderStatus {
    pub fn from_id(id: u64) -> Self {
        if id % 3 == 0 {
            OrderStatus::Completed
        } else if id % 2 == 0 {
            OrderStatus::Pending
        } else {
            OrderStatus::Shipped
        }
    }
}

impl Order {
    pub fn from_post(post: &RawPost) -> Self {
        Order {
            id: post.id,
            customer: format!("Klant {}", post.user_id),
            status: OrderStatus::from_id(post.id),
        }
    }
}

pub trait PostsSource: Send + Sync {
    fn fetch_posts(&self) -> Result<Vec<RawPost>, TVError>;
}

pub struct HttpPostsSource {
    client: Client,
    url: String,
}

impl HttpPostsSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TVError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("otv/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl PostsSource for HttpPostsSource {
    fn fetch_posts(&self) -> Result<Vec<RawPost>, TVError> {
        debug!("GET {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()?;

        if !response.status().is_success() {
            return Err(TVError::HttpStatus {
                status: response.status().as_u16(),
                url: self.url.clone(),
            });
        }

        let body = response.text()?;
        let posts: Vec<RawPost> = serde_json::from_str(&body)?;
        Ok(posts)
    }
}

// Slice out the requested window and derive the orders for it.
pub fn paginate(posts: &[RawPost], request: &PageRequest) -> OrdersPage {
    let total = posts.len();
    let begin = std::cmp::min(request.page.saturating_mul(request.size), total);
    let end = std::cmp::min(begin.saturating_add(request.size), total);

    OrdersPage {
        orders: posts[begin..end].iter().map(Order::from_post).collect(),
        total,
    }
}

pub fn fetch_orders(source: &dyn PostsSource, request: &PageRequest) -> Result<OrdersPage, TVError> {
    let posts = source.fetch_posts()?;
    let page = paginate(&posts, request);
    info!(
        "Fetched page {} ({} orders of {})",
        request.page,
        page.orders.len(),
        page.total
    );
    Ok(page)
}

/// Pretty printed json of the selected order, nothing if there is no selection.
pub fn render_detail(selection: Option<&Order>) -> Option<String> {
    selection.and_then(|order| serde_json::to_string_pretty(order).ok())
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use proptest::prelude::*;

    pub struct MemorySource {
        pub posts: Vec<RawPost>,
    }

    impl MemorySource {
        pub fn with_posts(n: u64) -> Self {
            Self {
                posts: (1..=n)
                    .map(|id| RawPost {
                        id,
                        user_id: (id - 1) / 10 + 1,
                    })
                    .collect(),
            }
        }
    }

    impl PostsSource for MemorySource {
        fn fetch_posts(&self) -> Result<Vec<RawPost>, TVError> {
            Ok(self.posts.clone())
        }
    }

    struct FailingSource;

    impl PostsSource for FailingSource {
        fn fetch_posts(&self) -> Result<Vec<RawPost>, TVError> {
            Err(TVError::HttpStatus {
                status: 503,
                url: "http://localhost/posts".into(),
            })
        }
    }

    fn order(id: u64, user_id: u64) -> Order {
        Order::from_post(&RawPost { id, user_id })
    }

    #[test]
    fn derives_completed_order() {
        let o = order(3, 7);
        assert_eq!(o.id, 3);
        assert_eq!(o.customer, "Klant 7");
        assert_eq!(o.status.label(), "Voltooid");
    }

    #[test]
    fn derives_pending_order() {
        let o = order(4, 2);
        assert_eq!(o.customer, "Klant 2");
        assert_eq!(o.status.label(), "In behandeling");
    }

    #[test]
    fn derives_shipped_order() {
        let o = order(5, 1);
        assert_eq!(o.customer, "Klant 1");
        assert_eq!(o.status.label(), "Verzonden");
    }

    #[test]
    fn multiples_of_six_are_completed() {
        assert_eq!(OrderStatus::from_id(6), OrderStatus::Completed);
        assert_eq!(OrderStatus::from_id(0), OrderStatus::Completed);
    }

    #[test]
    fn parses_upstream_json_ignoring_extra_fields() {
        let body = r#"[{"userId": 1, "id": 1, "title": "t", "body": "b"}]"#;
        let posts: Vec<RawPost> = serde_json::from_str(body).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].user_id, 1);
    }

    #[test]
    fn first_page_of_hundred() {
        let source = MemorySource::with_posts(100);
        let request = PageRequest::new(0, 15, "id").unwrap();
        let page = fetch_orders(&source, &request).unwrap();
        assert_eq!(page.orders.len(), 15);
        assert_eq!(page.total, 100);
        assert_eq!(page.orders[0].id, 1);
        assert_eq!(page.orders[14].id, 15);
    }

    #[test]
    fn last_partial_page() {
        let source = MemorySource::with_posts(100);
        let request = PageRequest::new(6, 15, "id").unwrap();
        let page = fetch_orders(&source, &request).unwrap();
        assert_eq!(page.orders.len(), 10);
        assert_eq!(page.orders[0].id, 91);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let source = MemorySource::with_posts(100);
        let request = PageRequest::new(7, 15, "id").unwrap();
        let page = fetch_orders(&source, &request).unwrap();
        assert!(page.orders.is_empty());
        assert_eq!(page.total, 100);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert!(matches!(
            PageRequest::new(0, 0, "id"),
            Err(TVError::InvalidPageRequest(_))
        ));
    }

    #[test]
    fn fetch_errors_propagate() {
        let request = PageRequest::default();
        let err = fetch_orders(&FailingSource, &request).unwrap_err();
        assert!(matches!(err, TVError::HttpStatus { status: 503, .. }));
    }

    #[test]
    fn no_detail_without_selection() {
        assert_eq!(render_detail(None), None);
    }

    #[test]
    fn detail_uses_status_labels() {
        let text = render_detail(Some(&order(4, 2))).unwrap();
        assert!(text.contains("\"status\": \"In behandeling\""));
        assert!(text.contains("\"customer\": \"Klant 2\""));
    }

    proptest! {
        #[test]
        fn status_is_a_function_of_id(id in 0u64..1_000_000) {
            let expected = if id % 3 == 0 {
                OrderStatus::Completed
            } else if id % 2 == 0 {
                OrderStatus::Pending
            } else {
                OrderStatus::Shipped
            };
            prop_assert_eq!(OrderStatus::from_id(id), expected);
            prop_assert_eq!(OrderStatus::from_id(id), OrderStatus::from_id(id));
        }

        #[test]
        fn page_length_matches_window(total in 0u64..300, page in 0usize..40, size in 1usize..50) {
            let source = MemorySource::with_posts(total);
            let request = PageRequest::new(page, size, "id").unwrap();
            let result = paginate(&source.posts, &request);
            let total = total as usize;
            let expected = if total > page * size {
                std::cmp::min(size, total - page * size)
            } else {
                0
            };
            prop_assert_eq!(result.orders.len(), expected);
            prop_assert_eq!(result.total, total);
        }

        #[test]
        fn detail_round_trips(id in 0u64..100_000, user_id in 0u64..100) {
            let o = order(id, user_id);
            let text = render_detail(Some(&o)).unwrap();
            let back: Order = serde_json::from_str(&text).unwrap();
            prop_assert_eq!(back, o);
        }
    }
}
