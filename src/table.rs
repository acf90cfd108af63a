use std::cmp::Ordering;

use tracing::trace;

use crate::domain::Order;

pub const COLUMN_WIDTH_MARGIN: usize = 1;

#[derive(Clone, Copy)]
pub struct ColumnDef {
    pub id: &'static str,
    pub header: &'static str,
    cell: fn(&Order) -> String,
    compare: fn(&Order, &Order) -> Ordering,
}

pub fn order_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef {
            id: "id",
            header: "ID",
            cell: |o| o.id.to_string(),
            compare: |a, b| a.id.cmp(&b.id),
        },
        ColumnDef {
            id: "customer",
            header: "Klant",
            cell: |o| o.customer.clone(),
            compare: |a, b| compare_alphanumeric(&a.customer, &b.customer),
        },
        ColumnDef {
            id: "status",
            header: "Status",
            cell: |o| o.status.label().to_string(),
            compare: |a, b| a.status.label().cmp(b.status.label()),
        },
    ]
}

// Splits into runs of digits and non digits.
fn chunks(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut last_digit: Option<bool> = None;
    for (idx, c) in s.char_indices() {
        let digit = c.is_ascii_digit();
        if last_digit.is_some_and(|d| d != digit) {
            out.push(&s[start..idx]);
            start = idx;
        }
        last_digit = Some(digit);
    }
    if start < s.len() {
        out.push(&s[start..]);
    }
    out
}

/// Compares digit runs by value, so "Klant 2" comes before "Klant 10".
pub fn compare_alphanumeric(a: &str, b: &str) -> Ordering {
    let (ca, cb) = (chunks(a), chunks(b));
    for (x, y) in ca.iter().zip(cb.iter()) {
        let both_numeric =
            x.starts_with(|c: char| c.is_ascii_digit()) && y.starts_with(|c: char| c.is_ascii_digit());
        let ordering = if both_numeric {
            let (x, y) = (x.trim_start_matches('0'), y.trim_start_matches('0'));
            x.len().cmp(&y.len()).then_with(|| x.cmp(y))
        } else {
            x.cmp(y)
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    ca.len().cmp(&cb.len())
}

#[derive(Clone, Debug)]
pub struct ColumnView {
    pub name: String,
    pub width: usize,
    pub data: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sorting {
    pub column: usize,
    pub direction: SortDirection,
}

/// Page position shown by the pager. With manual pagination it never slices rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page_index: usize,
    pub page_size: usize,
}

pub struct TableView {
    columns: Vec<ColumnDef>,
    rows: Vec<usize>, // Mapping of view row index to data index
    sorting: Option<Sorting>,
    pagination: Pagination,
    row_count: usize,
    curser_row: usize,
    offset_row: usize,
    height: usize,
    max_column_width: usize,
}

impl TableView {
    pub fn new(columns: Vec<ColumnDef>, pagination: Pagination, max_column_width: usize) -> Self {
        TableView {
            columns,
            rows: Vec::new(),
            sorting: None,
            pagination,
            row_count: 0,
            curser_row: 0,
            offset_row: 0,
            height: 1,
            max_column_width,
        }
    }

    pub fn column_index(&self, id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }

    /// Replaces the row mapping for a freshly fetched page.
    pub fn set_data(&mut self, orders: &[Order]) {
        // Pagination is driven by the caller, the page is shown as fetched
        self.rows = (0..orders.len()).collect();
        self.apply_sorting(orders);
        self.clamp_curser();
    }

    pub fn set_row_count(&mut self, row_count: usize) {
        self.row_count = row_count;
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = std::cmp::max(height, 1);
        self.clamp_curser();
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn header_cells(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|c| c.header)
    }

    /// Cell text of every row in display order. Every call starts from the first row.
    pub fn body_rows<'a>(&'a self, orders: &'a [Order]) -> impl Iterator<Item = Vec<String>> + 'a {
        self.rows.iter().filter_map(move |&ridx| {
            orders
                .get(ridx)
                .map(|order| self.columns.iter().map(|c| (c.cell)(order)).collect())
        })
    }

    /// Column views for the rows that currently fit on screen.
    pub fn column_views(&self, orders: &[Order]) -> Vec<ColumnView> {
        let mut content_width: Vec<usize> = vec![0; self.columns.len()];
        for row in self.body_rows(orders) {
            for (width, cell) in content_width.iter_mut().zip(row.iter()) {
                *width = std::cmp::max(*width, cell.chars().count());
            }
        }

        let mut views: Vec<ColumnView> = self
            .header_cells()
            .enumerate()
            .map(|(cidx, header)| {
                let width =
                    Self::calculate_column_width(header, content_width[cidx], self.max_column_width);
                let name = format!("{}{}", header, self.sort_marker(cidx));
                ColumnView {
                    name: Self::get_visible_name(name, width),
                    width,
                    data: Vec::with_capacity(self.height),
                }
            })
            .collect();

        for row in self.body_rows(orders).skip(self.offset_row).take(self.height) {
            for (view, cell) in views.iter_mut().zip(row) {
                view.data.push(cell);
            }
        }
        views
    }

    fn sort_marker(&self, column: usize) -> &'static str {
        match self.sorting {
            Some(Sorting {
                column: c,
                direction: SortDirection::Ascending,
            }) if c == column => " ▲",
            Some(Sorting {
                column: c,
                direction: SortDirection::Descending,
            }) if c == column => " ▼",
            _ => "",
        }
    }

    fn calculate_column_width(header: &str, max_width: usize, max_column_width: usize) -> usize {
        // Room for the sort marker next to the header
        let width = std::cmp::max(header.chars().count() + 2, max_width) + COLUMN_WIDTH_MARGIN;
        std::cmp::min(width, max_column_width)
    }

    fn get_visible_name(name: String, width: usize) -> String {
        if width < 3 {
            return "".to_string();
        }
        if name.chars().count() > width {
            let mut reduced_name: String = name.chars().take(width - 3).collect();
            reduced_name.push_str("...");
            return reduced_name;
        }
        name
    }

    // -------------------- Sorting ---------------------- //

    pub fn sort_by(&mut self, column: usize, direction: SortDirection, orders: &[Order]) {
        if column >= self.columns.len() {
            return;
        }
        trace!("Sort column {} {:?}", self.columns[column].id, direction);
        self.sorting = Some(Sorting { column, direction });
        self.set_data(orders);
    }

    /// Moves sorting to the next column, keeping the direction.
    pub fn next_sort_column(&mut self, orders: &[Order]) {
        let (column, direction) = match self.sorting {
            None => (0, SortDirection::Ascending),
            Some(s) => ((s.column + 1) % self.columns.len(), s.direction),
        };
        self.sort_by(column, direction, orders);
    }

    pub fn sort_column(&self) -> usize {
        self.sorting.map(|s| s.column).unwrap_or(0)
    }

    fn apply_sorting(&mut self, orders: &[Order]) {
        if let Some(sorting) = self.sorting {
            let compare = self.columns[sorting.column].compare;
            self.rows.sort_by(|&a, &b| match (orders.get(a), orders.get(b)) {
                (Some(a), Some(b)) => match sorting.direction {
                    SortDirection::Ascending => compare(a, b),
                    SortDirection::Descending => compare(b, a),
                },
                _ => Ordering::Equal,
            });
        }
    }

    // -------------------- Pagination ---------------------- //

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn page_count(&self) -> usize {
        self.row_count.div_ceil(self.pagination.page_size.max(1))
    }

    pub fn can_next_page(&self) -> bool {
        self.pagination.page_index + 1 < self.page_count()
    }

    pub fn can_previous_page(&self) -> bool {
        self.pagination.page_index > 0
    }

    pub fn next_page(&mut self) {
        if self.can_next_page() {
            self.pagination.page_index += 1;
        }
    }

    pub fn previous_page(&mut self) {
        if self.can_previous_page() {
            self.pagination.page_index -= 1;
        }
    }

    // -------------------- Curser ---------------------- //

    pub fn selected_row(&self) -> usize {
        self.curser_row
    }

    pub fn abs_selected_row(&self) -> usize {
        self.offset_row + self.curser_row
    }

    /// The full record under the curser.
    pub fn row_click(&self, orders: &[Order]) -> Option<Order> {
        self.rows
            .get(self.abs_selected_row())
            .and_then(|&ridx| orders.get(ridx))
            .cloned()
    }

    fn clamp_curser(&mut self) {
        if self.rows.is_empty() {
            self.curser_row = 0;
            self.offset_row = 0;
            return;
        }
        let last = self.rows.len() - 1;
        self.offset_row = std::cmp::min(self.offset_row, last);
        if self.offset_row + self.curser_row > last {
            self.curser_row = last - self.offset_row;
        }
        if self.curser_row >= self.height {
            self.offset_row += self.curser_row - (self.height - 1);
            self.curser_row = self.height - 1;
        }
    }

    pub fn move_beginning(&mut self) {
        self.curser_row = 0;
        self.offset_row = 0;
    }

    pub fn move_end(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        if self.rows.len() < self.height {
            self.offset_row = 0;
            self.curser_row = self.rows.len() - 1;
        } else {
            self.offset_row = self.rows.len() - self.height;
            self.curser_row = self.height - 1;
        }
    }

    pub fn move_up(&mut self, size: usize) {
        if self.curser_row > 0 {
            // Curser somewhere in the middle
            self.curser_row = self.curser_row.saturating_sub(size);
        } else if self.offset_row > 0 {
            // Curser at the top, shift table up
            self.offset_row = self.offset_row.saturating_sub(size);
        }
    }

    pub fn move_down(&mut self, size: usize) {
        if self.rows.is_empty() || self.abs_selected_row() >= self.rows.len() - 1 {
            return;
        }
        let visible = std::cmp::min(self.height, self.rows.len() - self.offset_row);
        if self.curser_row < self.height - 1 {
            // Somewhere in the middle of the table
            self.curser_row = std::cmp::min(self.curser_row + size, visible - 1);
        } else {
            // At the bottom of the table, need to shift table down
            self.offset_row = std::cmp::min(self.offset_row + size, self.rows.len() - self.height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::RawPost;

    fn orders(n: u64) -> Vec<Order> {
        (1..=n)
            .map(|id| Order::from_post(&RawPost { id, user_id: 11 - id.min(10) }))
            .collect()
    }

    fn table(data: &[Order], height: usize) -> TableView {
        let mut t = TableView::new(
            order_columns(),
            Pagination {
                page_index: 0,
                page_size: 15,
            },
            40,
        );
        t.set_height(height);
        t.set_data(data);
        t.set_row_count(100);
        t
    }

    #[test]
    fn headers_follow_column_defs() {
        let t = table(&orders(3), 10);
        assert_eq!(t.header_cells().collect::<Vec<_>>(), vec!["ID", "Klant", "Status"]);
    }

    #[test]
    fn body_rows_are_restartable() {
        let data = orders(3);
        let t = table(&data, 10);
        let first: Vec<_> = t.body_rows(&data).collect();
        let second: Vec<_> = t.body_rows(&data).collect();
        assert_eq!(first, second);
        assert_eq!(first[2], vec!["3", "Klant 8", "Voltooid"]);
    }

    #[test]
    fn sorting_reorders_without_leaving_the_page() {
        let data = orders(5);
        let mut t = table(&data, 10);
        t.sort_by(0, SortDirection::Descending, &data);
        let ids: Vec<String> = t.body_rows(&data).map(|r| r[0].clone()).collect();
        assert_eq!(ids, vec!["5", "4", "3", "2", "1"]);

        let customer = t.column_index("customer").unwrap();
        t.sort_by(customer, SortDirection::Ascending, &data);
        let customers: Vec<String> = t.body_rows(&data).map(|r| r[1].clone()).collect();
        assert_eq!(customers, vec!["Klant 6", "Klant 7", "Klant 8", "Klant 9", "Klant 10"]);
        assert_eq!(t.nrows(), 5);
    }

    #[test]
    fn customers_sort_by_number() {
        let data: Vec<Order> = [(1, 10), (2, 2), (3, 1)]
            .iter()
            .map(|&(id, user_id)| Order::from_post(&RawPost { id, user_id }))
            .collect();
        let mut t = table(&data, 10);
        t.sort_by(1, SortDirection::Ascending, &data);
        let customers: Vec<String> = t.body_rows(&data).map(|r| r[1].clone()).collect();
        assert_eq!(customers, vec!["Klant 1", "Klant 2", "Klant 10"]);

        t.sort_by(1, SortDirection::Descending, &data);
        let customers: Vec<String> = t.body_rows(&data).map(|r| r[1].clone()).collect();
        assert_eq!(customers, vec!["Klant 10", "Klant 2", "Klant 1"]);
    }

    #[test]
    fn alphanumeric_compare() {
        assert_eq!(compare_alphanumeric("Klant 2", "Klant 10"), Ordering::Less);
        assert_eq!(compare_alphanumeric("Klant 007", "Klant 7"), Ordering::Equal);
        assert_eq!(compare_alphanumeric("Klant", "Klant 1"), Ordering::Less);
        assert_eq!(compare_alphanumeric("In behandeling", "Verzonden"), Ordering::Less);
    }

    #[test]
    fn column_views_window_follows_curser() {
        let data = orders(10);
        let mut t = table(&data, 4);
        t.move_end();
        let views = t.column_views(&data);
        assert_eq!(views.len(), 3);
        assert_eq!(views[0].data, vec!["7", "8", "9", "10"]);
        assert_eq!(views[1].data[3], "Klant 1");
        // "In behandeling" is the widest status
        assert_eq!(views[2].width, 14 + COLUMN_WIDTH_MARGIN);
    }

    #[test]
    fn next_sort_column_wraps() {
        let data = orders(2);
        let mut t = table(&data, 10);
        t.next_sort_column(&data);
        assert_eq!(t.sort_column(), 0);
        t.next_sort_column(&data);
        t.next_sort_column(&data);
        t.next_sort_column(&data);
        assert_eq!(t.sort_column(), 0);
    }

    #[test]
    fn manual_pagination_does_not_slice_rows() {
        let data = orders(15);
        let mut t = table(&data, 20);
        assert_eq!(t.page_count(), 7);
        t.next_page();
        assert_eq!(t.pagination().page_index, 1);
        assert_eq!(t.body_rows(&data).count(), 15);
        t.previous_page();
        t.previous_page();
        assert_eq!(t.pagination().page_index, 0);
    }

    #[test]
    fn pager_stops_at_last_page() {
        let data = orders(15);
        let mut t = table(&data, 20);
        for _ in 0..20 {
            t.next_page();
        }
        assert_eq!(t.pagination().page_index, 6);
        assert!(!t.can_next_page());
    }

    #[test]
    fn row_click_returns_record_under_curser() {
        let data = orders(5);
        let mut t = table(&data, 10);
        t.move_down(1);
        t.move_down(1);
        assert_eq!(t.row_click(&data), Some(data[2].clone()));
        t.sort_by(0, SortDirection::Descending, &data);
        assert_eq!(t.row_click(&data).map(|o| o.id), Some(3));
    }

    #[test]
    fn curser_scrolls_with_small_height() {
        let data = orders(10);
        let mut t = table(&data, 3);
        for _ in 0..5 {
            t.move_down(1);
        }
        assert_eq!(t.abs_selected_row(), 5);
        assert_eq!(t.selected_row(), 2);
        let views = t.column_views(&data);
        assert_eq!(views[0].data, vec!["4", "5", "6"]);

        t.move_end();
        assert_eq!(t.abs_selected_row(), 9);
        t.move_down(1);
        assert_eq!(t.abs_selected_row(), 9);
        t.move_beginning();
        assert_eq!(t.abs_selected_row(), 0);
        t.move_up(1);
        assert_eq!(t.abs_selected_row(), 0);
    }

    #[test]
    fn empty_table_has_no_click_target() {
        let mut t = table(&[], 5);
        t.move_down(1);
        t.move_end();
        assert_eq!(t.row_click(&[]), None);
    }

    #[test]
    fn shrinking_data_clamps_curser() {
        let data = orders(10);
        let mut t = table(&data, 5);
        t.move_end();
        t.set_data(&data[..2]);
        assert_eq!(t.abs_selected_row(), 1);
    }

    #[test]
    fn long_names_are_truncated() {
        assert_eq!(TableView::get_visible_name("Customer".into(), 6), "Cus...");
        assert_eq!(TableView::get_visible_name("ID".into(), 2), "");
        assert_eq!(TableView::get_visible_name("ID".into(), 5), "ID");
    }
}
