use arboard::Clipboard;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, error, info, trace};

use crate::domain::{HELP_TEXT, Message, Order, OrdersPage, PageRequest, TVConfig, TVError};
use crate::orders::{PostsSource, fetch_orders, render_detail};
use crate::query::{QueryClient, QueryState};
use crate::store::SelectionStore;
use crate::table::{ColumnView, Pagination, SortDirection, TableView, order_columns};
use crate::ui::{BLOCK_BORDER_HEIGHT, DETAIL_HEIGHT, STATUSLINE_HEIGHT, TABLE_HEADER_HEIGHT};

pub const TABLE_TITLE: &str = "Bestellingen";

#[derive(Debug, PartialEq)]
pub enum Status {
    LOADING,
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    POPUP,
}

pub struct UIData {
    pub name: String,
    pub table: Vec<ColumnView>,
    pub nrows: usize,
    pub total: usize,
    pub selected_row: usize,
    pub abs_selected_row: usize,
    pub is_loading: bool,
    pub is_fetching: bool,
    pub detail: Option<String>,
    pub page_index: usize,
    pub page_count: usize,
    pub show_popup: bool,
    pub popup_message: String,
    pub layout: UILayout,
    pub status_message: String,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: TABLE_TITLE.to_string(),
            table: Vec::new(),
            nrows: 0,
            total: 0,
            selected_row: 0,
            abs_selected_row: 0,
            is_loading: true,
            is_fetching: true,
            detail: None,
            page_index: 0,
            page_count: 0,
            show_popup: false,
            popup_message: String::new(),
            layout: UILayout::default(),
            status_message: String::new(),
        }
    }
}

#[derive(Default, Clone, Debug, PartialEq)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
    pub table_height: usize,
    pub detail_height: usize,
}

impl UILayout {
    pub fn from_values(ui_width: usize, ui_height: usize, show_detail: bool) -> Self {
        let detail_height = if show_detail { DETAIL_HEIGHT } else { 0 };
        let table_height = ui_height
            .saturating_sub(STATUSLINE_HEIGHT)
            .saturating_sub(detail_height)
            .saturating_sub(BLOCK_BORDER_HEIGHT)
            .saturating_sub(TABLE_HEADER_HEIGHT);

        let layout = UILayout {
            width: ui_width,
            height: ui_height,
            table_height,
            detail_height,
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }
}

pub struct Model {
    config: TVConfig,
    pub status: Status,
    modus: Modus,
    source: Arc<dyn PostsSource>,
    queries: QueryClient<PageRequest, OrdersPage>,
    page: Option<Arc<OrdersPage>>,
    fetching: bool,
    table: TableView,
    selection: SelectionStore,
    detail: Rc<RefCell<Option<String>>>, // Kept current by a selection subscription
    uilayout: UILayout,
    uidata: UIData,
    clipboard: Option<Clipboard>,
    status_message: String,
}

impl Model {
    pub fn init(
        config: &TVConfig,
        source: Arc<dyn PostsSource>,
        ui_width: usize,
        ui_height: usize,
    ) -> Self {
        let request = &config.request;
        let mut table = TableView::new(
            order_columns(),
            Pagination {
                page_index: request.page,
                page_size: request.size,
            },
            config.max_column_width,
        );
        let empty: [Order; 0] = [];
        if let Some(column) = table.column_index(&request.sort) {
            table.sort_by(column, SortDirection::Ascending, &empty);
        }

        let detail = Rc::new(RefCell::new(None));
        let mut selection = SelectionStore::new();
        let d = Rc::clone(&detail);
        selection.subscribe(move |order| {
            *d.borrow_mut() = render_detail(order);
        });

        let mut model = Self {
            config: config.clone(),
            status: Status::LOADING,
            modus: Modus::TABLE,
            source,
            queries: QueryClient::new(config.stale_time),
            page: None,
            fetching: false,
            table,
            selection,
            detail,
            uilayout: UILayout::from_values(ui_width, ui_height, false),
            uidata: UIData::empty(),
            clipboard: None,
            status_message: "Laden...".to_string(),
        };
        model.table.set_height(model.uilayout.table_height);
        model.query_orders();
        model
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn selection(&self) -> Option<&Order> {
        self.selection.selection()
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    fn orders(&self) -> &[Order] {
        self.page.as_deref().map(|p| p.orders.as_slice()).unwrap_or(&[])
    }

    fn query_orders(&mut self) {
        let source = Arc::clone(&self.source);
        let request = self.config.request.clone();
        let state = self
            .queries
            .query(&self.config.request, move || fetch_orders(source.as_ref(), &request));
        self.apply_query_state(state);
    }

    // Picks up results of fetches that finished since the last tick.
    fn poll_orders(&mut self) {
        if let Some(state) = self.queries.peek(&self.config.request) {
            self.apply_query_state(state);
        }
    }

    fn apply_query_state(&mut self, state: QueryState<OrdersPage>) {
        let changed = match (&self.page, &state.data) {
            (Some(old), Some(new)) => !Arc::ptr_eq(old, new),
            (None, Some(_)) => true,
            _ => false,
        };
        if changed {
            self.page = state.data;
            let total = self.page.as_ref().map(|p| p.total).unwrap_or(0);
            let page = self.page.clone();
            let orders = page.as_deref().map(|p| p.orders.as_slice()).unwrap_or(&[]);
            self.table.set_data(orders);
            self.table.set_row_count(total);
            info!("Showing {} orders of {}", orders.len(), total);
            self.set_status_message(format!("{} bestellingen geladen", orders.len()));
        }

        let next_status = if state.is_loading {
            Status::LOADING
        } else {
            Status::READY
        };
        if self.status != Status::QUITTING {
            self.status = next_status;
        }
        self.fetching = state.is_fetching;

        if let Some(e) = state.error {
            if self.status_message != e {
                error!("Loading orders failed: {e}");
                self.set_status_message(e);
            }
        }
        self.update_uidata();
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.uidata.status_message = self.status_message.clone();
    }

    fn relayout(&mut self) {
        let show_detail = self.selection().is_some();
        self.uilayout = UILayout::from_values(self.uilayout.width, self.uilayout.height, show_detail);
        self.table.set_height(self.uilayout.table_height);
    }

    fn update_uidata(&mut self) {
        let pagination = self.table.pagination();
        self.uidata = UIData {
            name: TABLE_TITLE.to_string(),
            table: self.table.column_views(self.orders()),
            nrows: self.table.nrows(),
            total: self.page.as_ref().map(|p| p.total).unwrap_or(0),
            selected_row: self.table.selected_row(),
            abs_selected_row: self.table.abs_selected_row(),
            is_loading: self.status == Status::LOADING,
            is_fetching: self.fetching,
            detail: self.detail.borrow().clone(),
            page_index: pagination.page_index,
            page_count: self.table.page_count(),
            show_popup: self.modus == Modus::POPUP,
            popup_message: if self.modus == Modus::POPUP {
                HELP_TEXT.to_string()
            } else {
                String::new()
            },
            layout: self.uilayout.clone(),
            status_message: self.status_message.clone(),
        }
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), TVError> {
        self.poll_orders();

        if let Some(msg) = message {
            match self.modus {
                Modus::TABLE => match msg {
                    Message::Quit => self.quit(),
                    Message::MoveUp => self.table.move_up(1),
                    Message::MoveDown => self.table.move_down(1),
                    Message::MovePageUp => self.table.move_up(self.uilayout.table_height),
                    Message::MovePageDown => self.table.move_down(self.uilayout.table_height),
                    Message::MoveBeginning => self.table.move_beginning(),
                    Message::MoveEnd => self.table.move_end(),
                    Message::Select => self.select_current_row(),
                    Message::ClearSelection | Message::Exit => self.clear_selection(),
                    Message::NextSortColumn => self.next_sort_column(),
                    Message::SortAscending => self.sort_current_column(SortDirection::Ascending),
                    Message::SortDescending => self.sort_current_column(SortDirection::Descending),
                    Message::NextPage => self.table.next_page(),
                    Message::PreviousPage => self.table.previous_page(),
                    Message::Refetch => self.refetch(),
                    Message::FocusGained => self.query_orders(),
                    Message::CopySelection => self.copy_selection(),
                    Message::Help => self.show_help(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                },
                Modus::POPUP => match msg {
                    Message::Quit => self.quit(),
                    Message::Exit | Message::Help => self.modus = Modus::TABLE,
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    _ => (),
                },
            }
        }

        self.update_uidata();
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn select_current_row(&mut self) {
        let order = self.table.row_click(self.orders());
        if let Some(order) = order {
            debug!("Selected order {}", order.id);
            self.selection.set_selection(Some(order));
            self.relayout();
        }
    }

    fn clear_selection(&mut self) {
        if self.selection().is_some() {
            self.selection.set_selection(None);
            self.relayout();
        }
    }

    fn next_sort_column(&mut self) {
        let page = self.page.clone();
        let orders = page.as_deref().map(|p| p.orders.as_slice()).unwrap_or(&[]);
        self.table.next_sort_column(orders);
    }

    fn sort_current_column(&mut self, direction: SortDirection) {
        let page = self.page.clone();
        let orders = page.as_deref().map(|p| p.orders.as_slice()).unwrap_or(&[]);
        let column = self.table.sort_column();
        self.table.sort_by(column, direction, orders);
    }

    fn refetch(&mut self) {
        info!("Refetch orders");
        self.queries.invalidate(&self.config.request);
        self.query_orders();
        self.set_status_message("Vernieuwen...");
    }

    fn show_help(&mut self) {
        self.modus = Modus::POPUP;
    }

    fn copy_selection(&mut self) {
        let Some(text) = render_detail(self.selection()) else {
            self.set_status_message("Geen bestelling geselecteerd");
            return;
        };
        match self.set_clipboard(text) {
            Ok(_) => {
                trace!("Copied selected order to clipboard.");
                self.set_status_message("Bestelling gekopieerd");
            }
            Err(e) => {
                error!("Error copying to clipboard: {e}");
                self.set_status_message(e.to_string());
            }
        }
    }

    fn set_clipboard(&mut self, text: String) -> Result<(), TVError> {
        if self.clipboard.is_none() {
            let clipboard = Clipboard::new().map_err(|e| TVError::ClipboardError(e.to_string()))?;
            self.clipboard = Some(clipboard);
        }
        match self.clipboard.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text)
                .map_err(|e| TVError::ClipboardError(e.to_string())),
            None => Err(TVError::ClipboardError("no clipboard".into())),
        }
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout.width = width;
        self.uilayout.height = height;
        self.relayout();
    }
}
